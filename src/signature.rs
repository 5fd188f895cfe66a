//! Webhook payload authentication.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body,
//! using the webhook secret shared at app configuration time. The signature
//! arrives in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//!
//! Verification must happen on the raw body, before any routing or handler
//! work. A delivery that fails verification is a protocol fault: it is
//! rejected with a 400 and never reaches a handler or the error callback.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix GitHub uses for SHA-256 signatures.
const SIGNATURE_SCHEME: &str = "sha256=";

/// Parses a `sha256=<hex>` signature header into raw bytes.
///
/// Returns `None` for a missing prefix, a different scheme, or invalid hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_digest = header.strip_prefix(SIGNATURE_SCHEME)?;
    hex::decode(hex_digest).ok()
}

/// Computes the HMAC-SHA256 of `payload` under `secret`.
///
/// Senders (and tests) use this together with [`format_signature_header`]
/// to produce the header value GitHub would send.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a raw signature as a `sha256=<hex>` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{SIGNATURE_SCHEME}{}", hex::encode(signature))
}

/// Verifies a signature header against the raw payload and shared secret.
///
/// Returns `false` for malformed headers rather than erroring; the caller
/// treats every failure mode the same way. Comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let claimed = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}
