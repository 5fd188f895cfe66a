//! The event handler capability implemented by embedding applications.
//!
//! A handler declares which event types it processes and is invoked with the
//! raw delivery payload. The dispatch core never interprets payload contents;
//! parsing is entirely the handler's concern.
//!
//! A handler may return a [`HookResponse`] to override the HTTP response for
//! the delivery. The override only reaches the client when the handler runs
//! synchronously with the request (see [`SyncScheduler`]); under an
//! asynchronous scheduler the response has already been sent by the time the
//! handler runs, and the descriptor is discarded.
//!
//! [`SyncScheduler`]: crate::scheduler::SyncScheduler

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;

use crate::dispatch::DispatchContext;

/// Error type returned by event handlers.
///
/// Handlers supply their own error values; the core routes them to the
/// configured error callback without inspecting them.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An explicit response override returned by a handler.
///
/// Replaces the default acknowledgment when the handler executed
/// synchronously with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResponse {
    /// Status code to respond with.
    pub status: StatusCode,
    /// Optional response body; `None` sends an empty body.
    pub body: Option<Bytes>,
}

impl HookResponse {
    /// A response with the given status and no body.
    pub fn status(status: StatusCode) -> Self {
        HookResponse { status, body: None }
    }

    /// A response with the given status and body.
    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        HookResponse {
            status,
            body: Some(body.into()),
        }
    }
}

/// An event handler for one or more webhook event types.
///
/// The dispatcher guarantees `handle` is only called for event types listed
/// by `handles`, with the payload already authenticated against the shared
/// secret.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The event types this handler processes (e.g. `"pull_request"`).
    fn handles(&self) -> Vec<String>;

    /// Processes one delivery.
    ///
    /// Returning `Ok(Some(_))` overrides the HTTP response when execution is
    /// synchronous with the request; `Ok(None)` uses the default. Errors are
    /// routed to the configured error callback, never swallowed.
    async fn handle(
        &self,
        ctx: &DispatchContext,
        event_type: &str,
        delivery_id: &str,
        payload: &[u8],
    ) -> Result<Option<HookResponse>, HandlerError>;
}
