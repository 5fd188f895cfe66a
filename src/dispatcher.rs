//! HTTP front: authenticates deliveries, resolves handlers, and schedules
//! execution.
//!
//! The dispatcher owns the handler registry, the shared webhook secret, and
//! the configured [`Scheduler`]. Each incoming request is processed in a
//! fixed order: routing headers, signature verification, liveness check,
//! registry lookup, submission. Signature failures are protocol faults and
//! never reach a handler or the error callback.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tracing::{Instrument, error, info, info_span, warn};

use crate::dispatch::{Dispatch, DispatchContext};
use crate::handler::{EventHandler, HandlerError, HookResponse};
use crate::registry::{HandlerRegistry, PING_EVENT};
use crate::scheduler::{ScheduleError, Scheduler};
use crate::signature::verify_signature;

/// Route the platform is conventionally configured to deliver to.
pub const DEFAULT_WEBHOOK_ROUTE: &str = "/api/github/hook";

/// Header carrying the event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the delivery id.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header carrying the payload signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Fixed diagnostic body for signature failures.
const INVALID_SIGNATURE_BODY: &str = "invalid webhook headers or payload";

/// Produces the response for a handler fault on the synchronous path.
///
/// The callback fully controls the response; the default logs the error and
/// responds 500.
pub type ErrorCallback = Arc<dyn Fn(&DispatchContext, &HandlerError) -> Response + Send + Sync>;

/// Produces the response after routing: `handled` is true when a registered
/// handler accepted the delivery, false when no handler was registered for
/// the event type. When configured, the callback fully controls the
/// response in both cases.
pub type ResponseCallback = Arc<dyn Fn(&str, bool) -> Response + Send + Sync>;

/// Routes authenticated webhook deliveries to registered handlers.
pub struct EventDispatcher {
    registry: HandlerRegistry,
    secret: Vec<u8>,
    scheduler: Arc<dyn Scheduler>,
    on_error: ErrorCallback,
    on_response: Option<ResponseCallback>,
}

impl EventDispatcher {
    /// Creates a dispatcher over the given handlers, in priority order.
    ///
    /// When several handlers declare the same event type, the one earliest
    /// in `handlers` receives its deliveries.
    pub fn new(
        handlers: Vec<Arc<dyn EventHandler>>,
        secret: impl Into<Vec<u8>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        EventDispatcher {
            registry: HandlerRegistry::new(handlers),
            secret: secret.into(),
            scheduler,
            on_error: default_error_callback(),
            on_response: None,
        }
    }

    /// Replaces the default handler-fault response (log + 500).
    ///
    /// Never invoked for signature failures or for capacity rejections.
    pub fn with_error_callback(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = on_error;
        self
    }

    /// Takes over the response for routed and unrouted deliveries.
    pub fn with_response_callback(mut self, on_response: ResponseCallback) -> Self {
        self.on_response = Some(on_response);
        self
    }

    /// Processes one delivery and produces the HTTP response.
    pub async fn dispatch(&self, headers: &HeaderMap, body: Bytes) -> Response {
        // A delivery without an event type carries no event semantics;
        // acknowledge it without processing.
        let event_type = match header_str(headers, HEADER_EVENT) {
            Some(value) => value,
            None => return StatusCode::ACCEPTED.into_response(),
        };
        let delivery_id = header_str(headers, HEADER_DELIVERY).unwrap_or_default();

        let span = info_span!("webhook", event_type, delivery_id);

        let processing = async {
            let signature = header_str(headers, HEADER_SIGNATURE).unwrap_or_default();
            if !verify_signature(&body, signature, &self.secret) {
                // Protocol fault: reject before any handler work, and do not
                // involve the error callback.
                warn!("invalid webhook signature");
                return (StatusCode::BAD_REQUEST, INVALID_SIGNATURE_BODY).into_response();
            }

            info!("received webhook event");

            // Liveness check: acknowledged before the registry is consulted,
            // even when a handler is registered for it.
            if event_type == PING_EVENT {
                return StatusCode::OK.into_response();
            }

            let handler = match self.registry.resolve(event_type) {
                Some(handler) => handler,
                None => {
                    return match &self.on_response {
                        Some(callback) => callback(event_type, false),
                        None => StatusCode::ACCEPTED.into_response(),
                    };
                }
            };

            let ctx = DispatchContext::new(span.clone());
            let dispatch = Dispatch {
                handler,
                ctx: ctx.clone(),
                event_type: event_type.to_string(),
                delivery_id: delivery_id.to_string(),
                payload: body.clone(),
            };

            match self.scheduler.submit(dispatch).await {
                Ok(override_response) => match &self.on_response {
                    Some(callback) => callback(event_type, true),
                    None => apply_override(override_response),
                },
                Err(ScheduleError::CapacityExceeded) => {
                    // Backpressure, not a handler failure: the delivery was
                    // not accepted and the platform should retry later.
                    warn!("dispatch queue at capacity, rejecting delivery");
                    (StatusCode::SERVICE_UNAVAILABLE, "processing capacity exceeded")
                        .into_response()
                }
                Err(ScheduleError::Handler(err)) => (self.on_error)(&ctx, &err),
            }
        };

        processing.instrument(span.clone()).await
    }
}

/// Default handler-fault response: log and answer 500.
fn default_error_callback() -> ErrorCallback {
    Arc::new(|ctx, err| {
        let _guard = ctx.span().enter();
        error!(error = %err, "unexpected error handling webhook request");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    })
}

/// Applies a handler's response override, or the default acknowledgment.
fn apply_override(override_response: Option<HookResponse>) -> Response {
    match override_response {
        Some(HookResponse { status, body: Some(body) }) => (status, body).into_response(),
        Some(HookResponse { status, body: None }) => status.into_response(),
        None => StatusCode::OK.into_response(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Builds a router serving the dispatcher on the given path.
pub fn build_router(dispatcher: Arc<EventDispatcher>, path: &str) -> Router {
    Router::new()
        .route(path, post(dispatch_delivery))
        .with_state(dispatcher)
}

async fn dispatch_delivery(
    State(dispatcher): State<Arc<EventDispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatcher.dispatch(&headers, body).await
}
