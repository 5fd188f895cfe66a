//! The dispatch unit: one authenticated delivery bound to its handler.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{Instrument, Span};

use crate::handler::{EventHandler, HandlerError, HookResponse};

/// Execution context for one dispatch.
///
/// Carries the structured-logging association (a [`tracing::Span`] holding
/// the event type and delivery id) through handler execution. Unlike the
/// originating HTTP request, a context has no cancellation: work submitted
/// to an asynchronous scheduler keeps running after the response is sent.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    span: Span,
}

impl DispatchContext {
    /// Creates a context carrying the given span.
    pub fn new(span: Span) -> Self {
        DispatchContext { span }
    }

    /// The span handler execution is instrumented with.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Derives a context for work that outlives the originating request.
    ///
    /// The logging association is carried forward; nothing ties the new
    /// context to the request's lifetime. This is the default context
    /// deriver used by the asynchronous schedulers.
    pub fn detached(&self) -> Self {
        DispatchContext {
            span: self.span.clone(),
        }
    }
}

impl Default for DispatchContext {
    fn default() -> Self {
        DispatchContext {
            span: Span::current(),
        }
    }
}

/// One webhook delivery paired with the handler chosen to process it.
///
/// Immutable once constructed. A dispatch is executed at most once, by
/// whichever scheduler (or worker) ends up owning it.
#[derive(Clone)]
pub struct Dispatch {
    /// The handler resolved from the registry for this event type.
    pub handler: Arc<dyn EventHandler>,
    /// Execution context; asynchronous schedulers re-derive this before
    /// invoking the handler.
    pub ctx: DispatchContext,
    /// The event type from the delivery's routing header.
    pub event_type: String,
    /// The platform-assigned delivery id.
    pub delivery_id: String,
    /// The raw, signature-verified payload.
    pub payload: Bytes,
}

impl Dispatch {
    /// Invokes the handler with the stored arguments, instrumented with the
    /// context's span.
    pub async fn execute(&self) -> Result<Option<HookResponse>, HandlerError> {
        self.handler
            .handle(&self.ctx, &self.event_type, &self.delivery_id, &self.payload)
            .instrument(self.ctx.span().clone())
            .await
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("event_type", &self.event_type)
            .field("delivery_id", &self.delivery_id)
            .field("payload_len", &self.payload.len())
            .finish_non_exhaustive()
    }
}
