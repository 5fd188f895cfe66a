//! Event type to handler resolution.
//!
//! The registry is built once from an ordered list of handlers and is
//! immutable afterwards. When two handlers declare the same event type, the
//! one registered first wins; the lookup is an explicit ordered scan so that
//! precedence is a visible property of the data rather than a side effect of
//! map construction order.

use std::sync::Arc;

use crate::handler::EventHandler;

/// The liveness-check event type GitHub sends to confirm webhook
/// configuration. Always acknowledged by the dispatch front, never routed to
/// a handler.
pub const PING_EVENT: &str = "ping";

struct Registration {
    /// Event types snapshotted from `handles()` at construction.
    events: Vec<String>,
    handler: Arc<dyn EventHandler>,
}

/// Immutable mapping from event type to exactly one handler.
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

impl HandlerRegistry {
    /// Builds a registry from handlers in priority order.
    ///
    /// Each handler's `handles()` list is snapshotted once here; later
    /// changes to what a handler reports are not observed.
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        let registrations = handlers
            .into_iter()
            .map(|handler| Registration {
                events: handler.handles(),
                handler,
            })
            .collect();
        HandlerRegistry { registrations }
    }

    /// Resolves an event type to the first handler registered for it.
    pub fn resolve(&self, event_type: &str) -> Option<Arc<dyn EventHandler>> {
        self.registrations
            .iter()
            .find(|r| r.events.iter().any(|e| e == event_type))
            .map(|r| Arc::clone(&r.handler))
    }

    /// Number of registered handlers (not event types).
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
