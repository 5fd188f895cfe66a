//! Webhook dispatch and scheduling for GitHub-style event deliveries.
//!
//! This crate accepts webhook deliveries over HTTP, authenticates them with
//! an HMAC-SHA256 signature, routes them to event-specific handlers, and
//! controls whether handler execution happens inline with the request or
//! off the request path under bounded concurrency.
//!
//! # Overview
//!
//! - Implement [`EventHandler`] for each group of event types your
//!   application processes.
//! - Pick a [`Scheduler`]: [`SyncScheduler`] runs handlers inline,
//!   [`AsyncScheduler`] spawns a task per delivery, and [`QueueScheduler`]
//!   drains a bounded queue with a fixed worker pool and rejects
//!   submissions when full.
//! - Build an [`EventDispatcher`] over your handlers, the shared webhook
//!   secret, and the scheduler, and mount it with [`build_router`].
//!
//! Handlers registered earlier take precedence for event types declared by
//! more than one handler. The platform's `ping` liveness check is always
//! acknowledged without reaching a handler.

pub mod config;
pub mod dispatch;
pub mod dispatcher;
pub mod handler;
pub mod registry;
pub mod scheduler;
pub mod signature;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, DispatchConfig, SchedulerSettings};
pub use dispatch::{Dispatch, DispatchContext};
pub use dispatcher::{
    DEFAULT_WEBHOOK_ROUTE, ErrorCallback, EventDispatcher, ResponseCallback, build_router,
};
pub use handler::{EventHandler, HandlerError, HookResponse};
pub use registry::{HandlerRegistry, PING_EVENT};
pub use scheduler::{
    AsyncErrorCallback, AsyncScheduler, ContextDeriver, QueueScheduler, ScheduleError, Scheduler,
    SyncScheduler,
};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
