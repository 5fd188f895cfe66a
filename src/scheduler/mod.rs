//! Execution strategies for dispatched webhook deliveries.
//!
//! A scheduler decides when and where a [`Dispatch`] runs. Submission is the
//! only operation; it fails only when the scheduler cannot accept the work
//! (the bounded queue is full), never because execution failed. The three
//! strategies:
//!
//! - [`SyncScheduler`]: runs the handler inline with the request and returns
//!   its outcome directly. Handler latency counts against the platform's
//!   delivery timeout.
//! - [`AsyncScheduler`]: one spawned task per dispatch, no limit and no
//!   backpressure.
//! - [`QueueScheduler`]: a fixed pool of workers draining a bounded FIFO
//!   queue; submissions are rejected without blocking when the queue is
//!   full. This is the only backpressure mechanism in the system.
//!
//! Both asynchronous strategies execute through a shared safe-execution
//! wrapper that derives an independent context, contains handler panics,
//! and routes failures to a configurable error callback.
//!
//! [`Dispatch`]: crate::dispatch::Dispatch

mod executor;
mod queue;
mod spawn;
mod sync;

pub use executor::{
    AsyncErrorCallback, ContextDeriver, METRIC_ACTIVE_WORKERS, METRIC_QUEUE_DEPTH,
    default_context_deriver, default_error_callback,
};
pub use queue::{QueueScheduler, QueueSchedulerBuilder};
pub use spawn::AsyncScheduler;
pub use sync::SyncScheduler;

use async_trait::async_trait;
use thiserror::Error;

use crate::dispatch::Dispatch;
use crate::handler::{HandlerError, HookResponse};

/// Errors surfaced from [`Scheduler::submit`].
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The bounded queue was full at the moment of submission. The delivery
    /// was not accepted; the caller should respond server-busy, not treat
    /// this as a handler failure.
    #[error("scheduler queue is at capacity")]
    CapacityExceeded,

    /// The handler failed during synchronous execution. Asynchronous
    /// schedulers never return this; their execution errors go to the
    /// error callback instead.
    #[error("handler failed: {0}")]
    Handler(HandlerError),
}

/// A strategy for executing event handlers.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Submits a dispatch for execution.
    ///
    /// The synchronous strategy runs the handler before returning and yields
    /// its response override (if any). Asynchronous strategies return
    /// `Ok(None)` as soon as the dispatch is accepted; any response override
    /// a deferred handler produces is discarded, since the HTTP response
    /// has already been written by then.
    async fn submit(&self, dispatch: Dispatch) -> Result<Option<HookResponse>, ScheduleError>;
}
