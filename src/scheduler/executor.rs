//! Safe-execution wrapper shared by the asynchronous schedulers.
//!
//! Every dispatch pulled for deferred execution goes through [`Executor::
//! safe_execute`]: the active-worker count is incremented, an independent
//! context is derived, the handler runs inside a panic-containment boundary,
//! and any resulting error is routed to the error callback. The count is
//! decremented on every exit path.
//!
//! This is the only place panics are recovered. A panicking handler must not
//! take down a pool worker; it is converted to an ordinary handler error so
//! the callback observes it like any other failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::gauge;
use tracing::error;

use crate::dispatch::{Dispatch, DispatchContext};
use crate::handler::HandlerError;

/// Gauge reporting the depth of the bounded dispatch queue.
pub const METRIC_QUEUE_DEPTH: &str = "webhook.dispatch.queued";
/// Gauge reporting the number of currently-executing workers.
pub const METRIC_ACTIVE_WORKERS: &str = "webhook.dispatch.workers";

/// Called by an asynchronous scheduler when a handler returns an error (or
/// panics). Receives the derived context, the dispatch, and the error.
pub type AsyncErrorCallback = Arc<dyn Fn(&DispatchContext, &Dispatch, &HandlerError) + Send + Sync>;

/// Creates the execution context for deferred work from the dispatch's
/// original, request-scoped context.
pub type ContextDeriver = Arc<dyn Fn(&DispatchContext) -> DispatchContext + Send + Sync>;

/// Default error callback: logs the failure within the dispatch's span.
pub fn default_error_callback() -> AsyncErrorCallback {
    Arc::new(|ctx, dispatch, err| {
        let _guard = ctx.span().enter();
        error!(
            event_type = %dispatch.event_type,
            delivery_id = %dispatch.delivery_id,
            error = %err,
            "webhook handler failed",
        );
    })
}

/// Default context deriver: carries the logging association forward into a
/// context with no tie to the originating request.
pub fn default_context_deriver() -> ContextDeriver {
    Arc::new(DispatchContext::detached)
}

/// Shared execution state and hooks for the asynchronous schedulers.
///
/// Each scheduler instance owns its executor, so the active-worker count of
/// one instance is never visible in another.
#[derive(Clone)]
pub(crate) struct Executor {
    pub(crate) on_error: AsyncErrorCallback,
    pub(crate) deriver: ContextDeriver,
    /// Whether scheduling gauges are reported. Off by default; enabled at
    /// scheduler construction.
    pub(crate) metrics: bool,
    active: Arc<AtomicUsize>,
}

impl Executor {
    pub(crate) fn new() -> Self {
        Executor {
            on_error: default_error_callback(),
            deriver: default_context_deriver(),
            metrics: false,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of dispatches currently executing under this scheduler.
    pub(crate) fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Executes a dispatch with panic containment and error routing.
    pub(crate) async fn safe_execute(&self, mut dispatch: Dispatch) {
        self.active.fetch_add(1, Ordering::SeqCst);
        if self.metrics {
            // Relative updates stay accurate under concurrent executions;
            // absolute sets from a post-fetch value can land out of order.
            gauge!(METRIC_ACTIVE_WORKERS).increment(1.0);
        }

        dispatch.ctx = (self.deriver)(&dispatch.ctx);

        // Run the handler in its own task so a panic unwinds that task
        // instead of the worker. The join error carries the panic payload.
        let execution = dispatch.clone();
        let result = match tokio::spawn(async move { execution.execute().await }).await {
            Ok(outcome) => outcome.map(|_| ()),
            Err(join_err) => Err(join_error_to_handler_error(join_err)),
        };

        if let Err(err) = result {
            (self.on_error)(&dispatch.ctx, &dispatch, &err);
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.metrics {
            gauge!(METRIC_ACTIVE_WORKERS).decrement(1.0);
        }
    }
}

/// Converts a panicked (or cancelled) handler task into a handler error.
fn join_error_to_handler_error(err: tokio::task::JoinError) -> HandlerError {
    if err.is_panic() {
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        format!("handler panicked: {message}").into()
    } else {
        "handler task was cancelled before completion".to_string().into()
    }
}
