//! Unbounded asynchronous execution: one task per dispatch.

use async_trait::async_trait;

use crate::dispatch::Dispatch;
use crate::handler::HookResponse;

use super::executor::{AsyncErrorCallback, ContextDeriver, Executor};
use super::{ScheduleError, Scheduler};

/// Spawns a new task for every submitted dispatch.
///
/// Submission always succeeds immediately; there is no limit on concurrent
/// executions and no backpressure, so a burst of deliveries produces an
/// equal burst of running handlers. Appropriate when handler work is cheap
/// or rate-limited elsewhere.
pub struct AsyncScheduler {
    exec: Executor,
}

impl AsyncScheduler {
    /// Creates a scheduler with the default error callback and context
    /// deriver.
    pub fn new() -> Self {
        AsyncScheduler {
            exec: Executor::new(),
        }
    }

    /// Sets the callback invoked when a deferred handler fails.
    pub fn with_error_callback(mut self, on_error: AsyncErrorCallback) -> Self {
        self.exec.on_error = on_error;
        self
    }

    /// Sets the deriver producing the execution context for deferred work.
    pub fn with_context_deriver(mut self, deriver: ContextDeriver) -> Self {
        self.exec.deriver = deriver;
        self
    }

    /// Enables the active-worker gauge for this scheduler.
    pub fn with_scheduling_metrics(mut self) -> Self {
        self.exec.metrics = true;
        self
    }

    /// Number of dispatches currently executing.
    pub fn active_workers(&self) -> usize {
        self.exec.active_workers()
    }
}

impl Default for AsyncScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for AsyncScheduler {
    async fn submit(&self, dispatch: Dispatch) -> Result<Option<HookResponse>, ScheduleError> {
        let exec = self.exec.clone();
        tokio::spawn(async move {
            exec.safe_execute(dispatch).await;
        });
        Ok(None)
    }
}
