//! Inline execution on the caller's task.

use async_trait::async_trait;

use crate::dispatch::Dispatch;
use crate::handler::HookResponse;

use super::{ScheduleError, Scheduler};

/// Executes each dispatch inline and returns the handler's outcome.
///
/// No context derivation and no panic recovery: execution shares the
/// request's fate, so a panicking handler propagates to the calling HTTP
/// infrastructure. Suitable when handlers are fast enough to finish within
/// the platform's delivery timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncScheduler;

impl SyncScheduler {
    /// Creates the synchronous scheduler.
    pub fn new() -> Self {
        SyncScheduler
    }
}

#[async_trait]
impl Scheduler for SyncScheduler {
    async fn submit(&self, dispatch: Dispatch) -> Result<Option<HookResponse>, ScheduleError> {
        dispatch.execute().await.map_err(ScheduleError::Handler)
    }
}
