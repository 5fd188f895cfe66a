//! Bounded-queue execution with a fixed worker pool.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::gauge;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::dispatch::Dispatch;
use crate::handler::HookResponse;

use super::executor::{AsyncErrorCallback, ContextDeriver, Executor, METRIC_QUEUE_DEPTH};
use super::{ScheduleError, Scheduler};

/// Configures a [`QueueScheduler`] before its workers start.
///
/// Callbacks must be set before `build()` because the workers capture them
/// when they are spawned.
pub struct QueueSchedulerBuilder {
    capacity: usize,
    workers: usize,
    exec: Executor,
}

impl QueueSchedulerBuilder {
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

    /// Enables the queue-depth and active-worker gauges for this scheduler.
    pub fn with_scheduling_metrics(mut self) -> Self {
        self.exec.metrics = true;
        self
    }

    /// Starts the worker pool and returns the scheduler.
    ///
    /// # Panics
    ///
    /// Panics if the queue capacity or worker count is zero. Invalid sizing
    /// is a deployment mistake, fatal at startup rather than reported at
    /// runtime.
    pub fn build(self) -> QueueScheduler {
        assert!(self.capacity >= 1, "QueueScheduler: queue capacity must be positive");
        assert!(self.workers >= 1, "QueueScheduler: worker count must be positive");

        let (tx, rx) = mpsc::channel::<Dispatch>(self.capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..self.workers {
            let rx = Arc::clone(&rx);
            let exec = self.exec.clone();
            tokio::spawn(async move {
                loop {
                    // Hold the lock only while waiting for the next entry so
                    // the other workers can pull concurrently during
                    // execution. FIFO order comes from the channel itself.
                    let next = { rx.lock().await.recv().await };
                    match next {
                        Some(dispatch) => {
                            if exec.metrics {
                                gauge!(METRIC_QUEUE_DEPTH).decrement(1.0);
                            }
                            exec.safe_execute(dispatch).await;
                        }
                        None => {
                            debug!(worker, "dispatch queue closed, worker exiting");
                            break;
                        }
                    }
                }
            });
        }

        QueueScheduler {
            tx,
            exec: self.exec,
            capacity: self.capacity,
        }
    }
}

/// Executes dispatches on a fixed pool of workers fed by a bounded FIFO
/// queue.
///
/// Submission is a non-blocking enqueue: when the queue is full it fails
/// fast with [`ScheduleError::CapacityExceeded`] instead of applying
/// backpressure to the caller's task. Entries are dequeued in submission
/// order, but completion order across workers is not guaranteed.
///
/// Dropping the scheduler closes the queue; workers finish the dispatch in
/// hand and exit.
pub struct QueueScheduler {
    tx: mpsc::Sender<Dispatch>,
    exec: Executor,
    capacity: usize,
}

impl QueueScheduler {
    /// Starts configuring a scheduler with the given queue capacity and
    /// worker count. Both must be at least 1; `build()` panics otherwise.
    ///
    /// There is no unbuffered mode: a capacity of 0 cannot mean "hand off
    /// directly to an idle worker", because submission never blocks and an
    /// unbuffered queue would reject every delivery that does not arrive at
    /// the exact moment a worker is waiting. Deployments wanting minimal
    /// buffering should configure a capacity of 1.
    pub fn builder(capacity: usize, workers: usize) -> QueueSchedulerBuilder {
        QueueSchedulerBuilder {
            capacity,
            workers,
            exec: Executor::new(),
        }
    }

    /// Creates a scheduler with default callbacks. See [`Self::builder`].
    pub fn new(capacity: usize, workers: usize) -> Self {
        Self::builder(capacity, workers).build()
    }

    /// Number of dispatches waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// Number of dispatches currently executing.
    pub fn active_workers(&self) -> usize {
        self.exec.active_workers()
    }
}

#[async_trait]
impl Scheduler for QueueScheduler {
    async fn submit(&self, dispatch: Dispatch) -> Result<Option<HookResponse>, ScheduleError> {
        match self.tx.try_send(dispatch) {
            Ok(()) => {
                // Matched by a decrement when a worker pulls the entry, so
                // the gauge tracks the live depth rather than a high-water
                // mark.
                if self.exec.metrics {
                    gauge!(METRIC_QUEUE_DEPTH).increment(1.0);
                }
                Ok(None)
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(ScheduleError::CapacityExceeded),
            // Workers never exit while the scheduler is alive, so the
            // channel cannot be closed here; treat it like saturation.
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ScheduleError::CapacityExceeded),
        }
    }
}
