//! Time-windowed batch dispatcher.
//!
//! Confirmed jobs arrive over a bounded handoff channel and are buffered
//! until the next flush tick. A flush takes the whole buffer, runs one purge
//! per job in arrival order and reports each outcome to its requester before
//! moving on. Failed jobs are reported and dropped, never re-queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::models::outcome::PurgeOutcome;
use crate::models::request::QueuedJob;
use crate::purge::PurgeExecutor;
use crate::slack::{messages, ChatChannel};
use crate::{AppError, Result};

/// Producer side of the handoff into the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<QueuedJob>,
}

impl DispatchHandle {
    /// Wrap the sending half of a handoff channel.
    #[must_use]
    pub fn new(tx: mpsc::Sender<QueuedJob>) -> Self {
        Self { tx }
    }

    /// Hand a confirmed job to the dispatcher, waiting while the handoff
    /// queue is full.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QueueFull` if the dispatcher is no longer running.
    pub async fn enqueue(&self, job: QueuedJob) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| AppError::QueueFull("dispatcher is not running".into()))
    }

    /// Hand a confirmed job to the dispatcher without waiting.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QueueFull` if the handoff queue is at capacity or
    /// the dispatcher is no longer running.
    pub fn try_enqueue(&self, job: QueuedJob) -> Result<()> {
        self.tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                AppError::QueueFull("dispatch queue is at capacity".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::QueueFull("dispatcher is not running".into())
            }
        })
    }
}

/// Create a bounded handoff channel.
#[must_use]
pub fn handoff(capacity: usize) -> (DispatchHandle, mpsc::Receiver<QueuedJob>) {
    let (tx, rx) = mpsc::channel(capacity);
    (DispatchHandle::new(tx), rx)
}

/// Counts from one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl FlushReport {
    /// Total jobs executed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Owns the job buffer and executes it on each tick.
pub struct BatchDispatcher {
    buffer: Vec<QueuedJob>,
    capacity: usize,
    executor: Arc<dyn PurgeExecutor>,
    chat: Arc<dyn ChatChannel>,
}

impl BatchDispatcher {
    /// Create a dispatcher holding at most `capacity` jobs between flushes.
    #[must_use]
    pub fn new(
        capacity: usize,
        executor: Arc<dyn PurgeExecutor>,
        chat: Arc<dyn ChatChannel>,
    ) -> Self {
        Self {
            buffer: Vec::new(),
            capacity,
            executor,
            chat,
        }
    }

    /// Jobs waiting for the next flush.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the buffer has reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Buffer a job for the next flush.
    ///
    /// # Errors
    ///
    /// Returns `AppError::QueueFull` if the buffer is at capacity.
    pub fn accept(&mut self, job: QueuedJob) -> Result<()> {
        if self.is_full() {
            return Err(AppError::QueueFull(format!(
                "flush buffer holds {} jobs",
                self.capacity
            )));
        }
        info!(job_id = %job.id, requester = %job.requester_id, "job buffered");
        self.buffer.push(job);
        Ok(())
    }

    /// Execute and report every buffered job, then leave the buffer empty.
    pub async fn flush(&mut self) -> FlushReport {
        let jobs = std::mem::take(&mut self.buffer);
        let mut report = FlushReport::default();
        if jobs.is_empty() {
            return report;
        }

        let span = info_span!("flush", jobs = jobs.len());
        async {
            for job in jobs {
                let outcome = self.executor.purge(&job.scope).await;
                match &outcome {
                    PurgeOutcome::Success => {
                        report.succeeded += 1;
                        info!(job_id = %job.id, "purge succeeded");
                    }
                    PurgeOutcome::Failure(reason) => {
                        report.failed += 1;
                        warn!(job_id = %job.id, %reason, "purge failed");
                    }
                }

                let text = messages::outcome(&job.requester_id, &job.scope, &outcome);
                if let Err(err) = self.chat.post(&job.channel_id, text).await {
                    warn!(job_id = %job.id, %err, "failed to report purge outcome");
                }
            }
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                "flush complete"
            );
        }
        .instrument(span)
        .await;

        report
    }

    /// Drive the dispatcher until `cancel` fires.
    ///
    /// While the buffer is full the handoff channel is left undrained, which
    /// pushes back on producers until the next flush frees room. Shutdown
    /// does not drain: buffered jobs are dropped.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<QueuedJob>,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut open = true;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(dropped = self.buffer.len(), "dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush().await;
                    if !open {
                        info!("handoff closed and buffer flushed; dispatcher exiting");
                        break;
                    }
                }
                maybe_job = rx.recv(), if open && !self.is_full() => {
                    if let Some(job) = maybe_job {
                        if let Err(err) = self.accept(job) {
                            warn!(%err, "job dropped");
                        }
                    } else {
                        info!("dispatch handoff closed");
                        open = false;
                    }
                }
            }
        }
    }
}

/// Spawn the dispatcher loop as a background task.
#[must_use]
pub fn spawn_dispatcher(
    dispatcher: BatchDispatcher,
    rx: mpsc::Receiver<QueuedJob>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(dispatcher.run(rx, period, cancel))
}
