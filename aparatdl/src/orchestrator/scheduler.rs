//! Bounded-concurrency transfer scheduling.
//!
//! Transfers are blocking, so each one runs on the blocking thread pool. A
//! semaphore permit is acquired *before* a transfer is spawned, which keeps at
//! most `max_concurrent` transfers alive at any time and makes the submit loop
//! wait for a free slot.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::transfer::{DownloadTask, ProgressCallback, TransferOutcome, VideoTransfer};

/// Outcome of one scheduled task, by its index in the submitted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskResult {
    pub index: usize,
    pub outcome: TransferOutcome,
}

/// Results of a scheduling pass.
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Completed tasks, in completion order.
    pub results: Vec<TaskResult>,
    /// Tasks never started because the run was cancelled.
    pub not_started: usize,
}

impl ScheduleReport {
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.success).count()
    }

    pub fn bytes_written(&self) -> u64 {
        self.results
            .iter()
            .filter(|r| r.outcome.success)
            .map(|r| r.outcome.bytes_written)
            .sum()
    }
}

/// Runs blocking transfers with a concurrency limit.
#[derive(Debug, Clone)]
pub struct TransferScheduler {
    /// Maximum number of concurrent transfers.
    max_concurrent: usize,
    cancellation: CancellationToken,
}

impl TransferScheduler {
    /// Create a scheduler.
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum number of concurrent transfers (minimum 1)
    /// * `cancellation` - Stops new transfers from starting once cancelled
    pub fn new(max_concurrent: usize, cancellation: CancellationToken) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            cancellation,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run every task and wait for all started transfers to finish.
    ///
    /// A failed transfer does not affect its siblings. After cancellation no
    /// new transfer starts; transfers already running finish normally.
    pub async fn run<T: VideoTransfer + 'static>(
        &self,
        transfer: Arc<T>,
        tasks: Vec<DownloadTask>,
        progress: Option<ProgressCallback>,
    ) -> ScheduleReport {
        let total = tasks.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(total);

        for (index, task) in tasks.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let transfer = Arc::clone(&transfer);
            let progress = progress.clone();
            debug!(video = %task.title, index, "Starting transfer");

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let outcome = transfer.transfer(&task, progress.as_ref());
                TaskResult { index, outcome }
            }));
        }

        let started = handles.len();
        let mut results = Vec::with_capacity(started);

        for joined in join_all(handles).await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(error = %e, "Transfer task panicked");
                }
            }
        }

        // Panicked transfers count as failures with an unknown index
        let panicked = started - results.len();
        results.extend((0..panicked).map(|_| TaskResult {
            index: usize::MAX,
            outcome: TransferOutcome::failed(0),
        }));

        ScheduleReport {
            results,
            not_started: total - started,
        }
    }
}
