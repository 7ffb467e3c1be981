//! Sequential batch runner for download tasks.
//!
//! The orchestrator consumes a batch of [`DownloadTask`] values and drives
//! each to a terminal state:
//!
//! 1. A task whose destination already exists is skipped without a network
//!    call.
//! 2. Otherwise the file is streamed to disk, emitting byte-level progress
//!    events. Transient fetch failures are retried after the configured
//!    delay, up to the attempt bound; filesystem errors fail the task
//!    immediately and are never retried.
//! 3. A task exhausting its retries never aborts the batch.
//!
//! Tasks are processed one at a time, matching the single-timeline model:
//! the existence check and the file write form one atomic region per
//! destination path, and a retry delay blocks only the task being retried.
//! A cancellation flag, checked before each task and at every retry
//! boundary, marks untouched tasks `Cancelled` rather than `Failed`.
//!
//! An orchestration is not restartable: `run` consumes the orchestrator.
//! Construct a new one for a new batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::retry::{RetryDecision, RetryPolicy, classify_fetch_error};
use super::task::{BatchSummary, DownloadTask, SkipReason, TaskState};
use crate::events::{Event, EventSender};
use crate::fetch::{FetchError, Transport};

/// Everything a finished batch leaves behind: the tasks in their terminal
/// states plus the tallied summary.
#[derive(Debug)]
pub struct BatchReport {
    /// All tasks of the batch, each in a terminal state.
    pub tasks: Vec<DownloadTask>,
    /// Terminal-state counts.
    pub summary: BatchSummary,
}

/// How one download attempt failed.
enum AttemptFailure {
    /// Transport-level failure; candidate for retry.
    Fetch(FetchError),
    /// Local filesystem failure; fatal for the task, never retried.
    Io(String),
}

/// Drives one batch of download tasks to completion.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    events: EventSender,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Creates an orchestrator for one batch.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, events: EventSender) -> Self {
        Self {
            transport,
            policy,
            events,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the batch-level cancellation flag. Setting it stops in-flight
    /// work at the next retry boundary and marks untouched tasks
    /// `Cancelled`.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Processes every task in order and returns the finished batch.
    ///
    /// Consumes the orchestrator; a new batch needs a new orchestration.
    #[instrument(skip(self, tasks), fields(count = tasks.len()))]
    pub async fn run(self, mut tasks: Vec<DownloadTask>) -> BatchReport {
        info!("starting batch");

        for task in &mut tasks {
            if self.cancelled() {
                task.state = TaskState::Cancelled;
                self.emit_outcome(task);
                continue;
            }

            self.run_task(task).await;
            self.emit_outcome(task);
        }

        let summary = BatchSummary::from_tasks(&tasks);
        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch complete"
        );
        let _ = self.events.send(Event::BatchComplete(summary));

        BatchReport { tasks, summary }
    }

    /// Drives a single task to a terminal state.
    async fn run_task(&self, task: &mut DownloadTask) {
        // Skip check before any network traffic. Sequential processing
        // makes this check and the later write one atomic region per path.
        match tokio::fs::try_exists(&task.destination).await {
            Ok(true) => {
                debug!(path = %task.destination.display(), "already downloaded");
                task.state = TaskState::Skipped(SkipReason::AlreadyExists);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(path = %task.destination.display(), error = %e, "existence check failed, attempting download");
            }
        }

        loop {
            task.attempts += 1;
            task.state = TaskState::InProgress;
            debug!(task_id = task.id, attempt = task.attempts, url = %task.entry.absolute_url, "attempting download");

            match self.download_to_file(task).await {
                Ok(bytes) => {
                    info!(task_id = task.id, bytes, path = %task.destination.display(), "download complete");
                    task.state = TaskState::Succeeded;
                    return;
                }
                Err(AttemptFailure::Io(reason)) => {
                    warn!(task_id = task.id, %reason, "filesystem error, not retrying");
                    task.state = TaskState::Failed { reason };
                    return;
                }
                Err(AttemptFailure::Fetch(error)) => {
                    let kind = classify_fetch_error(&error);
                    match self.policy.should_retry(kind, task.attempts) {
                        RetryDecision::Retry { delay, attempt } => {
                            warn!(
                                task_id = task.id,
                                attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "retrying download"
                            );
                            task.state = TaskState::Retrying;
                            tokio::time::sleep(delay).await;
                            if self.cancelled() {
                                task.state = TaskState::Cancelled;
                                return;
                            }
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(task_id = task.id, %reason, "not retrying");
                            task.state = TaskState::Failed {
                                reason: error.to_string(),
                            };
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Streams the task's URL into its destination file, emitting progress
    /// per received chunk and a final 100% notification on success.
    ///
    /// A failure mid-stream removes the partial file so a later re-run does
    /// not mistake it for a completed download.
    async fn download_to_file(&self, task: &DownloadTask) -> Result<u64, AttemptFailure> {
        let url = task.entry.absolute_url.as_str();
        let mut body = self
            .transport
            .fetch_stream(url)
            .await
            .map_err(AttemptFailure::Fetch)?;
        let total = body.content_length;

        let file = File::create(&task.destination)
            .await
            .map_err(|e| AttemptFailure::Io(io_reason(task, &e)))?;
        let mut writer = BufWriter::new(file);
        let mut bytes_downloaded = 0u64;

        let streamed: Result<(), AttemptFailure> = async {
            while let Some(chunk) = body.chunks.next().await {
                let chunk = chunk.map_err(AttemptFailure::Fetch)?;
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(|e| AttemptFailure::Io(io_reason(task, &e)))?;
                bytes_downloaded += chunk.len() as u64;
                self.emit_progress(task.id, bytes_downloaded, total);
            }
            writer
                .flush()
                .await
                .map_err(|e| AttemptFailure::Io(io_reason(task, &e)))
        }
        .await;

        match streamed {
            Ok(()) => {
                // Final notification always carries a total so consumers can
                // render 100% even when the server sent no Content-Length.
                self.emit_progress(task.id, bytes_downloaded, total.or(Some(bytes_downloaded)));
                Ok(bytes_downloaded)
            }
            Err(failure) => {
                drop(writer);
                debug!(path = %task.destination.display(), "removing partial file");
                let _ = tokio::fs::remove_file(&task.destination).await;
                Err(failure)
            }
        }
    }

    fn emit_progress(&self, task_id: usize, bytes: u64, total: Option<u64>) {
        let _ = self.events.send(Event::DownloadProgress {
            task_id,
            bytes,
            total,
        });
    }

    fn emit_outcome(&self, task: &DownloadTask) {
        let _ = self.events.send(Event::DownloadOutcome {
            task_id: task.id,
            state: task.state.clone(),
        });
    }
}

fn io_reason(task: &DownloadTask, error: &std::io::Error) -> String {
    format!("IO error writing to {}: {error}", task.destination.display())
}
