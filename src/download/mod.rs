//! Download orchestration: tasks, retry policy, and the batch runner.
//!
//! A batch is the set of [`DownloadTask`] values created from one user
//! selection. The [`Orchestrator`] processes the batch sequentially,
//! skipping files already on disk, retrying transient fetch failures with a
//! fixed delay, and emitting progress and outcome events as it goes. One
//! task exhausting its retries never aborts the batch.

mod orchestrator;
mod retry;
mod task;

pub use orchestrator::{BatchReport, Orchestrator};
pub use retry::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FailureKind, RetryDecision, RetryPolicy,
    classify_fetch_error,
};
pub use task::{BatchSummary, DownloadTask, SkipReason, TaskState};
