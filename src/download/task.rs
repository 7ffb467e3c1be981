//! Download tasks and their lifecycle states.

use std::path::{Path, PathBuf};

use crate::listing::Entry;

/// Why a task was skipped without a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination path already exists locally. Cheap idempotent
    /// re-runs over partially downloaded trees are a first-class
    /// requirement, so this check happens before anything else.
    AlreadyExists,
}

/// Lifecycle state of one download task.
///
/// Tasks start `Pending` and are mutated in place by the orchestrator until
/// they reach a terminal state, after which they are retained for reporting
/// only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet touched.
    Pending,
    /// A fetch attempt is in flight.
    InProgress,
    /// The last attempt failed transiently; waiting out the retry delay.
    Retrying,
    /// Downloaded and written to disk.
    Succeeded,
    /// Not downloaded; see the reason.
    Skipped(SkipReason),
    /// All attempts exhausted or a permanent error hit.
    Failed {
        /// Description of the last error.
        reason: String,
    },
    /// The batch was cancelled before this task finished. Distinct from
    /// `Failed` so callers can tell user-initiated aborts from genuine
    /// fetch failures.
    Cancelled,
}

impl TaskState {
    /// Returns true once the task can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Skipped(_) | Self::Failed { .. } | Self::Cancelled
        )
    }
}

/// One queued file download.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Batch-unique identifier, used to correlate progress events.
    pub id: usize,
    /// The source entry being downloaded.
    pub entry: Entry,
    /// Where the file lands: `download_dir / entry.display_name`.
    pub destination: PathBuf,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Fetch attempts made so far, bounded by the retry policy.
    pub attempts: u32,
}

impl DownloadTask {
    /// Creates a pending task for an entry, deriving the destination from
    /// the entry's display name.
    #[must_use]
    pub fn new(id: usize, entry: Entry, download_dir: &Path) -> Self {
        let file_name = safe_file_name(&entry.display_name);
        Self {
            id,
            destination: download_dir.join(file_name),
            entry,
            state: TaskState::Pending,
            attempts: 0,
        }
    }
}

/// Makes a decoded display name safe to use as a single path component.
///
/// Decoded names may contain separators (`%2F` decodes to `/`); those and
/// control characters become underscores so the destination stays inside
/// the download directory.
fn safe_file_name(display_name: &str) -> String {
    let cleaned: String = display_name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Terminal-state counts for one finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Tasks that downloaded and wrote successfully.
    pub succeeded: usize,
    /// Tasks skipped because their destination already existed.
    pub skipped: usize,
    /// Tasks that exhausted retries or hit a permanent error.
    pub failed: usize,
    /// Tasks cancelled before completion.
    pub cancelled: usize,
}

impl BatchSummary {
    /// Total number of tasks accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed + self.cancelled
    }

    /// Tallies the terminal states of a finished task set.
    #[must_use]
    pub fn from_tasks(tasks: &[DownloadTask]) -> Self {
        let mut summary = Self::default();
        for task in tasks {
            match task.state {
                TaskState::Succeeded => summary.succeeded += 1,
                TaskState::Skipped(_) => summary.skipped += 1,
                TaskState::Failed { .. } => summary.failed += 1,
                TaskState::Cancelled => summary.cancelled += 1,
                TaskState::Pending | TaskState::InProgress | TaskState::Retrying => {}
            }
        }
        summary
    }
}
