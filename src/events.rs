//! Events the core emits toward the presentation layer.
//!
//! The core never depends on a rendering technology. Navigation and the
//! download orchestrator push [`Event`] values into an unbounded channel;
//! whatever sits on the other end (a progress bar, a TUI, a test harness)
//! renders them. Send failures are ignored throughout the core: a consumer
//! that hung up stops receiving updates, nothing more.

use tokio::sync::mpsc;

use crate::download::{BatchSummary, TaskState};
use crate::listing::ListingSnapshot;

/// One notification from the core to its consumer.
#[derive(Debug, Clone)]
pub enum Event {
    /// A listing finished loading and is now current.
    ListingUpdated(ListingSnapshot),
    /// A listing fetch or parse failed; the navigator is in its error state.
    NavigationError {
        /// The URL that failed to load.
        url: String,
        /// Human-readable failure description.
        reason: String,
    },
    /// Byte-level progress for an in-flight download. `bytes` is
    /// monotonically non-decreasing per task; `total` is absent when the
    /// server did not disclose a size (render an indeterminate indicator).
    DownloadProgress {
        /// Identifier of the task being downloaded.
        task_id: usize,
        /// Bytes received so far.
        bytes: u64,
        /// Total expected bytes, when known.
        total: Option<u64>,
    },
    /// A task reached a terminal state.
    DownloadOutcome {
        /// Identifier of the finished task.
        task_id: usize,
        /// The terminal state.
        state: TaskState,
    },
    /// The whole batch finished.
    BatchComplete(BatchSummary),
}

/// Sending half of the event channel, handed to core components.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Receiving half of the event channel, handed to the presentation layer.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Creates the event channel connecting the core to its consumer.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
