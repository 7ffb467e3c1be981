//! Retry classification and policy for transient fetch failures.
//!
//! When a download attempt fails, the error is classified into a
//! [`FailureKind`]: transient failures may succeed on retry, permanent ones
//! will not. The [`RetryPolicy`] then decides whether another attempt is
//! made, using a fixed configured delay between attempts so retry timing is
//! deterministic.

use std::time::Duration;

use tracing::debug;

use crate::fetch::FetchError;

/// Default maximum fetch attempts per task (including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Classification of a fetch failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// May succeed on retry: timeouts, unreachable hosts, 5xx responses,
    /// and unclassified transport errors.
    Transient,
    /// Will not succeed on retry: 4xx responses. Requesting a resource the
    /// server already refused will not start working.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the configured delay.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// The attempt number the retry will be (1-indexed).
        attempt: u32,
    },
    /// Give up on this task.
    DoNotRetry {
        /// Human-readable reason retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior.
///
/// `max_attempts` bounds total attempts including the first; the delay
/// between attempts is constant.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt bound and inter-attempt
    /// delay. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides whether to retry after attempt number `attempt` (1-indexed)
    /// failed with the given failure kind.
    #[must_use]
    pub fn should_retry(&self, failure_kind: FailureKind, attempt: u32) -> RetryDecision {
        if failure_kind == FailureKind::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a fetch error into a failure kind.
///
/// | Error | Kind | Rationale |
/// |-------|------|-----------|
/// | Timeout | Transient | Network may recover |
/// | Unreachable | Transient | Host may come back |
/// | HTTP 4xx | Permanent | The request itself is refused |
/// | HTTP 5xx | Transient | Server-side trouble may pass |
/// | Other | Transient | Unknown; retrying is cheap |
#[must_use]
pub fn classify_fetch_error(error: &FetchError) -> FailureKind {
    match error {
        FetchError::Timeout { .. } | FetchError::Unreachable { .. } | FetchError::Other { .. } => {
            FailureKind::Transient
        }
        FetchError::HttpStatus { status, .. } => {
            if (500..600).contains(status) {
                FailureKind::Transient
            } else {
                // 4xx and anything that is neither 4xx nor 5xx (a success
                // status would not have produced an error).
                FailureKind::Permanent
            }
        }
    }
}
