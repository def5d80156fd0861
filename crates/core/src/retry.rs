//! Retry policy for lookup attempts.

use std::time::Duration;

/// How many attempts a resolution gets and how long to wait between
/// them.
///
/// Backoff is linear: the wait after attempt `n` (zero-based) is
/// `backoff_base * (n + 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Base of the backoff ladder.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Create a policy with `retries` extra attempts and a linear
    /// backoff starting at `backoff_base`.
    pub fn new(retries: u32, backoff_base: Duration) -> Self {
        Self {
            retries,
            backoff_base,
        }
    }

    /// Total number of attempts, the initial one included.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Delay before the attempt following `attempt` (zero-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * (attempt + 1)
    }
}
