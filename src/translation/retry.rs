/*!
 * Retry policy for provider calls.
 *
 * Attempt `n` (counted from 0) that fails with a retryable error is followed
 * by a wait of `base_delay * 2^n` and attempt `n + 1`, until `max_attempts`
 * attempts have been made. Fatal errors end the loop at once.
 */

use std::time::Duration;

use crate::errors::{FailureClass, ProviderError};

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then make another attempt
    Retry(Duration),
    /// Every attempt has been used up
    Exhausted,
    /// The error is not retryable
    Fatal,
}

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, at least 1
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the attempt following `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 2^31 seconds of backoff is already far beyond any sane setting
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }

    /// Decide what follows a failed `attempt` (0-based)
    pub fn decide(&self, attempt: u32, error: &ProviderError) -> RetryDecision {
        match error.class() {
            FailureClass::Fatal => RetryDecision::Fatal,
            FailureClass::RateLimited | FailureClass::Transient => {
                if attempt + 1 >= self.max_attempts {
                    RetryDecision::Exhausted
                } else {
                    RetryDecision::Retry(self.delay_for(attempt))
                }
            }
        }
    }
}
