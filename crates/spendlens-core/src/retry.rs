//! Retrying execution wrapper for storage writes
//!
//! All storage writes share one retry discipline: a bounded number of
//! attempts with capped exponential backoff, retrying only errors the
//! caller's predicate identifies as transient.

use std::time::Duration;

use crate::error::{Error, Result};

/// Backoff policy for retried operations
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_delay: Duration,
    /// Ceiling on any single delay
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Delay to sleep after a failed attempt (1-based)
    fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// Run `op`, retrying per `policy` while `is_retryable` approves the error.
///
/// Non-retryable errors propagate immediately. The last error is surfaced
/// once attempts are exhausted.
pub fn with_retry<T, F, P>(policy: &BackoffPolicy, is_retryable: P, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
    P: Fn(&Error) -> bool,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_retryable(&e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient storage error"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
