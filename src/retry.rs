//! Bounded retry with exponential backoff.

use std::thread;
use std::time::Duration;

use tracing::warn;

/// How a retried operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted { error: E, attempts: u32 },
    /// An attempt failed with an error the policy does not retry.
    Aborted { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Exhausted { error, .. } | Self::Aborted { error, .. } => Err(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(2).min(16);
        self.backoff.saturating_mul(1 << doublings)
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects its error, or
/// `policy.max_attempts` is reached. The operation receives the 1-based
/// attempt number.
pub fn retry<T, E, F, P>(policy: RetryPolicy, should_retry: P, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation(attempt) {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                }
            }
            Err(error) if !should_retry(&error) => {
                return RetryOutcome::Aborted {
                    error,
                    attempts: attempt,
                }
            }
            Err(error) if attempt >= policy.max_attempts => {
                return RetryOutcome::Exhausted {
                    error,
                    attempts: attempt,
                }
            }
            Err(error) => {
                attempt += 1;
                let delay = policy.delay_before(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after error: {error}"
                );
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
    }
}
