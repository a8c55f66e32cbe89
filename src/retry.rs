//! Bounded exponential-backoff retry.
//!
//! Attempts are numbered from 1.  After a failed attempt `n` (and only if
//! another attempt remains) the loop sleeps `base_delay * 2^n`, so with the
//! default one-second base the waits are 2s, 4s, 8s, ...
//!
//! Whether a failure is worth repeating is decided by
//! [`Error::is_retryable`], which looks at the HTTP status of the response.
//! Client errors (4xx other than 408/429), validation failures and
//! cancellations end the loop after the attempt that produced them.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_RETRIES, CLIENT_RETRY_BACKOFF};

/// Default number of attempts for retried calls.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base unit of the backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.  Zero behaves as one.
    pub max_attempts: u32,
    /// Base unit that is doubled for every attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// The wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// `op` receives the attempt number.  The last observed error is returned
    /// when every attempt fails.  Cancelling `cancel` interrupts the wait
    /// between attempts and yields [`Error::Abort`].
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() {
                tracing::debug!(attempt, error = %err, "not retrying");
                return Err(err);
            }
            if attempt >= max_attempts {
                tracing::warn!(attempts = attempt, error = %err, "retries exhausted");
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(attempt, ?delay, error = %err, "request failed; backing off");
            CLIENT_REQUEST_RETRIES.click();
            CLIENT_RETRY_BACKOFF.add(delay.as_secs_f64());
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::abort("cancelled while waiting to retry"));
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}
