//! Bounded retry with a pluggable backoff
//!
//! Attempts are strictly sequential: the next attempt is only issued after
//! the previous one has resolved and the backoff delay has elapsed.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Delay between two attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Wait the same amount before every retry
    Fixed(Duration),
    /// Double the wait after each failure, starting at `initial`, never
    /// exceeding `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failure (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// How often, and how patiently, to repeat a failing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A single attempt, no retry
    pub const fn none() -> Self {
        Self {
            retries: 0,
            backoff: Backoff::None,
        }
    }

    pub const fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(retries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Run `op` until it succeeds, the attempts run out, or `cancel` fires.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= self.max_attempts() {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.backoff.delay(attempt);
            tracing::debug!(
                attempt,
                max_attempts = self.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

/// Why a retried call gave up
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final failure
    Exhausted { attempts: u32, last: E },
    Cancelled,
}
