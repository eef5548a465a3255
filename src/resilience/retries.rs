//! Retry policy for operations that must eventually succeed.
//!
//! # Responsibilities
//! - Describe how long to wait between attempts and when to give up
//! - Run an async operation under that policy, logging each failure
//!
//! # Design Decisions
//! - Startup connectivity uses a fixed delay with no attempt limit, so the
//!   process waits for the database instead of failing fast
//! - A bounded policy returns the last error once attempts are exhausted

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry (and every retry when not exponential).
    pub delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Double the delay per attempt up to `max_delay`.
    pub exponential: bool,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    /// Fixed delay, unbounded attempts, no jitter.
    pub fn forever(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            exponential: false,
            max_delay: delay,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.delay.as_millis() as u64;
        if self.exponential {
            calculate_backoff(attempt, base_ms, self.max_delay.as_millis() as u64, self.jitter)
        } else {
            calculate_backoff(1, base_ms, base_ms, self.jitter)
        }
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::from_secs(5))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            max_attempts: config.max_attempts,
            exponential: config.exponential,
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.delay_ms)),
            jitter: config.jitter,
        }
    }
}

/// Run `op` until it succeeds or `policy` gives up.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempts = 0;
    loop {
        match op().await {
            Ok(value) => {
                if attempts > 0 {
                    tracing::info!(operation = what, attempts = attempts + 1, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) => {
                attempts += 1;
                if !policy.allows_another(attempts) {
                    tracing::error!(operation = what, attempts, error = %e, "Giving up");
                    return Err(e);
                }
                let delay = policy.delay_for(attempts);
                tracing::warn!(operation = what, attempts, delay = ?delay, error = %e, "Attempt failed; retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
