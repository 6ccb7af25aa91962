// Retry policy for GitHub API calls.
// Retries transient and unclassified failures with bounded exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{ErrorKind, Result};

/// Bounded retry policy.
///
/// An operation runs at most `retries + 1` times. Only `Transient` and
/// `Unknown` failures are retried; `Permanent`, `RateLimit` and `Cancelled`
/// failures are returned immediately. After the last attempt the final error
/// is returned unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub factor: f64,
    /// Multiply each delay by a random factor in `[1, 2)`.
    pub randomize: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            min_delay: config.min_delay,
            max_delay: config.max_delay,
            factor: 2.0,
            randomize: true,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Total attempts, counting the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Pause before retry number `retry` (1-based), within `[min_delay, max_delay]`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let min_ms = self.min_delay.as_secs_f64() * 1000.0;
        let max_ms = self.max_delay.as_secs_f64() * 1000.0;

        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let jitter = if self.randomize {
            rand::rng().random_range(1.0..2.0)
        } else {
            1.0
        };

        let ms = (min_ms * self.factor.powi(exponent) * jitter)
            .min(max_ms)
            .max(min_ms);

        if ms.is_finite() {
            Duration::from_micros((ms * 1000.0).round() as u64)
        } else {
            self.max_delay
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.kind() == ErrorKind::Cancelled {
                debug!(attempt, "Operation cancelled, not retrying");
                return Err(err);
            }

            let retries_left = max_attempts - attempt;
            warn!(
                attempt,
                retries_left,
                error = %err,
                "Request failed (attempt {}/{})",
                attempt,
                max_attempts
            );

            if !err.is_retryable() || retries_left == 0 {
                return Err(err);
            }

            let delay = self.backoff(attempt);
            debug!(?delay, "Waiting before retry");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Run `operation` under `policy`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.run(operation).await
}
