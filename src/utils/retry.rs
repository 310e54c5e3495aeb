//! Retry policy
//!
//! Exponential backoff with a capped per-attempt wait and a total elapsed
//! budget. Used around task creation, where transient network and API
//! failures are expected while a room is first contacted.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Retry configuration, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Wait before the first retry; doubled for every following retry
    pub multiplier_secs: f64,

    /// Upper bound for a single wait
    pub max_wait_secs: f64,

    /// No retry is attempted once this much time has elapsed
    pub max_elapsed_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            multiplier_secs: 1.0,
            max_wait_secs: 10.0,
            max_elapsed_secs: 60.0,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Explicit retry loop
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    multiplier: Duration,
    max_wait: Duration,
    max_elapsed: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            multiplier: secs(config.multiplier_secs),
            max_wait: secs(config.max_wait_secs),
            max_elapsed: secs(config.max_elapsed_secs),
        }
    }

    /// Wait before the given retry (1 = the retry after the first failure)
    pub fn wait_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(62) as i32;
        let wait = self.multiplier.as_secs_f64() * 2f64.powi(exp);
        secs(wait).min(self.max_wait)
    }

    /// Run `operation` until it succeeds, fails with an error that
    /// `is_retryable` rejects, or the elapsed budget is spent.
    ///
    /// The last error is returned as-is.
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !is_retryable(&error) || start.elapsed() >= self.max_elapsed {
                return Err(error);
            }

            let wait = self.wait_for(attempt);
            tracing::warn!(
                "Attempt {} failed: {}; retrying in {:.1}s",
                attempt,
                error,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
