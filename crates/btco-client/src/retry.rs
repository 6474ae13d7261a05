//! Retry policy with exponential backoff.
//!
//! Only transient failures (`Network`, `Server`) are retried. Each retry is
//! reported to a [`RetryObserver`] before the backoff sleep, so callers can
//! record retries without this crate choosing how they are logged.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientError;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): 200ms, 400ms, 800ms...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// A single retry, reported before the backoff sleep.
#[derive(Debug)]
pub struct RetryEvent<'a> {
    /// Endpoint label, e.g. `POST /issueCredential`.
    pub endpoint: &'a str,
    /// 1-based retry number.
    pub attempt: u32,
    /// Configured retry bound.
    pub max_retries: u32,
    /// The failure that triggered the retry.
    pub error: &'a ClientError,
    /// The backoff about to be slept.
    pub delay: Duration,
}

/// Callback invoked for every retry.
pub type RetryObserver = Arc<dyn Fn(&RetryEvent<'_>) + Send + Sync>;

/// The default observer: a `warn!` per retry.
pub fn log_retry(event: &RetryEvent<'_>) {
    tracing::warn!(
        endpoint = event.endpoint,
        attempt = event.attempt,
        max_retries = event.max_retries,
        delay_ms = event.delay.as_millis() as u64,
        "request failed, retrying: {}",
        event.error
    );
}
