//! Retry-with-backoff wrapper for backend calls.
//!
//! Wraps any asynchronous operation and retries it on transient failures
//! (network trouble, timeouts, 5xx, 429) with an exponentially growing,
//! capped delay. Non-transient failures propagate on the first attempt
//! without any delay.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

// =============================================================================
// Error classification
// =============================================================================

/// Errors that may carry an HTTP-like status code.
pub trait StatusCode {
    fn status_code(&self) -> Option<u16>;
}

const TRANSIENT_MARKERS: &[&str] = &["network", "timeout", "timed out", "connection", "fetch"];

/// Default retry predicate.
///
/// Retries when the message mentions a network, timeout, connection or fetch
/// failure, when the status is in `[500, 600)`, or when the status is 429.
/// Everything else (validation failures, other 4xx) is final.
pub fn is_transient<E>(err: &E) -> bool
where
    E: Display + StatusCode,
{
    if let Some(status) = err.status_code() {
        if status == 429 || (500..600).contains(&status) {
            return true;
        }
    }
    let message = err.to_string().to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

// =============================================================================
// Options
// =============================================================================

/// Retry schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Retries after the first attempt; at most `max_retries + 1` calls.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryOptions {
    /// Delay slept after the failed attempt number `attempt` (0-based):
    /// `min(initial_delay * backoff_factor^attempt, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max = Duration::from_millis(self.max_delay_ms);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        if !millis.is_finite() || millis >= max.as_millis() as f64 {
            return max;
        }
        Duration::from_secs_f64(millis.max(0.0) / 1_000.0).min(max)
    }
}

// =============================================================================
// Wrapper
// =============================================================================

/// Runs `operation`, retrying transient failures per [`is_transient`].
pub async fn retry_with_backoff<T, E, F, Fut>(operation: F, options: &RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + StatusCode,
{
    retry_with_backoff_if(operation, options, is_transient::<E>).await
}

/// Runs `operation`, retrying failures for which `should_retry` holds.
///
/// The last error is returned once `options.max_retries` retries are spent
/// or as soon as `should_retry` rejects an error.
pub async fn retry_with_backoff_if<T, E, F, Fut, P>(
    mut operation: F,
    options: &RetryOptions,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= options.max_retries || !should_retry(&err) {
                    return Err(err);
                }

                let delay = options.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = options.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient backend error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
