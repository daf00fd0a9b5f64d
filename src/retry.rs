//! Retry policy
//!
//! Bounded Fibonacci backoff applied around API calls known to fail
//! transiently: throttling rejections, and success-shaped responses with an
//! empty payload. Everything else is terminal on first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Seed interval for general API retries.
pub const API_RETRY_SEED: Duration = Duration::from_millis(100);

/// Seed interval while polling a long-running report for completion.
pub const REPORT_POLL_SEED: Duration = Duration::from_secs(1);

/// Maximum retries for general throttling backoff.
pub const API_MAX_RETRIES: u32 = 5;

/// Maximum retries while polling a long-running report for completion.
pub const REPORT_POLL_MAX_RETRIES: u32 = 10;

/// Fibonacci-shaped backoff intervals: seed, seed, 2×seed, 3×seed, 5×seed...
#[derive(Debug, Clone)]
pub struct Fibonacci {
    prev: Duration,
    next: Duration,
}

impl Fibonacci {
    pub fn new(seed: Duration) -> Self {
        Self {
            prev: Duration::ZERO,
            next: seed,
        }
    }

    /// Advance the sequence and return the next wait interval.
    pub fn next_interval(&mut self) -> Duration {
        let interval = self.next;
        self.next = self.prev.saturating_add(self.next);
        self.prev = interval;
        interval
    }
}

impl Iterator for Fibonacci {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_interval())
    }
}

/// Default transient classification: a provider throttling rejection or the
/// empty-success anomaly.
pub fn default_retryable(err: &Error) -> bool {
    err.is_throttling() || err.is_empty_response()
}

/// Run `op`, retrying failures that `retryable` classifies as transient up
/// to `max_retries` additional attempts, backing off along a Fibonacci
/// sequence seeded at `seed`.
///
/// Non-retryable errors propagate after a single attempt; exhausting the
/// budget surfaces the last error.
pub async fn with_retry<T, F, Fut, P>(
    max_retries: u32,
    seed: Duration,
    retryable: P,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut backoff = Fibonacci::new(seed);
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && retryable(&err) => {
                attempt += 1;
                let wait = backoff.next_interval();
                tracing::debug!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "retrying transient error"
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}
