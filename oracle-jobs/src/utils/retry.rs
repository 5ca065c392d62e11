//! Bounded fixed-delay retry
//!
//! Every outbound call the jobs make (indexer page, storage write, storage
//! page read) goes through [`retry_fixed`].
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If attempts remain: log WARN, sleep the fixed delay, retry
//! 4. Otherwise: log and return the last error
//!
//! There is no exponential growth and no jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (values below 1 behave as 1)
    pub max_attempts: u32,
    /// Sleep between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Indexer page fetch: 3 attempts, 2 s apart
    pub const fn indexer_page() -> Self {
        Self::new(3, Duration::from_secs(2))
    }

    /// Storage record write: 3 attempts, 0.5 s apart
    pub const fn storage_write() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up
pub async fn retry_fixed<F, Fut, T, E>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    next_attempt = attempt + 1,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, will retry"
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(err) => {
                tracing::warn!(
                    operation = operation_name,
                    attempts = attempt,
                    error = %err,
                    "Operation failed after final attempt"
                );
                return Err(err);
            }
        }
    }
}
