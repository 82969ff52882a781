//! Retry policy for backend calls.
//!
//! Reads are idempotent against the backends, so transient failures are
//! retried with exponential backoff up to a configured attempt count. Writes
//! go through [`RetryPolicy::single_attempt`]: the facade never invents
//! retries that could duplicate effects, leaving deduplication to the caller.

use std::future::Future;
use std::time::Duration;

use crate::config::PolicyConfig;
use crate::error::GatewayError;

/// Attempt bound and backoff base for one class of backend operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (1 = no retry).
    pub max_attempts: u32,
    /// Delay before the first retry; doubled per subsequent attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Policy for idempotent reads, from configuration.
    pub fn reads(policy: &PolicyConfig) -> Self {
        Self {
            max_attempts: policy.read_retries.max(1),
            backoff: Duration::from_millis(policy.retry_backoff_ms),
        }
    }

    /// Policy for writes: exactly one attempt.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Run `call` under `policy`, retrying transient failures.
///
/// Non-transient errors (validation, backend rejections) return immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.backoff * 2u32.saturating_pow(attempt - 1);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient backend failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
