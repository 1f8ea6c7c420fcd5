//! Bounded retry with exponential backoff for transient store failures

use crate::error::{LedgerError, LedgerResult};
use crate::store::StoreError;
use dbank_core::CancelToken;
use std::future::Future;
use std::time::Duration;

/// Attempt ceiling and backoff schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let nanos = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        Duration::from_nanos(nanos.round() as u64)
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only transient [`StoreError`]s are retried. Each backoff wait ends early
/// with [`LedgerError::Cancelled`] when `cancel` fires. There is no wait
/// after the last attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    cancel: &CancelToken,
    mut op: F,
) -> LedgerResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled { operation });
        }

        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(LedgerError::Store(err));
        }
        if attempt >= max_attempts {
            tracing::error!(operation, attempts = attempt, error = %err, "retries exhausted");
            return Err(LedgerError::RetriesExhausted {
                operation,
                attempts: attempt,
                source: err,
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(LedgerError::Cancelled { operation }),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
