// src/sync/retry.rs
//! Retry with exponential backoff for calls to the work-order server.

use crate::constants::{RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS};
use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Runs `operation` up to `max_attempts` times, sleeping `initial_delay`
/// after the first failure and doubling the sleep after each one after that.
/// The last error is returned when every attempt fails.
pub async fn retry_operation<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                log::warn!(
                    "Attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
        }
    }
}

/// [`retry_operation`] with 3 attempts starting at 1 s.
pub async fn retry_default<F, T, Fut>(operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    retry_operation(
        operation,
        RETRY_MAX_ATTEMPTS,
        Duration::from_millis(RETRY_INITIAL_DELAY_MS),
    )
    .await
}
