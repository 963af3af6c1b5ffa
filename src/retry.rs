// ABOUTME: Bounded retry with a fixed backoff for mutating API requests
// ABOUTME: Read-modify-write helper that only returns the object once the write lands

//! A failed write is retried after the same delay every time, up to
//! `max_attempts` attempts in total.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Run `operation` until it succeeds or the attempts are used up, returning
/// the last error in that case.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= max_attempts {
                    error!(
                        operation = %operation_name,
                        attempt = attempt,
                        error = %e,
                        "Operation failed after max retries"
                    );
                    return Err(e);
                }

                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = config.backoff.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::time::sleep(config.backoff).await;
            }
        }
    }
}

/// Read the current object once, apply `mutate`, then write the result back
/// with retries. The written object is returned only on success.
pub async fn update_with_retry<T, W, R, RFut, M, P, PFut>(
    config: &RetryConfig,
    key: &str,
    read: R,
    mutate: M,
    mut write: P,
) -> Result<W>
where
    T: Clone,
    R: FnOnce() -> RFut,
    RFut: Future<Output = Result<T>>,
    M: FnOnce(T) -> T,
    P: FnMut(T) -> PFut,
    PFut: Future<Output = Result<W>>,
{
    let current = read().await?;
    let updated = mutate(current);

    retry_with_backoff(config, key, || write(updated.clone())).await
}
