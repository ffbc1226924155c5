//! Retry with exponential backoff for the storefront API transport.
//!
//! Only HTTP 429 and network-level failures are retried. Every other error,
//! including non-2xx responses the server answered deliberately, is returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ApiError::RateLimited`]: HTTP 429; the server has asked us to back off.
/// - [`ApiError::Http`]: network-level failure (connection reset, timeout, etc.).
///
/// Non-retriable errors (propagated immediately):
/// - [`ApiError::Status`]: the server answered; retrying returns the same answer.
/// - [`ApiError::Unauthenticated`]: session is missing or expired.
/// - [`ApiError::Deserialize`]: response body does not parse.
/// - [`ApiError::InvalidBaseUrl`]: configuration problem.
fn is_retriable(err: &ApiError) -> bool {
    matches!(err, ApiError::RateLimited { .. } | ApiError::Http(_))
}

/// Delay before retry number `attempt + 1`: `backoff_base_secs * 2^attempt`.
fn backoff_delay(backoff_base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(backoff_base_secs.saturating_mul(1u64 << attempt.min(62)))
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for [`backoff_delay`] and tries
/// again, up to `max_retries` additional attempts after the first try. If all
/// retries are exhausted the last error is returned.
///
/// With the defaults (`backoff_base_secs = 2`, `max_retries = 3`) the sleeps
/// are 2 s, 4 s, then 8 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && attempt < max_retries => err,
            Err(err) => return Err(err),
        };

        let delay = backoff_delay(backoff_base_secs, attempt);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %err,
            "transient API error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
