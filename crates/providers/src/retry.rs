//! Bounded retry for transient provider failures.

use std::future::Future;
use std::time::Duration;

use nv_domain::error::Result;

/// Maximum attempts per call.
pub const MAX_TRIES: u32 = 8;

/// Initial backoff delay; doubles after every failed attempt.
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Run `op`, retrying on [`Error::Throttled`] with exponential backoff.
/// Every other error propagates immediately.
///
/// [`Error::Throttled`]: nv_domain::Error::Throttled
pub async fn with_retry<F, Fut, T>(op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = BASE_DELAY;
    let mut attempt = 1u32;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < MAX_TRIES => {
                tracing::warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "transient provider failure, backing off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}
