//! Cancellable delays and backoff
//!
//! Every suspension point of a crawl goes through this module so that a
//! cancelled token interrupts the crawl no matter where it is waiting.

use crate::browser::BrowserResult;
use crate::HarvestError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), HarvestError> {
    if duration.is_zero() {
        return check(cancel);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Awaits a browser operation unless `cancel` fires first
pub async fn guarded<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, HarvestError>
where
    F: Future<Output = BrowserResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        result = operation => result.map_err(HarvestError::from),
    }
}

/// Fails with `Cancelled` if the token has fired
pub fn check(cancel: &CancellationToken) -> Result<(), HarvestError> {
    if cancel.is_cancelled() {
        Err(HarvestError::Cancelled)
    } else {
        Ok(())
    }
}

/// Exponential backoff: `base × 2^failures`, capped at `cap`
pub fn backoff(base: Duration, failures: u32, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(failures.min(16));
    base.saturating_mul(factor).min(cap)
}
