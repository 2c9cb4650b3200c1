//! Cookie consent dismissal
//!
//! The directory shows a consent dialog rendered inside a shadow root. It is
//! dismissed once, right after the first page load, on a best-effort basis.

use crate::browser::Browser;
use crate::config::Config;
use crate::crawler::pacing::{guarded, pause};
use crate::HarvestError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Clicks the consent dialog's accept control if it shows up within
/// `consent-timeout`
///
/// Returns whether the dialog was accepted. Browser errors are logged and
/// treated as "not found"; only cancellation is reported as an error.
pub async fn dismiss_consent<B: Browser + ?Sized>(
    browser: &mut B,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<bool, HarvestError> {
    let host = &config.selectors.consent_host;
    let accept = &config.selectors.consent_accept;
    let deadline = Instant::now() + config.timing.consent();

    loop {
        match guarded(cancel, browser.click_in_shadow(host, accept)).await {
            Ok(true) => {
                tracing::info!("Cookie consent accepted.");
                return Ok(true);
            }
            Ok(false) => {}
            Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
            Err(e) => tracing::debug!("Consent dialog not clickable yet: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::info!("Cookie consent banner not found or already accepted.");
            return Ok(false);
        }
        pause(cancel, config.timing.poll().min(deadline - now)).await?;
    }
}
