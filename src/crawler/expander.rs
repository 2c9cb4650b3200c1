//! Listing expansion within a category page
//!
//! A category page shows its listings in batches. The expander hands out the
//! next unvisited listing and, once the visible batch is used up, clicks the
//! "load more" control until more listings appear or the control disappears.

use crate::browser::{Browser, ElementHandle};
use crate::config::Config;
use crate::crawler::pacing::{backoff, guarded, pause};
use crate::HarvestError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of asking for the next listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Link of the next unvisited listing
    Listing(ElementHandle),

    /// No listing at the current position and no "load more" control
    Exhausted,
}

/// Hands out the listings of one category in order
pub struct ListingExpander<'a> {
    config: &'a Config,
    visited: usize,
}

impl<'a> ListingExpander<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, visited: 0 }
    }

    /// Listings already visited in the current category
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Records a completed detail visit
    pub fn advance(&mut self) {
        self.visited += 1;
    }

    /// Starts over for a new category
    pub fn reset(&mut self) {
        self.visited = 0;
    }

    /// Returns the next unvisited listing, expanding the page if needed
    ///
    /// # Expansion
    ///
    /// 1. If a listing with a link exists at position `visited`, return it.
    /// 2. If "load more" is present, scroll to it, click it and wait for the
    ///    listing count to grow, then go back to 1. Click failures are logged
    ///    and treated like a click that revealed nothing.
    /// 3. Otherwise the category is exhausted.
    ///
    /// Consecutive attempts that reveal nothing back off exponentially; after
    /// `max-expansion-attempts` of them the expander gives up with
    /// `HarvestError::ExpansionTimeout`.
    pub async fn next<B: Browser + ?Sized>(
        &mut self,
        browser: &mut B,
        cancel: &CancellationToken,
    ) -> Result<Expansion, HarvestError> {
        let selectors = &self.config.selectors;
        let timing = &self.config.timing;
        let max_attempts = self.config.retry.max_expansion_attempts;
        let mut failures = 0u32;

        loop {
            let visible = guarded(cancel, browser.count(&selectors.listing)).await?;
            if visible > self.visited {
                let listing = ElementHandle::nth(selectors.listing.as_str(), self.visited)
                    .child(selectors.listing_link.as_str());
                if guarded(cancel, browser.resolves(&listing)).await? {
                    return Ok(Expansion::Listing(listing));
                }
                tracing::warn!("Listing {} has no link", listing);
            }

            if !guarded(cancel, browser.exists(&selectors.load_more)).await? {
                tracing::info!("No more listings found ({} visited)", self.visited);
                return Ok(Expansion::Exhausted);
            }

            if failures >= max_attempts {
                return Err(HarvestError::ExpansionTimeout {
                    visible,
                    attempts: failures,
                });
            }

            let button = ElementHandle::nth(selectors.load_more.as_str(), 0);

            tracing::debug!("Scrolling to \"load more\"");
            if let Err(e) = guarded(cancel, browser.scroll_into_view(&button)).await {
                if matches!(e, HarvestError::Cancelled) {
                    return Err(e);
                }
                tracing::debug!("Could not scroll to \"load more\": {}", e);
            }
            pause(cancel, timing.load_more_pause()).await?;

            tracing::debug!("Clicking \"load more\" ({} listings visible)", visible);
            if let Err(e) = guarded(cancel, browser.click(&button)).await {
                if matches!(e, HarvestError::Cancelled) {
                    return Err(e);
                }
                tracing::warn!("Error clicking \"load more\": {}", e);
            }

            let budget = backoff(timing.load(), failures, timing.backoff_cap());
            if self.wait_for_growth(browser, cancel, visible, budget).await? {
                failures = 0;
            } else {
                failures += 1;
                tracing::debug!(
                    "\"Load more\" revealed nothing (attempt {}/{})",
                    failures,
                    max_attempts
                );
            }
        }
    }

    /// Polls until more than `visible` listings show or "load more" disappears
    ///
    /// Returns true if the listing count grew within `budget`.
    async fn wait_for_growth<B: Browser + ?Sized>(
        &self,
        browser: &mut B,
        cancel: &CancellationToken,
        visible: usize,
        budget: Duration,
    ) -> Result<bool, HarvestError> {
        let selectors = &self.config.selectors;
        let deadline = Instant::now() + budget;

        loop {
            if guarded(cancel, browser.count(&selectors.listing)).await? > visible {
                return Ok(true);
            }
            if !guarded(cancel, browser.exists(&selectors.load_more)).await? {
                return Ok(false);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            pause(cancel, self.config.timing.poll().min(deadline - now)).await?;
        }
    }
}
