//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the browser session and walks the directory as an
//! explicit state machine (see [`CrawlPhase`]):
//!
//! ```text
//! EnteringCategory(i) ─▶ RequestingNext(i) ─▶ VisitingDetail(i, n) ─▶ Returned(i) ─┐
//!                              ▲   │                                               │
//!                              │   └─ exhausted ─▶ CategoryDone(i) ─▶ EnteringCategory(i + 1)
//!                              └───────────────────────────────────────────────────┘
//! ```
//!
//! Navigation is retried with backoff. A failure that survives its retries is
//! handled by the configured [`FailurePolicy`]. Whatever happens, the records
//! collected so far end up in the returned [`CrawlReport`].

use crate::browser::{Browser, ElementHandle};
use crate::config::{Config, FailurePolicy};
use crate::crawler::categories::{effective_bound, CategoryIndex, EntryKind};
use crate::crawler::consent::dismiss_consent;
use crate::crawler::expander::{Expansion, ListingExpander};
use crate::crawler::extractor::FieldExtractor;
use crate::crawler::pacing::{backoff, check, guarded, pause};
use crate::output::{CrawlOutcome, CrawlReport};
use crate::record::CompanyRecord;
use crate::state::CrawlPhase;
use crate::storage::Journal;
use crate::HarvestError;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A navigation step that is retried on failure
#[derive(Debug, Clone)]
enum NavAction {
    Goto(String),
    Click(ElementHandle),
    Back,
}

impl fmt::Display for NavAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goto(url) => write!(f, "open {}", url),
            Self::Click(handle) => write!(f, "click {}", handle),
            Self::Back => write!(f, "go back"),
        }
    }
}

/// Journal run the coordinator appends to
struct JournalRun {
    journal: Box<dyn Journal + Send>,
    run_id: i64,
}

/// Main crawler coordinator structure
pub struct Coordinator<B: Browser> {
    config: Arc<Config>,
    browser: B,
    extractor: FieldExtractor,
    categories: CategoryIndex,
    journal: Option<JournalRun>,
    cancel: CancellationToken,
    phase: CrawlPhase,
}

impl<B: Browser> Coordinator<B> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `browser` - An open browser session, owned by the coordinator from now on
    /// * `cancel` - Token that stops the crawl at its next suspension point
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - A selector or control pattern did not compile
    pub fn new(config: Config, browser: B, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let extractor = FieldExtractor::new(&config.selectors)?;
        let categories = CategoryIndex::new(&config.selectors, &config.site.control_labels)?;

        Ok(Self {
            config: Arc::new(config),
            browser,
            extractor,
            categories,
            journal: None,
            cancel,
            phase: CrawlPhase::start(),
        })
    }

    /// Appends every extracted record to `run_id` of `journal`
    ///
    /// The run's final status is set when the crawl ends.
    pub fn with_journal(mut self, journal: Box<dyn Journal + Send>, run_id: i64) -> Self {
        self.journal = Some(JournalRun { journal, run_id });
        self
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    /// The attached journal, if any
    pub fn journal(&self) -> Option<&(dyn Journal + Send)> {
        self.journal.as_ref().map(|run| run.journal.as_ref())
    }

    /// Runs the crawl to completion, cancellation or abort
    ///
    /// Never fails as a whole: the outcome, including an aborting error, is
    /// part of the report together with every record collected before it.
    pub async fn run(&mut self) -> CrawlReport {
        let mut report = CrawlReport::new();

        let outcome = match self.traverse(&mut report).await {
            Ok(()) => {
                tracing::info!(
                    "Crawl completed: {} record(s) from {} categories",
                    report.records.len(),
                    report.entered.len()
                );
                CrawlOutcome::Completed
            }
            Err(HarvestError::Cancelled) => {
                tracing::warn!(
                    "Crawl cancelled in {}; keeping {} record(s)",
                    self.phase,
                    report.records.len()
                );
                CrawlOutcome::Cancelled
            }
            Err(e) => {
                tracing::error!(
                    "Crawl aborted in {}: {}; keeping {} record(s)",
                    self.phase,
                    e,
                    report.records.len()
                );
                CrawlOutcome::Aborted(e)
            }
        };

        report.outcome = outcome;
        report.finished_at = Utc::now();
        self.finish_journal(&report);
        report
    }

    /// Opens the directory and drives the state machine until `Finished`
    async fn traverse(&mut self, report: &mut CrawlReport) -> Result<(), HarvestError> {
        let start_url = self.config.site.start_url.clone();
        tracing::info!("Opening directory {}", start_url);
        self.navigate(&NavAction::Goto(start_url)).await?;

        dismiss_consent(&mut self.browser, &self.config, &self.cancel).await?;

        let element_timeout = self.config.timing.element();
        let index_selector = self.config.selectors.category_index.clone();
        if !self.wait_best_effort(&index_selector, element_timeout).await? {
            tracing::warn!("Category index '{}' not found", index_selector);
        }

        let len = guarded(&self.cancel, self.categories.len(&mut self.browser)).await?;
        let bound = effective_bound(len, self.config.site.trailing_controls);
        report.categories_total = bound;
        tracing::info!(
            "Found {} index entries, crawling the first {}",
            len,
            bound
        );

        let config = Arc::clone(&self.config);
        let mut expander = ListingExpander::new(&config);

        self.phase = if bound == 0 {
            CrawlPhase::Finished
        } else {
            CrawlPhase::start()
        };

        while !self.phase.is_terminal() {
            tracing::trace!("Phase: {}", self.phase);
            self.phase = match self.step(&mut expander, bound, report).await {
                Ok(next) => next,
                Err(e) => self.recover(e, report).await?,
            };
        }

        Ok(())
    }

    /// Performs the work of the current phase and returns the next one
    async fn step(
        &mut self,
        expander: &mut ListingExpander<'_>,
        bound: usize,
        report: &mut CrawlReport,
    ) -> Result<CrawlPhase, HarvestError> {
        match self.phase {
            CrawlPhase::EnteringCategory { index } => {
                if self.enter_category(index, bound, report).await? {
                    expander.reset();
                    Ok(CrawlPhase::RequestingNext { index })
                } else {
                    Ok(CrawlPhase::CategoryDone { index })
                }
            }

            CrawlPhase::RequestingNext { index } => {
                match expander.next(&mut self.browser, &self.cancel).await? {
                    Expansion::Listing(listing) => {
                        self.open_detail(&listing).await?;
                        Ok(CrawlPhase::VisitingDetail {
                            index,
                            listing: expander.visited(),
                        })
                    }
                    Expansion::Exhausted => Ok(CrawlPhase::CategoryDone { index }),
                }
            }

            CrawlPhase::VisitingDetail { index, .. } => {
                self.harvest_detail(index, report).await?;
                Ok(CrawlPhase::Returned { index })
            }

            CrawlPhase::Returned { index } => {
                expander.advance();
                Ok(CrawlPhase::RequestingNext { index })
            }

            CrawlPhase::CategoryDone { index } => {
                if index + 1 < bound {
                    Ok(CrawlPhase::EnteringCategory { index: index + 1 })
                } else {
                    Ok(CrawlPhase::Finished)
                }
            }

            CrawlPhase::Finished => Ok(CrawlPhase::Finished),
        }
    }

    /// Applies the failure policy to an error raised in the current phase
    ///
    /// Returns the phase to continue with, or the error if the crawl must stop.
    async fn recover(
        &mut self,
        error: HarvestError,
        report: &mut CrawlReport,
    ) -> Result<CrawlPhase, HarvestError> {
        if matches!(error, HarvestError::Cancelled) {
            return Err(error);
        }

        let Some(index) = self.phase.category() else {
            return Err(error);
        };

        match self.config.retry.on_failure {
            FailurePolicy::Abort => Err(error),
            FailurePolicy::SkipCategory => {
                tracing::warn!("Skipping category {} after failure in {}: {}", index, self.phase, error);
                report.skipped.push(index);

                let start_url = self.config.site.start_url.clone();
                self.navigate(&NavAction::Goto(start_url)).await?;
                Ok(CrawlPhase::CategoryDone { index })
            }
        }
    }

    /// Resolves, classifies and opens index entry `index`
    ///
    /// Returns false if the entry is a navigation control and was not entered.
    async fn enter_category(
        &mut self,
        index: usize,
        bound: usize,
        report: &mut CrawlReport,
    ) -> Result<bool, HarvestError> {
        let handle = guarded(&self.cancel, self.categories.item_at(&mut self.browser, index))
            .await?
            .ok_or(HarvestError::CategoryMissing { index })?;

        if let EntryKind::Control { reason } = self.categories.classify(&handle) {
            tracing::info!("Skipping index entry {}: {}", index, reason);
            report.controls.push(index);
            return Ok(false);
        }

        tracing::info!(
            "Processing category {}/{}: {}",
            index + 1,
            bound,
            handle.label.as_deref().unwrap_or_default()
        );
        self.navigate(&NavAction::Click(handle.link)).await?;
        report.entered.push(index);

        let container = self.config.selectors.listing_container.clone();
        if !self
            .wait_best_effort(&container, self.config.timing.element())
            .await?
        {
            tracing::warn!("Listing container '{}' not found in category {}", container, index);
        }

        Ok(true)
    }

    /// Scrolls a listing into view and follows its link
    async fn open_detail(&mut self, listing: &ElementHandle) -> Result<(), HarvestError> {
        if let Err(e) = guarded(&self.cancel, self.browser.scroll_into_view(listing)).await {
            if matches!(e, HarvestError::Cancelled) {
                return Err(e);
            }
            tracing::debug!("Could not scroll to {}: {}", listing, e);
        }
        pause(&self.cancel, self.config.timing.settle()).await?;

        self.navigate(&NavAction::Click(listing.clone())).await
    }

    /// Extracts the record of the open detail page and returns to the category
    async fn harvest_detail(
        &mut self,
        index: usize,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        tracing::debug!("Scraping company details...");

        let selectors = &self.config.selectors;
        let (contact, address) = (
            selectors.contact_container.clone(),
            selectors.address.clone(),
        );
        if !self
            .wait_best_effort(&contact, self.config.timing.element())
            .await?
        {
            tracing::info!("Contact info not found.");
        }
        // The location block renders with the contact list; only a short grace period
        self.wait_best_effort(&address, self.config.timing.poll())
            .await?;

        let html = guarded(&self.cancel, self.browser.source()).await?;
        let record = self.extractor.extract(&html);
        let name = record.name.clone();
        self.store(index, record, report);

        self.navigate(&NavAction::Back).await?;
        pause(&self.cancel, self.config.timing.after_return()).await?;

        tracing::info!("Finished scraping company {}", name);
        Ok(())
    }

    /// Appends a record to the report and the journal
    fn store(&mut self, index: usize, record: CompanyRecord, report: &mut CrawlReport) {
        let seq = report.records.len();

        if let Some(run) = self.journal.as_mut() {
            if let Err(e) = run.journal.append_record(run.run_id, seq, index, &record) {
                tracing::warn!("Failed to journal record {}: {}", seq, e);
            }
        }

        if record.has_no_contact_details() {
            tracing::debug!("No contact details for '{}'", record.name);
        }
        report.records.push(record);
    }

    /// Waits for `selector`, treating browser errors as "not found"
    async fn wait_best_effort(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, HarvestError> {
        match guarded(&self.cancel, self.browser.wait_for(selector, timeout)).await {
            Ok(found) => Ok(found),
            Err(HarvestError::Cancelled) => Err(HarvestError::Cancelled),
            Err(e) => {
                tracing::debug!("Waiting for '{}' failed: {}", selector, e);
                Ok(false)
            }
        }
    }

    /// Performs a navigation, retrying with backoff
    ///
    /// Makes `1 + navigation-retries` attempts before giving up with
    /// `HarvestError::Navigation`.
    async fn navigate(&mut self, action: &NavAction) -> Result<(), HarvestError> {
        let retries = self.config.retry.navigation_retries;
        let mut attempts = 0u32;

        loop {
            check(&self.cancel)?;
            attempts += 1;

            let result = match action {
                NavAction::Goto(url) => guarded(&self.cancel, self.browser.goto(url)).await,
                NavAction::Click(handle) => guarded(&self.cancel, self.browser.click(handle)).await,
                NavAction::Back => guarded(&self.cancel, self.browser.back()).await,
            };

            match result {
                Ok(()) => return Ok(()),
                Err(HarvestError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(e) if attempts > retries => {
                    return Err(HarvestError::Navigation {
                        action: action.to_string(),
                        attempts,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to {} (attempt {}/{}): {}",
                        action,
                        attempts,
                        retries + 1,
                        e
                    );
                    let delay = backoff(
                        self.config.timing.settle(),
                        attempts - 1,
                        self.config.timing.backoff_cap(),
                    );
                    pause(&self.cancel, delay).await?;
                }
            }
        }
    }

    /// Stamps the journal run with the crawl's outcome
    fn finish_journal(&mut self, report: &CrawlReport) {
        if let Some(run) = self.journal.as_mut() {
            if let Err(e) = run.journal.finish_run(run.run_id, report.run_status()) {
                tracing::warn!("Failed to finish journal run {}: {}", run.run_id, e);
            }
        }
    }
}
