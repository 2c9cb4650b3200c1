//! Crawler module for the exhibitor directory
//!
//! This module contains the crawling logic, including:
//! - Category index enumeration
//! - Listing expansion through "load more"
//! - Contact record extraction from detail pages
//! - Overall crawl coordination

mod categories;
mod consent;
mod coordinator;
mod expander;
mod extractor;
mod pacing;

pub use categories::{effective_bound, CategoryHandle, CategoryIndex, EntryKind};
pub use consent::dismiss_consent;
pub use coordinator::Coordinator;
pub use expander::{Expansion, ListingExpander};
pub use extractor::{ContactField, FieldExtractor};

use crate::browser::{check_webdriver_status, Browser, WebDriverBrowser};
use crate::config::Config;
use crate::config::OutputFormat;
use crate::output::{export_records, CrawlReport};
use crate::storage::{open_journal, Journal, RunStatus, StorageError};
use crate::HarvestError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Probe the WebDriver endpoint (if `check-status` is set)
/// 2. Open the record journal and start a run
/// 3. Open a browser session and walk the directory
/// 4. Close the session
/// 5. Write every collected record to the output table, also after an abort
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the config file, stored with the journal run
/// * `cancel` - Token that stops the crawl; see [`spawn_cancel_triggers`]
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran and its records were exported; check
///   the report's outcome for cancellation or abort
/// * `Err(HarvestError)` - The crawl could not start or the export failed
pub async fn crawl(
    config: Config,
    config_hash: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, HarvestError> {
    if config.browser.check_status {
        tracing::debug!("Probing WebDriver at {}", config.browser.webdriver_url);
        check_webdriver_status(&config.browser.webdriver_url).await?;
    }

    let mut journal = open_journal(Path::new(&config.output.journal_path))?;
    let run_id = journal.create_run(config_hash)?;
    tracing::info!("Starting crawl run {}", run_id);

    let browser = match WebDriverBrowser::connect(&config.browser).await {
        Ok(browser) => browser,
        Err(e) => {
            if let Err(e) = journal.finish_run(run_id, RunStatus::Failed) {
                tracing::warn!("Failed to finish journal run {}: {}", run_id, e);
            }
            return Err(e.into());
        }
    };

    let output_path = config.output.path.clone();
    let output_format = config.output.format();
    let mut coordinator =
        Coordinator::new(config, browser, cancel)?.with_journal(Box::new(journal), run_id);

    let report = coordinator.run().await;

    if let Err(e) = coordinator.browser_mut().close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }

    export_records(output_format, Path::new(&output_path), &report.records)?;

    Ok(report)
}

/// Re-exports the latest journal run to the output table without crawling
///
/// # Returns
///
/// * `Ok(usize)` - Number of records exported
/// * `Err(HarvestError)` - The journal has no runs or could not be read
pub fn export_journal(config: &Config) -> Result<usize, HarvestError> {
    let journal = open_journal(Path::new(&config.output.journal_path))?;
    export_latest_run(
        &journal,
        Path::new(&config.output.path),
        config.output.format(),
    )
}

/// Writes the records of the journal's latest run to `path`
pub fn export_latest_run(
    journal: &dyn Journal,
    path: &Path,
    format: OutputFormat,
) -> Result<usize, HarvestError> {
    let run = journal.latest_run()?.ok_or_else(|| {
        HarvestError::Storage(StorageError::Database(
            "No crawl runs found in journal".to_string(),
        ))
    })?;

    tracing::info!(
        "Exporting run {} ({}, started {})",
        run.id,
        run.status.to_db_string(),
        run.started_at
    );

    let records = journal.load_records(run.id)?;
    let written = export_records(format, path, &records)?;
    Ok(written)
}

/// Cancels `cancel` on Ctrl-C and, if set, when `max-duration-secs` elapses
///
/// The spawned tasks end on their own once the token is cancelled.
pub fn spawn_cancel_triggers(config: &Config, cancel: &CancellationToken) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::warn!("Ctrl-C received, stopping after the current step"),
                    Err(e) => {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                        return;
                    }
                }
                token.cancel();
            }
        }
    });

    if let Some(budget) = config.timing.max_duration() {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(budget) => {
                    tracing::warn!("Crawl time budget of {:?} used up, stopping", budget);
                    token.cancel();
                }
            }
        });
    }
}
