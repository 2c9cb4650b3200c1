//! Output traits and the crawl report
//!
//! A crawl hands its records to exactly one [`RecordSink`] after it stops,
//! together with a [`CrawlReport`] describing how it stopped.

use crate::record::CompanyRecord;
use crate::storage::RunStatus;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Final destination of a crawl's records
///
/// The sink is consumed by the write, so a record sequence can only be
/// rendered once per sink.
pub trait RecordSink {
    /// Renders the header and one row per record, in order
    ///
    /// # Returns
    ///
    /// The number of data rows written
    fn write_records(self, records: &[CompanyRecord]) -> OutputResult<usize>;
}

/// How a crawl ended
#[derive(Debug)]
pub enum CrawlOutcome {
    /// Every category up to the bound was drained
    Completed,

    /// Ctrl-C or the time budget stopped the crawl
    Cancelled,

    /// A failure the policy did not allow to skip
    Aborted(HarvestError),
}

/// What a crawl produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Extracted records in crawl order
    pub records: Vec<CompanyRecord>,

    /// Effective category bound (`N - K`)
    pub categories_total: usize,

    /// Categories that were entered
    pub entered: Vec<usize>,

    /// Categories abandoned under the `skip-category` policy
    pub skipped: Vec<usize>,

    /// In-bound entries classified as navigation controls
    pub controls: Vec<usize>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CrawlOutcome,
}

impl CrawlReport {
    /// Creates an empty report for a crawl starting now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            records: Vec::new(),
            categories_total: 0,
            entered: Vec::new(),
            skipped: Vec::new(),
            controls: Vec::new(),
            started_at: now,
            finished_at: now,
            outcome: CrawlOutcome::Completed,
        }
    }

    /// Returns true if the crawl ran to the end of the category bound
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::Completed)
    }

    /// Wall-clock duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Journal status matching the outcome
    pub fn run_status(&self) -> RunStatus {
        match self.outcome {
            CrawlOutcome::Completed => RunStatus::Completed,
            CrawlOutcome::Cancelled => RunStatus::Interrupted,
            CrawlOutcome::Aborted(_) => RunStatus::Failed,
        }
    }

    /// Records without any contact field
    pub fn records_without_contact(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.has_no_contact_details())
            .count()
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}
