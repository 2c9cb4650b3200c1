//! Journal trait and error types

use crate::record::CompanyRecord;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during journal operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for journal operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only record journal
///
/// The crawl only ever writes to the journal. Reading happens afterwards,
/// when a run is re-exported.
pub trait Journal {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file that drives the run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Records =====

    /// Appends a record to a run
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run the record belongs to
    /// * `seq` - Position of the record in crawl order, starting at 0
    /// * `category_index` - Index entry the record was found under
    /// * `record` - The extracted record
    fn append_record(
        &mut self,
        run_id: i64,
        seq: usize,
        category_index: usize,
        record: &CompanyRecord,
    ) -> StorageResult<()>;

    /// Loads a run's records in crawl order
    fn load_records(&self, run_id: i64) -> StorageResult<Vec<CompanyRecord>>;

    /// Counts a run's records
    fn count_records(&self, run_id: i64) -> StorageResult<u64>;
}
