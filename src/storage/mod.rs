//! Storage module for the record journal
//!
//! Every record is appended to a SQLite journal the moment it is extracted,
//! so a crawl that dies halfway still leaves its records on disk. The journal
//! also remembers each run's status and the hash of the config that drove it.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteJournal;
pub use traits::{Journal, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates the journal database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteJournal)` - Successfully opened journal
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_journal(path: &Path) -> StorageResult<SqliteJournal> {
    SqliteJournal::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
