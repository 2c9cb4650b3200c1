//! Exhibitor-Harvest: a directory crawler for exhibitor contact data
//!
//! This crate drives a single WebDriver browser session through a paginated
//! exhibitor directory (category index → listings with "load more" expansion →
//! detail pages), extracts one contact record per listing and exports the
//! collected records as a spreadsheet or CSV table.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Exhibitor-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Navigation failed ({action}) after {attempts} attempt(s): {message}")]
    Navigation {
        action: String,
        attempts: u32,
        message: String,
    },

    #[error("Category index entry {index} disappeared from the page")]
    CategoryMissing { index: usize },

    #[error("\"Load more\" did not reveal new listings after {attempts} attempts ({visible} visible)")]
    ExpansionTimeout { visible: usize, attempts: u32 },

    #[error("Crawl was cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Exhibitor-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::CompanyRecord;
pub use state::CrawlPhase;
