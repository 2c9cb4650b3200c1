//! Configuration module for Exhibitor-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Only `[site]` and `[output]` are required; every other section falls back to
//! defaults matching the exhibitor directory the crawler was built for.
//!
//! # Example
//!
//! ```no_run
//! use exhibitor_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {}", config.site.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, FailurePolicy, OutputConfig, OutputFormat, RetryConfig, SelectorConfig,
    SiteConfig, TimingConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
