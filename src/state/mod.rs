//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the named states of the category/listing traversal

mod phase;

pub use phase::CrawlPhase;
