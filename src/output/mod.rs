//! Output module for crawl summaries and statistics
//!
//! Captured pages and the run index are written by the storage layer; this
//! module only reports on them.

pub mod stats;

pub use stats::{load_statistics, print_statistics, print_summary, CrawlReport};
