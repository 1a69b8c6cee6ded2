//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FrontierTask`: a pending (url, depth) discovery task
//! - `TaskOutcome`: the terminal result of one dispatched task
//! - `CrawlStats`: processed/successful/failed counters and run timestamps
//! - `RunMetadata`: the run index (stats plus one entry per captured page)

mod stats;
mod task;

// Re-export main types
pub use stats::{CrawlStats, PageMetadataEntry, RunMetadata};
pub use task::{FrontierTask, TaskOutcome};
