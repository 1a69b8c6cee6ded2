//! Crawler module for page rendering and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending and visited URLs
//! - Pluggable page rendering with bounded retries
//! - Structured content and link extraction
//! - Politeness delays between pages
//! - Round-based crawl coordination
//! - Seed list extraction from the site's navigation tree

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod rate_limiter;
mod retry;
mod seeds;
mod worker;

pub use coordinator::{load_seed_urls, run_crawl, Coordinator, RunOptions, StopReason};
pub use fetcher::{
    build_http_client, FetchError, HttpPage, HttpRenderer, PageHandle, RenderEngine,
};
pub use frontier::Frontier;
pub use parser::{ContentExtractor, Extraction, FrameSource, Heading, PageContent, PageLink};
pub use rate_limiter::RateLimiter;
pub use retry::{Attempted, RetryPolicy};
pub use seeds::{
    extract_hrefs, run_seed_extraction, seed_list_path, write_seed_list, SeedExtractor, SeedList,
    DEFAULT_SEED_LIST,
};
pub use worker::{FetchWorker, RenderedPage, WorkerSettings};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Restore the crawl state from the last checkpoint, or seed it
/// 2. Start the HTTP rendering engine
/// 3. Render, extract, and persist pages in rounds
/// 4. Follow discovered links within the depth and page limits
/// 5. Save a final checkpoint and return the run report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `options` - Fresh-start flag and configuration hash
pub async fn crawl(config: Config, options: RunOptions) -> Result<CrawlReport, HarvestError> {
    run_crawl(config, options).await
}
