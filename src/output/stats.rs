//! Crawl statistics and end-of-run summaries
//!
//! This module provides the report produced by a finished crawl and the
//! functions that render it (or a saved checkpoint) to stdout.

use crate::crawler::StopReason;
use crate::state::CrawlStats;
use crate::storage::{CheckpointSnapshot, CheckpointStore, JsonCheckpointStore};
use crate::HarvestError;
use std::time::Duration;

/// Summary of one crawl session
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Cumulative counters, including earlier resumed runs
    pub stats: CrawlStats,

    /// Pages processed by this session alone
    pub session_pages: u64,

    /// Dispatch rounds run by this session
    pub rounds: u64,

    /// Size of the visited set at the end
    pub visited: usize,

    /// Tasks left in the queue at the end
    pub pending: usize,

    /// Wall-clock time of this session
    pub elapsed: Duration,

    pub stop_reason: StopReason,
}

impl CrawlReport {
    /// Pages per second processed by this session
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.session_pages as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of processed pages captured successfully, in percent
    pub fn success_rate(&self) -> f64 {
        percentage(self.stats.pages_successful, self.stats.pages_processed)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");

    println!("Pages:");
    println!("  Processed:  {}", report.stats.pages_processed);
    println!(
        "  Successful: {} ({:.1}%)",
        report.stats.pages_successful,
        report.success_rate()
    );
    println!("  Failed:     {}", report.stats.pages_failed);
    println!();

    println!("Frontier:");
    println!("  Visited URLs: {}", report.visited);
    println!("  Pending URLs: {}", report.pending);
    println!();

    println!("This session:");
    println!("  Pages:    {}", report.session_pages);
    println!("  Rounds:   {}", report.rounds);
    println!("  Duration: {:.1}s", report.elapsed.as_secs_f64());
    println!("  Rate:     {:.2} pages/sec", report.throughput());
    println!("  Stopped:  {}", report.stop_reason);
}

/// Loads the saved checkpoint, if any
///
/// # Returns
///
/// * `Ok(Some(snapshot))` - Saved crawl state was found
/// * `Ok(None)` - Nothing has been crawled yet
/// * `Err(HarvestError)` - The state exists but could not be read
pub fn load_statistics(
    store: &JsonCheckpointStore,
) -> Result<Option<CheckpointSnapshot>, HarvestError> {
    Ok(store.load()?)
}

/// Prints the statistics recorded in a checkpoint to stdout
pub fn print_statistics(snapshot: &CheckpointSnapshot) {
    let stats = &snapshot.metadata.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Processed:  {}", stats.pages_processed);
    println!(
        "  Successful: {} ({:.1}%)",
        stats.pages_successful,
        percentage(stats.pages_successful, stats.pages_processed)
    );
    println!("  Failed:     {}", stats.pages_failed);
    println!("  Captured:   {}", snapshot.metadata.pages.len());
    println!();

    println!("Frontier:");
    println!("  Visited URLs: {}", snapshot.visited_urls.len());
    println!("  Pending URLs: {}", snapshot.pending_queue.len());
    println!();

    println!("Timing:");
    match stats.start_time {
        Some(start) => println!("  Started:  {}", start.to_rfc3339()),
        None => println!("  Started:  -"),
    }
    match stats.end_time {
        Some(end) => println!("  Finished: {}", end.to_rfc3339()),
        None => println!("  Finished: - (interrupted or in progress)"),
    }
    if let (Some(start), Some(end)) = (stats.start_time, stats.end_time) {
        println!("  Span:     {}s", (end - start).num_seconds());
    }
}
