//! Crawl coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop, which:
//! - Restores the frontier from a checkpoint or seeds it
//! - Dispatches rounds of up to `concurrency` tasks and waits for all of them
//! - Enqueues discovered links between rounds
//! - Checkpoints periodically and once more at the end

use crate::config::{Config, SiteConfig};
use crate::crawler::fetcher::{HttpRenderer, RenderEngine};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::ContentExtractor;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::seeds::SeedList;
use crate::crawler::worker::{FetchWorker, WorkerSettings};
use crate::output::CrawlReport;
use crate::state::{FrontierTask, RunMetadata, TaskOutcome};
use crate::storage::{
    read_json, CaptureSink, CheckpointSnapshot, CheckpointStore, JsonCheckpointStore,
    StorageError, SNAPSHOT_VERSION,
};
use crate::url::UrlFilter;
use crate::HarvestError;
use futures::future::join_all;
use std::fmt;
use std::path::Path;
use std::time::Instant;

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No tasks left to dispatch
    FrontierDrained,

    /// `max-pages` terminal outcomes reached
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrontierDrained => write!(f, "frontier drained"),
            Self::BudgetExhausted => write!(f, "page budget exhausted"),
        }
    }
}

/// Per-invocation options that are not part of the configuration file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Ignore any saved state and start from the seeds
    pub fresh: bool,

    /// Hash of the configuration file, stored in checkpoints
    pub config_hash: Option<String>,
}

/// Returns the seed URLs for a cold start
///
/// The seed list file is used when it exists and is non-empty; otherwise the
/// configured fallback seeds, or the base URL if there are none.
pub fn load_seed_urls(site: &SiteConfig) -> Vec<String> {
    if let Some(path) = &site.seed_list {
        let path = Path::new(path);
        if path.exists() {
            match read_json::<SeedList>(path) {
                Ok(list) if !list.urls.is_empty() => {
                    tracing::info!("Loaded {} seed URLs from {}", list.urls.len(), path.display());
                    return list.urls;
                }
                Ok(_) => tracing::warn!("Seed list {} is empty", path.display()),
                Err(e) => tracing::warn!("Could not read seed list: {}", e),
            }
        } else {
            tracing::info!("No seed list at {}", path.display());
        }
    }

    if site.fallback_seeds.is_empty() {
        vec![site.base_url.clone()]
    } else {
        site.fallback_seeds.clone()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<E: RenderEngine> {
    config: Config,
    frontier: Frontier,
    worker: FetchWorker<E>,
    store: JsonCheckpointStore,
    metadata: RunMetadata,
    config_hash: Option<String>,
    processed_at_checkpoint: u64,
    session_pages: u64,
    rounds: u64,
}

impl<E: RenderEngine> Coordinator<E> {
    /// Creates a coordinator, restoring saved state unless `options.fresh`
    ///
    /// An unreadable checkpoint is logged and treated as absent. When the
    /// restored frontier is empty the seeds are enqueued; seeds that were
    /// already visited are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid patterns/selectors, or the capture
    ///   directory could not be opened
    pub async fn new(config: Config, engine: E, options: RunOptions) -> Result<Self, HarvestError> {
        let filter = UrlFilter::new(&config.patterns)?;
        let extractor = ContentExtractor::new(&config.selectors)?;
        let store = JsonCheckpointStore::new(&config.output.checkpoint_path)
            .with_capture_dir(&config.output.capture_dir);

        let mut frontier = Frontier::new(filter, config.crawler.max_depth);
        let mut metadata = RunMetadata::default();

        let snapshot = if options.fresh {
            tracing::info!("Fresh crawl requested, ignoring saved state");
            None
        } else {
            match store.load() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!("Could not load checkpoint, starting from scratch: {}", e);
                    None
                }
            }
        };

        if let Some(snapshot) = snapshot {
            if let (Some(saved), Some(current)) = (&snapshot.config_hash, &options.config_hash) {
                if saved != current {
                    tracing::warn!(
                        "Configuration changed since the checkpoint was written; resuming anyway"
                    );
                }
            }

            tracing::info!(
                "Resuming from checkpoint: {} visited, {} pending, {} pages processed",
                snapshot.visited_urls.len(),
                snapshot.pending_queue.len(),
                snapshot.metadata.stats.pages_processed
            );
            frontier.restore(snapshot.visited_urls, snapshot.pending_queue);
            metadata = snapshot.metadata;
        }

        let sink = CaptureSink::open(&config.output.capture_dir, metadata.next_capture_id()).await?;

        if frontier.is_empty() {
            let seeds = load_seed_urls(&config.site);
            let added = frontier.seed(&seeds);
            tracing::info!("Seeded frontier with {} of {} URLs", added, seeds.len());
        }

        let worker = FetchWorker::new(
            engine,
            extractor,
            sink,
            RateLimiter::from_config(&config.rate_limit),
            RetryPolicy::new(config.crawler.max_retries),
            WorkerSettings::from_config(&config.crawler),
        );

        let processed_at_checkpoint = metadata.stats.pages_processed;

        Ok(Self {
            config,
            frontier,
            worker,
            store,
            metadata,
            config_hash: options.config_hash,
            processed_at_checkpoint,
            session_pages: 0,
            rounds: 0,
        })
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Runs the crawl until the frontier drains or the page budget is spent
    ///
    /// The rendering engine is started first and always shut down, even when
    /// the launch or the crawl fails. A failure to persist a capture or a
    /// checkpoint ends the crawl with an error.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let started = Instant::now();

        let result = match self.worker.engine().launch().await {
            Ok(()) => self.launched_run(started).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = self.worker.engine().shutdown().await {
            tracing::warn!("Rendering engine did not shut down cleanly: {}", e);
        }

        result
    }

    async fn launched_run(&mut self, started: Instant) -> Result<CrawlReport, HarvestError> {
        self.metadata.stats.mark_started();

        tracing::info!(
            "Starting crawl: {} pending, budget {} pages, concurrency {}, max depth {}",
            self.frontier.pending_count(),
            self.config.crawler.max_pages,
            self.config.crawler.concurrency,
            self.config.crawler.max_depth
        );

        let stop_reason = self.crawl_rounds().await?;
        self.finish(stop_reason, started)
    }

    async fn crawl_rounds(&mut self) -> Result<StopReason, HarvestError> {
        let max_pages = u64::from(self.config.crawler.max_pages);
        let concurrency = self.config.crawler.concurrency.max(1) as usize;
        let interval = u64::from(self.config.crawler.checkpoint_interval.max(1));

        loop {
            let processed = self.metadata.stats.pages_processed;
            if processed >= max_pages {
                tracing::info!("Page budget of {} reached", max_pages);
                return Ok(StopReason::BudgetExhausted);
            }
            if self.frontier.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(StopReason::FrontierDrained);
            }

            let room = (max_pages - processed).min(concurrency as u64) as usize;
            let batch: Vec<FrontierTask> = self
                .frontier
                .dequeue_batch(room)
                .into_iter()
                .filter(|task| self.frontier.mark_visited(&task.url))
                .collect();

            if batch.is_empty() {
                continue;
            }

            self.rounds += 1;
            self.run_round(&batch).await?;

            let processed = self.metadata.stats.pages_processed;
            tracing::info!(
                "Round {}: {} processed ({} ok, {} failed), {} pending",
                self.rounds,
                processed,
                self.metadata.stats.pages_successful,
                self.metadata.stats.pages_failed,
                self.frontier.pending_count()
            );

            if processed - self.processed_at_checkpoint >= interval {
                self.checkpoint()?;
            }
        }
    }

    /// Dispatches one round and folds its outcomes into the crawl state
    ///
    /// Every task of the round runs to completion before any outcome is
    /// applied, so links discovered here are only dispatched in later rounds.
    async fn run_round(&mut self, batch: &[FrontierTask]) -> Result<(), HarvestError> {
        let worker = &self.worker;
        let outcomes = join_all(batch.iter().map(|task| worker.process(task))).await;

        let mut storage_error: Option<StorageError> = None;

        for (task, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(TaskOutcome::Captured {
                    entry, discovered, ..
                }) => {
                    self.metadata.stats.record_success();
                    self.metadata.pages.push(entry);
                    self.session_pages += 1;

                    let depth = task.depth.saturating_add(1);
                    let added = discovered
                        .iter()
                        .filter(|link| self.frontier.enqueue(link, depth))
                        .count();
                    if added > 0 {
                        tracing::debug!("{} new links from {}", added, task.url);
                    }
                }
                Ok(TaskOutcome::Failed { .. }) => {
                    self.metadata.stats.record_failure();
                    self.session_pages += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to persist capture of {}: {}", task.url, e);
                    storage_error.get_or_insert(e);
                }
            }
        }

        match storage_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> CheckpointSnapshot {
        CheckpointSnapshot {
            version: SNAPSHOT_VERSION,
            config_hash: self.config_hash.clone(),
            visited_urls: self.frontier.visited_urls(),
            pending_queue: self.frontier.pending_tasks(),
            metadata: self.metadata.clone(),
        }
    }

    /// Saves the full crawl state
    pub fn checkpoint(&mut self) -> Result<(), HarvestError> {
        self.store.save(&self.snapshot())?;
        self.processed_at_checkpoint = self.metadata.stats.pages_processed;
        tracing::info!(
            "Checkpoint saved: {} visited, {} pending",
            self.frontier.visited_count(),
            self.frontier.pending_count()
        );
        Ok(())
    }

    fn finish(&mut self, stop_reason: StopReason, started: Instant) -> Result<CrawlReport, HarvestError> {
        self.metadata.stats.mark_finished();
        self.checkpoint()?;

        Ok(CrawlReport {
            stats: self.metadata.stats.clone(),
            session_pages: self.session_pages,
            rounds: self.rounds,
            visited: self.frontier.visited_count(),
            pending: self.frontier.pending_count(),
            elapsed: started.elapsed(),
            stop_reason,
        })
    }
}

/// Runs a complete crawl over HTTP
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `options` - Fresh-start flag and configuration hash
pub async fn run_crawl(config: Config, options: RunOptions) -> Result<CrawlReport, HarvestError> {
    let engine = HttpRenderer::new(&config.user_agent)?;
    let mut coordinator = Coordinator::new(config, engine, options).await?;
    coordinator.run().await
}
