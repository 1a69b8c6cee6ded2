//! Fetch worker: renders, extracts, and persists one frontier task
//!
//! Each attempt runs in its own page session, which is closed whatever the
//! attempt's result. Attempts are retried under the configured
//! [`RetryPolicy`]; a page that succeeds is persisted before the politeness
//! delay, and only then reported back to the coordinator.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageHandle, RenderEngine};
use crate::crawler::parser::{ContentExtractor, Extraction, PageContent};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::state::{FrontierTask, TaskOutcome};
use crate::storage::{CaptureSink, StorageError};
use crate::url::resolve_frame_src;
use std::time::Duration;
use url::Url;

/// Per-attempt timing and root-element settings
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub root_selector: String,
    pub root_timeout: Duration,
    pub require_root: bool,
}

impl WorkerSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            root_selector: config.root_selector.clone(),
            root_timeout: config.root_timeout(),
            require_root: config.require_root,
        }
    }
}

/// Markup and extraction result of one successful attempt
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL of the document after redirects
    pub final_url: Url,
    pub html: String,
    pub extraction: Extraction,
}

/// Runs frontier tasks against a rendering engine
pub struct FetchWorker<E: RenderEngine> {
    engine: E,
    extractor: ContentExtractor,
    sink: CaptureSink,
    limiter: RateLimiter,
    retry: RetryPolicy,
    settings: WorkerSettings,
}

impl<E: RenderEngine> FetchWorker<E> {
    pub fn new(
        engine: E,
        extractor: ContentExtractor,
        sink: CaptureSink,
        limiter: RateLimiter,
        retry: RetryPolicy,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            engine,
            extractor,
            sink,
            limiter,
            retry,
            settings,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn sink(&self) -> &CaptureSink {
        &self.sink
    }

    /// One attempt: open a session, render `url`, extract, close
    pub async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let mut page = self.engine.new_page().await?;
        let result = self.render_in(&mut page, url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        result
    }

    async fn render_in(&self, page: &mut E::Page, url: &Url) -> Result<RenderedPage, FetchError> {
        page.goto(url, self.settings.navigation_timeout).await?;

        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        if let Err(e) = page
            .wait_for_selector(&self.settings.root_selector, self.settings.root_timeout)
            .await
        {
            if self.settings.require_root {
                return Err(e);
            }
            tracing::debug!("Continuing without root element: {}", e);
        }

        let html = page.content().await?;
        let final_url = page.final_url().cloned().unwrap_or_else(|| url.clone());
        let extraction = self.extractor.extract(&html, &final_url);

        Ok(RenderedPage {
            final_url,
            html,
            extraction,
        })
    }

    /// Processes one task to its terminal outcome
    ///
    /// Fetch failures are absorbed into [`TaskOutcome::Failed`]; only a
    /// failure to persist a capture is returned as an error.
    pub async fn process(&self, task: &FrontierTask) -> Result<TaskOutcome, StorageError> {
        let url = match Url::parse(&task.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("[depth {}] Unparseable task URL {}: {}", task.depth, task.url, e);
                return Ok(TaskOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                });
            }
        };

        let attempted = self.retry.run(&task.url, |_| self.render(&url)).await;
        let attempts = attempted.attempts;

        let rendered = match attempted.result {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(
                    "[depth {}] Giving up on {} after {} attempts: {}",
                    task.depth,
                    task.url,
                    attempts,
                    e
                );
                return Ok(TaskOutcome::Failed {
                    attempts,
                    error: e.to_string(),
                });
            }
        };

        let (content, discovered) = match rendered.extraction {
            Extraction::Document(content) => {
                let links: Vec<String> = content.links.iter().map(|link| link.href.clone()).collect();
                (content, links)
            }
            Extraction::Frameset { frames } => {
                let links: Vec<String> = frames
                    .iter()
                    .filter_map(|frame| frame.src.as_deref())
                    .filter_map(|src| resolve_frame_src(src, &rendered.final_url).ok())
                    .map(|frame_url| frame_url.to_string())
                    .collect();
                tracing::info!(
                    "[depth {}] Frameset at {} references {} frames",
                    task.depth,
                    task.url,
                    links.len()
                );
                (PageContent::default(), links)
            }
        };

        let entry = self
            .sink
            .persist(&task.url, task.depth, content, rendered.html)
            .await?;

        tracing::info!(
            "[depth {}] Captured {} -> {} ({} links)",
            task.depth,
            task.url,
            entry.filename,
            discovered.len()
        );

        self.limiter.pause().await;

        Ok(TaskOutcome::Captured {
            entry,
            discovered,
            attempts,
        })
    }
}
