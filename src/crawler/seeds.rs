//! Seed list extraction
//!
//! Walks the site's navigation tree breadth first, expanding every tree page
//! that matches the follow pattern, and collects the content pages it links
//! to. The result is the seed list file read at cold start by
//! [`load_seed_urls`](crate::crawler::load_seed_urls).

use crate::config::{Config, PatternConfig};
use crate::crawler::fetcher::{FetchError, HttpRenderer, PageHandle, RenderEngine};
use crate::crawler::rate_limiter::RateLimiter;
use crate::storage::{write_json_atomic_async, StorageError};
use crate::url::{resolve_href, UrlFilter};
use crate::{ConfigError, HarvestError};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// File name of the seed list when `site.seed-list` is unset
pub const DEFAULT_SEED_LIST: &str = "all-manual-urls.json";

/// Precompiled seed list (`{generatedAt, total, urls}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedList {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub total: usize,

    #[serde(default)]
    pub urls: Vec<String>,
}

impl SeedList {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            generated_at: Some(Utc::now()),
            total: urls.len(),
            urls,
        }
    }
}

/// Where the seed list is written and read
pub fn seed_list_path(config: &Config) -> PathBuf {
    match &config.site.seed_list {
        Some(path) => PathBuf::from(path),
        None => Path::new(&config.output.capture_dir).join(DEFAULT_SEED_LIST),
    }
}

/// Collects every `href` attribute of a document, in document order
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    match Selector::parse("[href]") {
        Ok(selector) => document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Navigation tree walker producing a [`SeedList`]
pub struct SeedExtractor<E: RenderEngine> {
    engine: E,
    start_urls: Vec<Url>,
    follow: Regex,
    content: UrlFilter,
    host_suffix: String,
    max_requests: u32,
    navigation_timeout: Duration,
    limiter: RateLimiter,
}

impl<E: RenderEngine> SeedExtractor<E> {
    /// Builds the walker from the `[seed-extract]` section
    ///
    /// Start paths are resolved against `site.base-url`.
    pub fn new(config: &Config, engine: E) -> Result<Self, HarvestError> {
        let settings = &config.seed_extract;
        let base_url = Url::parse(&config.site.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.site.base_url, e))
        })?;

        let start_urls = settings
            .start_paths
            .iter()
            .map(|path| resolve_href(path, &base_url))
            .collect::<Result<Vec<_>, _>>()?;

        let follow = Regex::new(&settings.follow_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("'{}': {}", settings.follow_pattern, e))
        })?;

        let content = UrlFilter::new(&PatternConfig {
            include: settings.content_patterns.clone(),
            exclude: settings.skip_patterns.clone(),
        })?;

        let host_suffix = match &settings.host_suffix {
            Some(suffix) => suffix.clone(),
            None => base_url.host_str().unwrap_or_default().to_string(),
        };

        Ok(Self {
            engine,
            start_urls,
            follow,
            content,
            host_suffix,
            max_requests: settings.max_requests,
            navigation_timeout: config.crawler.navigation_timeout(),
            limiter: RateLimiter::new(settings.delay, settings.delay),
        })
    }

    fn in_scope(&self, url: &Url) -> bool {
        url.host_str()
            .map_or(false, |host| host.ends_with(&self.host_suffix))
    }

    /// Walks the navigation tree and returns the sorted content URLs
    ///
    /// Tree pages that fail to load are skipped. The walk stops once the
    /// queue is empty or `max-requests` tree pages have been fetched. The
    /// engine is shut down before returning, even on error.
    pub async fn extract(&self) -> Result<SeedList, HarvestError> {
        let result = match self.engine.launch().await {
            Ok(()) => Ok(self.walk().await),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = self.engine.shutdown().await {
            tracing::warn!("Rendering engine did not shut down cleanly: {}", e);
        }

        result
    }

    async fn walk(&self) -> SeedList {
        let mut queue: VecDeque<Url> = self.start_urls.iter().cloned().collect();
        let mut expanded: HashSet<String> = HashSet::new();
        let mut found: BTreeSet<String> = BTreeSet::new();
        let mut requests = 0u32;

        while requests < self.max_requests {
            let current = match queue.pop_front() {
                Some(url) => url,
                None => break,
            };
            if !expanded.insert(current.to_string()) {
                continue;
            }
            requests += 1;

            let hrefs = match self.fetch_hrefs(&current).await {
                Ok(hrefs) => hrefs,
                Err(e) => {
                    tracing::debug!("Skipping tree page {}: {}", current, e);
                    continue;
                }
            };

            for href in hrefs {
                let url = match resolve_href(&href, &current) {
                    Ok(url) if self.in_scope(&url) => url,
                    _ => continue,
                };

                if self.follow.is_match(url.as_str()) && !expanded.contains(url.as_str()) {
                    queue.push_back(url.clone());
                }
                if self.content.allows(url.as_str()) {
                    found.insert(url.to_string());
                }
            }

            if requests % 100 == 0 {
                tracing::info!(
                    "Expanded {} tree pages, {} content URLs so far",
                    requests,
                    found.len()
                );
            }

            self.limiter.pause().await;
        }

        if requests >= self.max_requests && !queue.is_empty() {
            tracing::warn!(
                "Stopped after {} tree pages with {} still queued",
                requests,
                queue.len()
            );
        }

        SeedList::new(found.into_iter().collect())
    }

    async fn fetch_hrefs(&self, url: &Url) -> Result<Vec<String>, FetchError> {
        let mut page = self.engine.new_page().await?;
        let result = self.load_in(&mut page, url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        result.map(|html| extract_hrefs(&html))
    }

    async fn load_in(&self, page: &mut E::Page, url: &Url) -> Result<String, FetchError> {
        page.goto(url, self.navigation_timeout).await?;
        page.content().await
    }
}

/// Writes the seed list atomically, creating its directory if needed
pub async fn write_seed_list(path: &Path, list: &SeedList) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }
    write_json_atomic_async(path, list).await
}

/// Extracts the seed list over HTTP and saves it
///
/// # Returns
///
/// The path written and the extracted list
pub async fn run_seed_extraction(config: &Config) -> Result<(PathBuf, SeedList), HarvestError> {
    let engine = HttpRenderer::new(&config.user_agent)?;
    let list = SeedExtractor::new(config, engine)?.extract().await?;

    let path = seed_list_path(config);
    write_seed_list(&path, &list).await?;
    tracing::info!("Saved {} seed URLs to {}", list.total, path.display());

    Ok((path, list))
}
