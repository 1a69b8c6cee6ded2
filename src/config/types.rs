use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "seed-extract", default)]
    pub seed_extract: SeedExtractConfig,
}

/// Target site and seed sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the site being harvested
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Optional precompiled seed list (`{"urls": [...]}`)
    #[serde(rename = "seed-list")]
    pub seed_list: Option<String>,

    /// Seeds used when neither a checkpoint nor a seed list provides any
    #[serde(rename = "fallback-seeds")]
    pub fallback_seeds: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://manualweb.ingesis.com.ar/".to_string(),
            seed_list: Some("./data/raw/all-manual-urls.json".to_string()),
            fallback_seeds: vec![
                "https://manualweb.ingesis.com.ar/manutree.asp".to_string(),
                "https://manualweb.ingesis.com.ar/index.asp".to_string(),
            ],
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages processed over the life of the crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum link depth from the seeds
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Additional attempts after a failed fetch
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Number of pages fetched concurrently in one round
    pub concurrency: u32,

    /// Processed pages between periodic checkpoints
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: u32,

    /// Navigation timeout (milliseconds)
    #[serde(rename = "navigation-timeout")]
    pub navigation_timeout: u64,

    /// Delay after navigation for dynamically loaded content (milliseconds)
    #[serde(rename = "settle-delay")]
    pub settle_delay: u64,

    /// Element that signals the page content is present
    #[serde(rename = "root-selector")]
    pub root_selector: String,

    /// How long to wait for the root element (milliseconds)
    #[serde(rename = "root-timeout")]
    pub root_timeout: u64,

    /// Treat a missing root element as a fetch failure
    #[serde(rename = "require-root")]
    pub require_root: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            max_depth: 10,
            max_retries: 3,
            concurrency: 3,
            checkpoint_interval: 10,
            navigation_timeout: 30_000,
            settle_delay: 2_000,
            root_selector: "body".to_string(),
            root_timeout: 5_000,
            require_root: false,
        }
    }
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay)
    }

    pub fn root_timeout(&self) -> Duration {
        Duration::from_millis(self.root_timeout)
    }
}

/// Politeness delay bounds (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    #[serde(rename = "min-delay")]
    pub min_delay: u64,

    #[serde(rename = "max-delay")]
    pub max_delay: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay: 300,
            max_delay: 800,
        }
    }
}

/// URL inclusion and exclusion patterns (regular expressions)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// A URL must match at least one of these
    pub include: Vec<String>,

    /// A URL must match none of these
    pub exclude: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            include: vec![r"manualweb\.ingesis\.com\.ar".to_string()],
            exclude: vec![
                r"(?i)\.(pdf|jpg|jpeg|png|gif|zip|rar|avi|mp4|wmv|flv)$".to_string(),
                r"#$".to_string(),
                r"javascript:".to_string(),
                r"mailto:".to_string(),
            ],
        }
    }
}

/// CSS selectors used for content extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: String,
    pub headings: String,
    pub paragraphs: String,
    pub lists: String,
    pub code: String,
    pub tables: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: "h1, .title, .page-title".to_string(),
            headings: "h1, h2, h3, h4, h5, h6".to_string(),
            paragraphs: "p".to_string(),
            lists: "ul, ol".to_string(),
            code: "code, pre".to_string(),
            tables: "table".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PageHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Seed list extraction from the site's navigation tree
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedExtractConfig {
    /// Navigation pages the walk starts from, relative to `base-url`
    #[serde(rename = "start-paths")]
    pub start_paths: Vec<String>,

    /// Navigation pages matching this pattern are expanded in turn
    #[serde(rename = "follow-pattern")]
    pub follow_pattern: String,

    /// Links matching any of these are collected as seeds
    #[serde(rename = "content-patterns")]
    pub content_patterns: Vec<String>,

    /// Collected links matching any of these are dropped
    #[serde(rename = "skip-patterns")]
    pub skip_patterns: Vec<String>,

    /// Links must have a host ending with this; the base URL host if unset
    #[serde(rename = "host-suffix")]
    pub host_suffix: Option<String>,

    /// Navigation pages fetched before the walk stops
    #[serde(rename = "max-requests")]
    pub max_requests: u32,

    /// Pause after each navigation page (milliseconds)
    pub delay: u64,
}

impl Default for SeedExtractConfig {
    fn default() -> Self {
        let mut start_paths = vec!["manutree.asp".to_string()];
        start_paths.extend((1..=12).map(|section| format!("manutree.asp?section={}", section)));

        Self {
            start_paths,
            follow_pattern: r"manutree\.asp\?section=".to_string(),
            content_patterns: vec![
                r"(?i)mostrartopico\.asp".to_string(),
                r"(?i)guiaweb\.asp".to_string(),
                r"(?i)contenido/".to_string(),
            ],
            skip_patterns: vec![
                r"(?i)\.(pdf|jpg|jpeg|png|gif|zip|rar|avi|mp4|wmv|flv)(\?|$)".to_string(),
            ],
            host_suffix: Some("ingesis.com.ar".to_string()),
            max_requests: 2000,
            delay: 150,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `page-<id>.json` captures and the run index
    #[serde(rename = "capture-dir")]
    pub capture_dir: String,

    /// Path to the checkpoint snapshot
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            capture_dir: "./data/raw".to_string(),
            checkpoint_path: "./data/raw/checkpoint.json".to_string(),
        }
    }
}
