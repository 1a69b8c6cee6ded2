use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, PatternConfig, RateLimitConfig, SeedExtractConfig,
    SelectorConfig, SiteConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Upper bound for pages fetched in one round
const MAX_CONCURRENCY: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_rate_limit(&config.rate_limit)?;
    validate_patterns(&config.patterns)?;
    validate_selectors(&config.selectors)?;
    validate_output_config(&config.output)?;
    validate_seed_extract(&config.seed_extract)?;
    Ok(())
}

/// Validates the site section: base URL and fallback seeds must be http(s)
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.base_url, "base-url")?;

    for seed in &config.fallback_seeds {
        validate_http_url(seed, "fallback seed")?;
    }

    Ok(())
}

fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use the http or https scheme",
            what, raw
        )));
    }

    Ok(())
}

/// Validates crawler limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_interval must be >= 1, got {}",
            config.checkpoint_interval
        )));
    }

    if config.navigation_timeout == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout must be greater than zero".to_string(),
        ));
    }

    if config.root_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "root_selector cannot be empty".to_string(),
        ));
    }
    validate_selector(&config.root_selector)?;

    Ok(())
}

fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) must not exceed max_delay ({}ms)",
            config.min_delay, config.max_delay
        )));
    }
    Ok(())
}

/// Validates that every pattern compiles and at least one include pattern exists
fn validate_patterns(config: &PatternConfig) -> Result<(), ConfigError> {
    if config.include.is_empty() {
        return Err(ConfigError::Validation(
            "at least one include pattern is required".to_string(),
        ));
    }

    for pattern in config.include.iter().chain(config.exclude.iter()) {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.title,
        &config.headings,
        &config.paragraphs,
        &config.lists,
        &config.code,
        &config.tables,
    ] {
        validate_selector(selector)?;
    }
    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.capture_dir.is_empty() {
        return Err(ConfigError::Validation(
            "capture_dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed extraction walk
fn validate_seed_extract(config: &SeedExtractConfig) -> Result<(), ConfigError> {
    if config.start_paths.is_empty() {
        return Err(ConfigError::Validation(
            "seed extraction needs at least one start path".to_string(),
        ));
    }

    if config.max_requests < 1 {
        return Err(ConfigError::Validation(format!(
            "max_requests must be >= 1, got {}",
            config.max_requests
        )));
    }

    let patterns = std::iter::once(&config.follow_pattern)
        .chain(config.content_patterns.iter())
        .chain(config.skip_patterns.iter());
    for pattern in patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}
