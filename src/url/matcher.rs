use crate::config::PatternConfig;
use crate::ConfigError;
use regex::Regex;

/// Compiled inclusion/exclusion contract for candidate URLs
///
/// A URL is admitted when it matches at least one include pattern and no
/// exclude pattern. Patterns are tested against the normalized URL string.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles the configured patterns
    ///
    /// # Examples
    ///
    /// ```
    /// use page_harvest::config::PatternConfig;
    /// use page_harvest::url::UrlFilter;
    ///
    /// let filter = UrlFilter::new(&PatternConfig {
    ///     include: vec![r"example\.com".to_string()],
    ///     exclude: vec![r"\.pdf$".to_string()],
    /// })
    /// .unwrap();
    ///
    /// assert!(filter.allows("https://example.com/guide"));
    /// assert!(!filter.allows("https://example.com/guide.pdf"));
    /// assert!(!filter.allows("https://other.org/guide"));
    /// ```
    pub fn new(patterns: &PatternConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(&patterns.include)?,
            exclude: compile_all(&patterns.exclude)?,
        })
    }

    /// Returns true if the URL satisfies the inclusion contract
    pub fn allows(&self, url: &str) -> bool {
        if self.exclude.iter().any(|pattern| pattern.is_match(url)) {
            return false;
        }

        self.include.iter().any(|pattern| pattern.is_match(url))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
        })
        .collect()
}
