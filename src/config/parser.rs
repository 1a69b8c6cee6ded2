use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored in checkpoints so a resumed crawl can tell when its
/// configuration changed between runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Loads the configuration at `path`, or the built-in defaults when no file exists
///
/// The hash is `None` when the defaults were used.
pub fn load_config_or_default(path: &Path) -> Result<(Config, Option<String>), ConfigError> {
    if path.exists() {
        let (config, hash) = load_config_with_hash(path)?;
        return Ok((config, Some(hash)));
    }

    let config = Config::default();
    validate(&config)?;
    Ok((config, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
base-url = "https://docs.example.com/"
fallback-seeds = ["https://docs.example.com/index.html"]

[crawler]
max-pages = 50
max-depth = 3
max-retries = 1
concurrency = 4

[rate-limit]
min-delay = 10
max-delay = 20

[patterns]
include = ['docs\.example\.com']
exclude = ['\.pdf$']

[output]
capture-dir = "./out"
checkpoint-path = "./out/checkpoint.json"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.base_url, "https://docs.example.com/");
        assert_eq!(config.crawler.max_pages, 50);
        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.concurrency, 4);
        assert_eq!(config.rate_limit.max_delay, 20);
        assert_eq!(config.patterns.exclude, vec![r"\.pdf$".to_string()]);
        assert_eq!(config.output.capture_dir, "./out");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let file = create_temp_config("[crawler]\nmax-depth = 2\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.max_pages, 1000);
        assert_eq!(config.crawler.concurrency, 3);
        assert_eq!(config.rate_limit.min_delay, 300);
        assert_eq!(config.patterns.exclude.len(), 4);
        assert_eq!(config.selectors.paragraphs, "p");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let (config, hash) =
            load_config_or_default(Path::new("/nonexistent/harvest.toml")).unwrap();
        assert!(hash.is_none());
        assert_eq!(config.crawler.max_retries, 3);
        assert_eq!(config.site.fallback_seeds.len(), 2);
    }

    #[test]
    fn test_load_config_or_default_with_file() {
        let file = create_temp_config("[crawler]\nmax-pages = 7\n");
        let (config, hash) = load_config_or_default(file.path()).unwrap();
        assert_eq!(config.crawler.max_pages, 7);
        assert_eq!(hash.map(|h| h.len()), Some(64));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
