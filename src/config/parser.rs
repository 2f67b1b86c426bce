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
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that two runs can be matched to the configuration that
/// produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
pub(crate) const SAMPLE_CONFIG: &str = r#"
[crawler]
concurrency = 4
max-retries = 3
retry-delay-ms = 0

[site]
base-url = "https://zh.greatfire.org/search/"
probe-suffix = "?page=0"
page-suffix = "?page="

[pager]
container = "ul.pager"
link = ".pager-last.last a"
splitter = "?page="

[rows]
container = "table.gf-header tbody tr"
link = "td.first a"
blocked = "td.blocked"
restricted = "td.restricted"

[filter]
percent = 50
domain-regex = '^/(https?/)?([a-zA-Z0-9][-_a-zA-Z0-9]{0,62}(\.[a-zA-Z0-9][-_a-zA-Z0-9]{0,62})+)$'
ip-regex = '(([0-9]{1,3}\.){3}[0-9]{1,3})'

[output]
dir = "publish"

[[targets]]
name = "alexa"
path = "alexa-top-1000-domains"
referer = "https://zh.greatfire.org/search/alexa-top-1000-domains"

[[targets]]
name = "blocked"
path = "blocked"
referer = "https://zh.greatfire.org/search/blocked"
from = 2
to = 10

[[targets]]
name = "domains"
path = "domains"
referer = "https://zh.greatfire.org/search/domains"
enabled = false
"#;

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
        let file = create_temp_config(SAMPLE_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_retries, 3);
        assert_eq!(config.crawler.retry_delay_ms, 0);
        assert_eq!(config.crawler.channel_capacity, 1600);
        assert_eq!(config.filter.percent, 50);
        assert_eq!(config.filter.domain_group, None);
        assert_eq!(config.rows.attr, "href");
        assert_eq!(config.output.raw_file, "raw.txt");
        assert_eq!(config.targets.len(), 3);
        assert!(config.targets[0].enabled);
        assert_eq!(config.targets[0].to, None);
        assert_eq!(config.targets[1].from, 2);
        assert_eq!(config.targets[1].to, Some(10));
        assert!(!config.targets[2].enabled);
    }

    #[test]
    fn test_concurrency_is_floored() {
        let config = parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.crawler.concurrency, Some(4));
        assert_eq!(config.crawler.effective_concurrency(), 8);

        let mut crawler = config.crawler.clone();
        crawler.concurrency = Some(32);
        assert_eq!(crawler.effective_concurrency(), 32);

        crawler.concurrency = None;
        assert!(crawler.effective_concurrency() >= 8);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = SAMPLE_CONFIG.replace("max-retries = 3", "max-retries = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
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
