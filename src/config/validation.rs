use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, PagerConfig, RowConfig, SiteConfig,
    TargetEntry,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    validate_pager_config(&config.pager)?;
    validate_row_config(&config.rows)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency == Some(0) {
        return Err(ConfigError::Validation(
            "concurrency must be >= 1 when set".to_string(),
        ));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "channel_capacity must be >= 1, got {}",
            config.channel_capacity
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the listing site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.page_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "page_suffix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates paging control selectors
fn validate_pager_config(config: &PagerConfig) -> Result<(), ConfigError> {
    validate_selector("pager.container", &config.container)?;
    validate_selector("pager.link", &config.link)?;
    validate_non_empty("pager.attr", &config.attr)?;
    validate_non_empty("pager.splitter", &config.splitter)?;
    Ok(())
}

/// Validates result row selectors
fn validate_row_config(config: &RowConfig) -> Result<(), ConfigError> {
    validate_selector("rows.container", &config.container)?;
    validate_selector("rows.link", &config.link)?;
    validate_non_empty("rows.attr", &config.attr)?;
    validate_selector("rows.blocked", &config.blocked)?;
    validate_selector("rows.restricted", &config.restricted)?;
    Ok(())
}

/// Validates the threshold and both patterns
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.percent > 100 {
        return Err(ConfigError::Validation(format!(
            "percent must be between 0 and 100, got {}",
            config.percent
        )));
    }

    let domain = compile_pattern("domain_regex", &config.domain_regex)?;
    compile_pattern("ip_regex", &config.ip_regex)?;

    if let Some(group) = config.domain_group {
        if group >= domain.captures_len() {
            return Err(ConfigError::InvalidPattern(format!(
                "domain_group {} does not exist in domain_regex ({} groups)",
                group,
                domain.captures_len() - 1
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    validate_non_empty("output.dir", &config.dir)?;
    validate_non_empty("output.raw_file", &config.raw_file)?;
    validate_non_empty("output.domain_file", &config.domain_file)?;
    validate_non_empty("output.ip_file", &config.ip_file)?;

    if config.raw_file == config.domain_file
        || config.raw_file == config.ip_file
        || config.domain_file == config.ip_file
    {
        return Err(ConfigError::Validation(
            "raw_file, domain_file and ip_file must be distinct".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl targets
fn validate_targets(targets: &[TargetEntry]) -> Result<(), ConfigError> {
    if !targets.iter().any(|t| t.enabled) {
        return Err(ConfigError::Validation(
            "at least one enabled target is required".to_string(),
        ));
    }

    for target in targets {
        validate_non_empty("target name", &target.name)?;
        validate_non_empty(&format!("path of target '{}'", target.name), &target.path)?;

        Url::parse(&target.referer).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid referer '{}' for target '{}': {}",
                target.referer, target.name, e
            ))
        })?;

        if let Some(to) = target.to {
            if target.from > to {
                return Err(ConfigError::Validation(format!(
                    "target '{}' has from ({}) greater than to ({})",
                    target.name, target.from, to
                )));
            }
        }
    }

    let mut names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(ConfigError::Validation(format!(
            "duplicate target name '{}'",
            pair[0]
        )));
    }

    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    validate_non_empty(field, selector)?;
    if Selector::parse(selector).is_err() {
        return Err(ConfigError::InvalidPattern(format!(
            "{} is not a valid CSS selector: '{}'",
            field, selector
        )));
    }
    Ok(())
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("{} is invalid: {}", field, e)))
}
