//! Configuration module for Blocked-Domains
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use blocked_domains::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Keeping domains blocked at {}% or more", config.filter.percent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, PagerConfig, RowConfig, SiteConfig,
    TargetEntry, MIN_CONCURRENCY,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

#[cfg(test)]
pub(crate) use parser::SAMPLE_CONFIG;
