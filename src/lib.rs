//! Blocked-Domains: a blocked-domain list harvester
//!
//! This crate crawls a paginated listing of test results, keeps the entries whose
//! blocking percentage meets a threshold, and reduces them to a minimal, sorted list
//! of domains (plus a list of IP literals) by removing every domain that is already
//! covered by one of its parent domains.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod dedupe;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Blocked-Domains operations
#[derive(Debug, Error)]
pub enum BlockedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to resolve page range of target '{target}': {reason}")]
    Probe { target: String, reason: String },

    #[error(
        "Invalid page range for target '{target}': from {from} to {to} (last page is {max_page})"
    )]
    InvalidPageRange {
        target: String,
        from: u32,
        to: u32,
        max_page: u32,
    },

    #[error("Failed to open output {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Crawl task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlockedError {
    /// Process exit code for this failure category
    ///
    /// | Category | Code |
    /// |----------|------|
    /// | configuration | 2 |
    /// | page range resolution | 3 |
    /// | output sinks | 4 |
    /// | anything else | 1 |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Selector(_) => 2,
            Self::Probe { .. } | Self::InvalidPageRange { .. } => 3,
            Self::Sink { .. } => 4,
            Self::Http(_) | Self::TaskJoin(_) | Self::Io(_) => 1,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Blocked-Domains operations
pub type Result<T> = std::result::Result<T, BlockedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use aggregate::{CandidateSet, ResultAggregator};
pub use config::Config;
pub use crawler::{CrawlScheduler, PageJob, RawRecord};
pub use dedupe::{dedupe, LabelTrie};
pub use state::JobState;
