//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` trait
//! - HTML row and pager extraction
//! - Target probing and page job expansion
//! - Bounded-concurrency scheduling with per-job retry
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod target;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use parser::{
    parse_percent, resolve_percent, ExtractError, HtmlRowExtractor, PagerExtractor, RawRecord,
    RowExtractor,
};
pub use scheduler::{
    CrawlHandle, CrawlReport, CrawlScheduler, JobFailure, JobOutcome, SchedulerConfig,
};
pub use target::{CrawlTarget, PageJob, ResolvedTarget};
