use serde::Deserialize;

/// Lower bound applied to the configured crawl concurrency
pub const MIN_CONCURRENCY: usize = 8;

/// Main configuration structure for Blocked-Domains
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    pub pager: PagerConfig,
    pub rows: RowConfig,
    pub filter: FilterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of pages fetched concurrently (floored at `MIN_CONCURRENCY`)
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Attempts per page before the page is dropped
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between two attempts on the same page (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Capacity of the record channel between crawl tasks and the aggregator
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fixed User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    /// Returns the concurrency the scheduler actually runs with
    ///
    /// A configured value is floored at `MIN_CONCURRENCY`. Without one, twice the
    /// available parallelism is used, with the same floor.
    pub fn effective_concurrency(&self) -> usize {
        let requested = self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get() * 2)
                .unwrap_or(MIN_CONCURRENCY)
        });
        requested.max(MIN_CONCURRENCY)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            channel_capacity: default_channel_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Listing site URL layout
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Common prefix of every listing URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Suffix appended to a target path for the page-range probe
    #[serde(rename = "probe-suffix")]
    pub probe_suffix: String,

    /// Suffix appended to a target path, followed by the page index
    #[serde(rename = "page-suffix")]
    pub page_suffix: String,
}

/// Selectors locating the "last page" link of the paging control
#[derive(Debug, Clone, Deserialize)]
pub struct PagerConfig {
    pub container: String,
    pub link: String,
    #[serde(default = "default_attr")]
    pub attr: String,
    /// Separator between the link prefix and the page number
    pub splitter: String,
}

/// Selectors locating result rows and their fields
#[derive(Debug, Clone, Deserialize)]
pub struct RowConfig {
    pub container: String,
    pub link: String,
    #[serde(default = "default_attr")]
    pub attr: String,
    pub blocked: String,
    pub restricted: String,
}

/// Threshold and patterns applied to the crawled records
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Minimum blocked percentage for a record to be kept
    pub percent: u32,

    /// Pattern a kept value must match to yield a domain
    #[serde(rename = "domain-regex")]
    pub domain_regex: String,

    /// Capture group holding the domain (defaults to the second-to-last group)
    #[serde(rename = "domain-group", default)]
    pub domain_group: Option<usize>,

    /// Pattern recognizing IP literals among the aggregated values
    #[serde(rename = "ip-regex")]
    pub ip_regex: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding all output files
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Audit log of every crawled record
    #[serde(rename = "raw-file", default = "default_raw_file")]
    pub raw_file: String,

    /// Final deduplicated domain list
    #[serde(rename = "domain-file", default = "default_domain_file")]
    pub domain_file: String,

    /// Final IP list
    #[serde(rename = "ip-file", default = "default_ip_file")]
    pub ip_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            raw_file: default_raw_file(),
            domain_file: default_domain_file(),
            ip_file: default_ip_file(),
        }
    }
}

/// One crawl source of the listing site
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEntry {
    pub name: String,

    /// Path segment appended to the site base URL
    pub path: String,

    pub referer: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// First page to crawl (0-based)
    #[serde(default)]
    pub from: u32,

    /// Last page to crawl; the probed last page when omitted
    #[serde(default)]
    pub to: Option<u32>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_channel_capacity() -> usize {
    1600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:76.0) Gecko/20100101 Firefox/76.0".to_string()
}

fn default_attr() -> String {
    "href".to_string()
}

fn default_output_dir() -> String {
    "publish".to_string()
}

fn default_raw_file() -> String {
    "raw.txt".to_string()
}

fn default_domain_file() -> String {
    "domains.txt".to_string()
}

fn default_ip_file() -> String {
    "ip.txt".to_string()
}

fn default_enabled() -> bool {
    true
}
