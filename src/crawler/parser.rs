//! HTML parser for extracting result rows and paging information
//!
//! This module handles parsing listing pages to extract:
//! - One `(value, percent)` record per result row
//! - The index of the last page from the paging control

use crate::config::{PagerConfig, RowConfig};
use crate::BlockedError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// One extracted row before any filtering
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRecord {
    /// Linked URL or domain exactly as found in the row
    pub value: String,

    /// Blocked (or restricted) percentage of the row
    pub percent: u32,
}

impl RawRecord {
    pub fn new(value: impl Into<String>, percent: u32) -> Self {
        Self {
            value: value.into(),
            percent,
        }
    }
}

/// Reasons a page body cannot be turned into records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("page body is empty")]
    EmptyDocument,
}

/// Turns a page body into raw records
pub trait RowExtractor: Send + Sync {
    fn extract(&self, body: &str) -> Result<Vec<RawRecord>, ExtractError>;
}

/// `RowExtractor` driven by CSS selectors
///
/// # Percentage Tie-Break
///
/// Each row carries a "blocked" and a "restricted" cell. Whichever is non-empty
/// sets the percent. When both are non-empty, the restricted cell is read last
/// and wins. A non-empty cell that is not a number counts as 0.
#[derive(Debug)]
pub struct HtmlRowExtractor {
    container: Selector,
    link: Selector,
    attr: String,
    blocked: Selector,
    restricted: Selector,
}

impl HtmlRowExtractor {
    /// Compiles the row selectors
    pub fn new(config: &RowConfig) -> Result<Self, BlockedError> {
        Ok(Self {
            container: parse_selector(&config.container)?,
            link: parse_selector(&config.link)?,
            attr: config.attr.clone(),
            blocked: parse_selector(&config.blocked)?,
            restricted: parse_selector(&config.restricted)?,
        })
    }

    fn extract_row(&self, row: ElementRef<'_>) -> Option<RawRecord> {
        let value = row
            .select(&self.link)
            .next()
            .and_then(|element| element.value().attr(&self.attr))
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        let blocked = cell_percent(row, &self.blocked);
        let restricted = cell_percent(row, &self.restricted);

        Some(RawRecord::new(value, resolve_percent(blocked, restricted)))
    }
}

impl RowExtractor for HtmlRowExtractor {
    fn extract(&self, body: &str) -> Result<Vec<RawRecord>, ExtractError> {
        if body.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let document = Html::parse_document(body);
        let mut records = Vec::new();

        for row in document.select(&self.container) {
            match self.extract_row(row) {
                Some(record) => records.push(record),
                None => tracing::trace!("Skipping row without a link"),
            }
        }

        Ok(records)
    }
}

/// Reads the last page index out of the paging control
#[derive(Debug)]
pub struct PagerExtractor {
    container: Selector,
    link: Selector,
    attr: String,
    splitter: String,
}

impl PagerExtractor {
    /// Compiles the pager selectors
    pub fn new(config: &PagerConfig) -> Result<Self, BlockedError> {
        Ok(Self {
            container: parse_selector(&config.container)?,
            link: parse_selector(&config.link)?,
            attr: config.attr.clone(),
            splitter: config.splitter.clone(),
        })
    }

    /// Returns the index of the last page, if the paging control has one
    ///
    /// The link attribute is split on the configured splitter; it must yield
    /// exactly two parts, the second being the page number.
    ///
    /// # Example
    ///
    /// ```
    /// use blocked_domains::config::PagerConfig;
    /// use blocked_domains::crawler::PagerExtractor;
    ///
    /// let pager = PagerExtractor::new(&PagerConfig {
    ///     container: "ul.pager".to_string(),
    ///     link: "li.last a".to_string(),
    ///     attr: "href".to_string(),
    ///     splitter: "?page=".to_string(),
    /// })
    /// .unwrap();
    ///
    /// let html = r#"<ul class="pager"><li class="last"><a href="/search/blocked?page=41">last</a></li></ul>"#;
    /// assert_eq!(pager.last_page(html), Some(41));
    /// ```
    pub fn last_page(&self, body: &str) -> Option<u32> {
        let document = Html::parse_document(body);

        for container in document.select(&self.container) {
            let Some(href) = container
                .select(&self.link)
                .next()
                .and_then(|element| element.value().attr(&self.attr))
            else {
                tracing::debug!("Paging control has no '{}' link attribute", self.attr);
                continue;
            };

            let parts: Vec<&str> = href.split(self.splitter.as_str()).collect();
            if parts.len() != 2 {
                tracing::debug!("Cannot split '{}' on '{}'", href, self.splitter);
                continue;
            }

            match parts[1].trim().parse::<u32>() {
                Ok(page) => return Some(page),
                Err(_) => tracing::debug!("'{}' is not a page number", parts[1]),
            }
        }

        None
    }
}

/// Picks the row percent from its two cells, the restricted cell winning ties
pub fn resolve_percent(blocked: Option<u32>, restricted: Option<u32>) -> u32 {
    restricted.or(blocked).unwrap_or(0)
}

/// Parses a percentage cell such as `"85%"`
///
/// Returns `None` for an empty cell and `Some(0)` for text that is not a number.
///
/// # Examples
///
/// ```
/// use blocked_domains::crawler::parse_percent;
///
/// assert_eq!(parse_percent(" 85% "), Some(85));
/// assert_eq!(parse_percent("100"), Some(100));
/// assert_eq!(parse_percent("n/a"), Some(0));
/// assert_eq!(parse_percent("  "), None);
/// ```
pub fn parse_percent(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let number = text.strip_suffix('%').unwrap_or(text).trim();
    Some(number.parse().unwrap_or(0))
}

fn cell_percent(row: ElementRef<'_>, selector: &Selector) -> Option<u32> {
    let cell = row.select(selector).next()?;
    parse_percent(&cell.text().collect::<String>())
}

fn parse_selector(selector: &str) -> Result<Selector, BlockedError> {
    Selector::parse(selector).map_err(|_| BlockedError::Selector(selector.to_string()))
}
