//! Crawl targets and page jobs
//!
//! A target is one listing of the site (for example "blocked" or "domains").
//! Its page range is only known after a probe request reads the last page from
//! the paging control; the resolved target then expands into one immutable
//! `PageJob` per page.

use crate::config::Config;
use crate::url::{compose_url, page_url};
use crate::BlockedError;
use std::ops::RangeInclusive;

/// One crawl source, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub name: String,
    pub base_url: String,
    pub path: String,
    pub probe_suffix: String,
    pub page_suffix: String,
    pub referer: String,
    pub enabled: bool,
    pub from: u32,
    pub to: Option<u32>,
}

impl CrawlTarget {
    /// Builds every configured target, in configuration order
    pub fn from_config(config: &Config) -> Vec<CrawlTarget> {
        config
            .targets
            .iter()
            .map(|entry| CrawlTarget {
                name: entry.name.clone(),
                base_url: config.site.base_url.clone(),
                path: entry.path.clone(),
                probe_suffix: config.site.probe_suffix.clone(),
                page_suffix: config.site.page_suffix.clone(),
                referer: entry.referer.clone(),
                enabled: entry.enabled,
                from: entry.from,
                to: entry.to,
            })
            .collect()
    }

    /// URL of the page whose paging control reveals the last page
    pub fn probe_url(&self) -> Result<String, BlockedError> {
        compose_url(&self.base_url, &self.path, &self.probe_suffix).map_err(|e| {
            BlockedError::Probe {
                target: self.name.clone(),
                reason: format!("invalid probe URL: {}", e),
            }
        })
    }

    /// Fixes the page range once the last page index is known
    ///
    /// An omitted `to` means "up to the last page". The range is rejected when
    /// `from` or `to` lies past the last page or `from > to`.
    pub fn resolve(self, max_page: u32) -> Result<ResolvedTarget, BlockedError> {
        let to = self.to.unwrap_or(max_page);

        if self.from > max_page || to > max_page || self.from > to {
            return Err(BlockedError::InvalidPageRange {
                target: self.name,
                from: self.from,
                to,
                max_page,
            });
        }

        let pages = self.from..=to;
        Ok(ResolvedTarget {
            target: self,
            max_page,
            pages,
        })
    }
}

/// A target whose page range is known; immutable from here on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: CrawlTarget,
    pub max_page: u32,
    pub pages: RangeInclusive<u32>,
}

impl ResolvedTarget {
    /// Number of pages that will be crawled
    pub fn page_count(&self) -> usize {
        (self.pages.end() - self.pages.start()) as usize + 1
    }

    /// Expands the range into one job per page
    pub fn jobs(&self) -> Result<Vec<PageJob>, BlockedError> {
        let target = &self.target;
        self.pages
            .clone()
            .map(|page| {
                let url = page_url(&target.base_url, &target.path, &target.page_suffix, page)
                    .map_err(|e| BlockedError::Probe {
                        target: target.name.clone(),
                        reason: format!("invalid page URL: {}", e),
                    })?;
                Ok(PageJob {
                    url,
                    referer: target.referer.clone(),
                    target: target.name.clone(),
                    page,
                })
            })
            .collect()
    }
}

/// One page to fetch; consumed exactly once by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageJob {
    pub url: String,
    pub referer: String,
    /// Name of the target this page belongs to
    pub target: String,
    pub page: u32,
}

impl PageJob {
    pub fn new(url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: referer.into(),
            target: String::new(),
            page: 0,
        }
    }
}
