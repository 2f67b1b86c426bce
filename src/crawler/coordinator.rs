//! Crawler coordinator - main run orchestration logic
//!
//! A run goes through three phases:
//! - Probe: every enabled target is fetched once to read its last page; the
//!   probes run concurrently and any failure aborts the run
//! - Crawl: page jobs are fanned out over the scheduler while the aggregator
//!   drains the record stream
//! - Publish: the candidate set is partitioned, deduplicated and written

use crate::aggregate::ResultAggregator;
use crate::config::Config;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::parser::{HtmlRowExtractor, PagerExtractor, RowExtractor};
use crate::crawler::scheduler::{panic_message, CrawlHandle, CrawlScheduler, SchedulerConfig};
use crate::crawler::target::{CrawlTarget, PageJob, ResolvedTarget};
use crate::dedupe::dedupe_with_report;
use crate::output::{write_lines, OutputFiles, RunSummary, TargetSummary};
use crate::{BlockedError, Result};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Main run coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: Option<String>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn RowExtractor>,
    pager: Arc<PagerExtractor>,
    aggregator: ResultAggregator,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Selectors, patterns and the HTTP client are ready
    /// * `Err(BlockedError)` - A selector or pattern does not compile, or the
    ///   client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config.crawler)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator with a caller-supplied fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let extractor = HtmlRowExtractor::new(&config.rows)?;
        let pager = PagerExtractor::new(&config.pager)?;
        let aggregator = ResultAggregator::from_config(&config.filter)?;

        Ok(Self {
            config: Arc::new(config),
            config_hash: None,
            fetcher,
            extractor: Arc::new(extractor),
            pager: Arc::new(pager),
            aggregator,
        })
    }

    /// Attaches the configuration hash reported in the run summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Probes every enabled target and fixes its page range
    ///
    /// Targets are returned in configuration order. The first failing target
    /// (in that order) aborts the whole phase.
    pub async fn resolve_targets(&self) -> Result<Vec<ResolvedTarget>> {
        let mut probes = JoinSet::new();
        let mut expected = 0;

        for (index, target) in CrawlTarget::from_config(&self.config)
            .into_iter()
            .enumerate()
        {
            if !target.enabled {
                tracing::info!("Skipping disabled target '{}'", target.name);
                continue;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let pager = Arc::clone(&self.pager);
            let name = target.name.clone();
            probes.spawn(async move {
                let result = AssertUnwindSafe(probe(target, fetcher, pager))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(BlockedError::Probe {
                            target: name,
                            reason: format!("task panicked: {}", panic_message(payload.as_ref())),
                        })
                    });
                (index, result)
            });
            expected += 1;
        }

        let mut results = Vec::with_capacity(expected);
        while let Some(joined) = probes.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|(index, _)| *index);

        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Expands resolved targets into page jobs, target by target
    pub fn plan_jobs(&self, targets: &[ResolvedTarget]) -> Result<Vec<PageJob>> {
        let mut jobs = Vec::with_capacity(targets.iter().map(ResolvedTarget::page_count).sum());
        for target in targets {
            jobs.extend(target.jobs()?);
        }
        Ok(jobs)
    }

    /// Runs the full pipeline
    ///
    /// Pre-crawl failures (probe, page range, output files) abort the run.
    /// Failing pages do not: they are dropped and counted in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::start(self.config_hash.clone());

        let targets = self.resolve_targets().await?;
        summary.targets = targets.iter().map(target_summary).collect();

        let jobs = self.plan_jobs(&targets)?;
        summary.jobs_total = jobs.len();

        let mut files = OutputFiles::create(&self.config.output)?;

        let scheduler = CrawlScheduler::new(SchedulerConfig::from_crawler_config(
            &self.config.crawler,
        ));
        tracing::info!(
            "Scheduling {} pages over {} targets (concurrency {}, {} attempts per page)",
            jobs.len(),
            targets.len(),
            scheduler.config().max_concurrency,
            scheduler.config().max_retries
        );

        let CrawlHandle {
            records,
            completion,
            ..
        } = scheduler.run(
            jobs,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
        );

        let (candidates, stats) = self.aggregator.aggregate(records, &mut files.raw).await?;
        let report = completion.await?;

        for failure in &report.failures {
            if let Err(reason) = &failure.result {
                tracing::debug!(
                    "Page {} of '{}' dropped: {}",
                    failure.job.page,
                    failure.job.target,
                    reason
                );
            }
        }

        let partition = self.aggregator.partition(&candidates);
        let deduped = dedupe_with_report(&partition.domains);

        let domains = write_lines(&mut files.domains, &deduped.kept)?;
        let ips = write_lines(&mut files.ips, &partition.ips)?;

        summary.jobs_succeeded = report.succeeded;
        summary.jobs_failed = report.failures.len();
        summary.records = stats.received;
        summary.candidates = candidates.len();
        summary.redundant = deduped.redundant.len();
        summary.rejected = deduped.rejected.len();
        summary.domains = domains;
        summary.ips = ips;
        summary.finish();
        summary.log();

        Ok(summary)
    }
}

/// Runs a complete crawl with the HTTP fetcher
///
/// This is the main entry point for a run. It will:
/// 1. Probe every enabled target for its last page
/// 2. Open the output files
/// 3. Crawl all pages with bounded concurrency
/// 4. Aggregate, partition and deduplicate the results
/// 5. Write the domain and IP lists
pub async fn run_crawl(config: Config, config_hash: Option<String>) -> Result<RunSummary> {
    let mut coordinator = Coordinator::new(config)?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }
    coordinator.run().await
}

/// Reads a target's last page and resolves its range
async fn probe(
    target: CrawlTarget,
    fetcher: Arc<dyn PageFetcher>,
    pager: Arc<PagerExtractor>,
) -> Result<ResolvedTarget> {
    let url = target.probe_url()?;
    tracing::debug!("Probing '{}' at {}", target.name, url);

    let body = fetcher
        .fetch(&url, &target.referer)
        .await
        .map_err(|e| BlockedError::Probe {
            target: target.name.clone(),
            reason: e.to_string(),
        })?;

    let max_page = pager.last_page(&body).ok_or_else(|| BlockedError::Probe {
        target: target.name.clone(),
        reason: format!("no last page link found at {}", url),
    })?;

    let resolved = target.resolve(max_page)?;
    tracing::info!(
        "'{}' has {} pages, crawling {}..={}",
        resolved.target.name,
        max_page + 1,
        resolved.pages.start(),
        resolved.pages.end()
    );

    Ok(resolved)
}

fn target_summary(resolved: &ResolvedTarget) -> TargetSummary {
    TargetSummary {
        name: resolved.target.name.clone(),
        from: *resolved.pages.start(),
        to: *resolved.pages.end(),
        max_page: resolved.max_page,
    }
}
