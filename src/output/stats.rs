//! Run summary
//!
//! Collects the counts and timings of one run and renders them at the end,
//! either to the log or to stdout.

use chrono::{DateTime, Utc};

/// Page range crawled for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSummary {
    pub name: String,
    pub from: u32,
    pub to: u32,
    pub max_page: u32,
}

impl TargetSummary {
    pub fn pages(&self) -> usize {
        (self.to - self.from) as usize + 1
    }
}

/// Summary of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// SHA-256 of the configuration file, when it was loaded from disk
    pub config_hash: Option<String>,

    pub targets: Vec<TargetSummary>,

    /// Page jobs scheduled
    pub jobs_total: usize,
    pub jobs_succeeded: usize,
    pub jobs_failed: usize,

    /// Records received by the aggregator
    pub records: usize,

    /// Distinct values that passed the filter
    pub candidates: usize,

    /// Domains removed because a parent domain covers them
    pub redundant: usize,

    /// Entries the dedupe pass could not split into labels
    pub rejected: usize,

    /// Domains written
    pub domains: usize,

    /// IP literals written
    pub ips: usize,
}

impl RunSummary {
    /// Starts a summary clocked at the current time
    pub fn start(config_hash: Option<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_hash,
            targets: Vec::new(),
            jobs_total: 0,
            jobs_succeeded: 0,
            jobs_failed: 0,
            records: 0,
            candidates: 0,
            redundant: 0,
            rejected: 0,
            domains: 0,
            ips: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of page jobs that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.jobs_total == 0 {
            return 100.0;
        }
        self.jobs_succeeded as f64 / self.jobs_total as f64 * 100.0
    }

    /// Emits the summary as `info` events
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} of {} pages ({:.1}%), {} records, {} candidates",
            self.jobs_succeeded,
            self.jobs_total,
            self.success_rate(),
            self.records,
            self.candidates
        );
        tracing::info!(
            "Wrote {} domains ({} redundant, {} rejected) and {} IPs",
            self.domains,
            self.redundant,
            self.rejected,
            self.ips
        );
        if self.jobs_failed > 0 {
            tracing::warn!("{} pages were dropped after failing", self.jobs_failed);
        }
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Started: {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
    if let Some(hash) = &summary.config_hash {
        println!("Config hash: {}", hash);
    }
    println!();

    if !summary.targets.is_empty() {
        println!("Targets:");
        for target in &summary.targets {
            println!(
                "  {}: pages {}..={} of {} ({} pages)",
                target.name,
                target.from,
                target.to,
                target.max_page,
                target.pages()
            );
        }
        println!();
    }

    println!("Crawl:");
    println!("  Pages scheduled: {}", summary.jobs_total);
    println!(
        "  Pages succeeded: {} ({:.1}%)",
        summary.jobs_succeeded,
        summary.success_rate()
    );
    println!("  Pages dropped: {}", summary.jobs_failed);
    println!("  Records: {}", summary.records);
    println!();

    println!("Output:");
    println!("  Candidates: {}", summary.candidates);
    println!("  Domains: {}", summary.domains);
    println!("  Redundant subdomains: {}", summary.redundant);
    if summary.rejected > 0 {
        println!("  Rejected entries: {}", summary.rejected);
    }
    println!("  IPs: {}", summary.ips);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_duration_after_finish() {
        let mut summary = RunSummary::start(None);
        assert_eq!(summary.duration_seconds(), None);

        summary.finish();
        summary.started_at = summary.finished_at.unwrap() - Duration::seconds(90);
        assert_eq!(summary.duration_seconds(), Some(90));
    }

    #[test]
    fn test_success_rate() {
        let mut summary = RunSummary::start(Some("abc".to_string()));
        assert_eq!(summary.success_rate(), 100.0);

        summary.jobs_total = 4;
        summary.jobs_succeeded = 3;
        summary.jobs_failed = 1;
        assert_eq!(summary.success_rate(), 75.0);
    }

    #[test]
    fn test_target_pages() {
        let target = TargetSummary {
            name: "blocked".to_string(),
            from: 2,
            to: 10,
            max_page: 40,
        };
        assert_eq!(target.pages(), 9);
    }
}
