//! Result aggregation
//!
//! The aggregator is the single consumer of the record stream. For each record it:
//! 1. Lower-cases the value
//! 2. Writes `value | percent` to the raw audit sink
//! 3. Keeps the value when the percentage reaches the threshold and the domain
//!    pattern matches, inserting the captured domain into the candidate set
//!
//! IP literals are separated from domains afterwards, over the aggregated set.

use crate::config::FilterConfig;
use crate::crawler::RawRecord;
use crate::output::RecordSink;
use crate::{ConfigError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use tokio::sync::mpsc;

/// Distinct kept values, ordered
pub type CandidateSet = BTreeSet<String>;

/// Counters of one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Records received from the stream
    pub received: usize,

    /// Records below the threshold
    pub below_threshold: usize,

    /// Records at or above the threshold the domain pattern did not match
    pub unmatched: usize,
}

/// Candidate set split into domain names and IP literals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Sorted values that are not IP literals
    pub domains: Vec<String>,

    /// Sorted, distinct IP literals
    pub ips: Vec<String>,
}

/// Threshold and pattern filter over crawled records
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    threshold: u32,
    domain_regex: Regex,
    domain_group: usize,
    ip_regex: Regex,
}

impl ResultAggregator {
    /// Creates an aggregator
    ///
    /// Without an explicit `domain_group`, the second-to-last capture group of
    /// `domain_regex` holds the domain. A pattern with a single group or none
    /// yields the whole match.
    pub fn new(
        threshold: u32,
        domain_regex: Regex,
        domain_group: Option<usize>,
        ip_regex: Regex,
    ) -> Self {
        let domain_group =
            domain_group.unwrap_or_else(|| domain_regex.captures_len().saturating_sub(2));

        Self {
            threshold,
            domain_regex,
            domain_group,
            ip_regex,
        }
    }

    /// Compiles the filter section of the configuration
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        Ok(Self::new(
            config.percent,
            compile(&config.domain_regex)?,
            config.domain_group,
            compile(&config.ip_regex)?,
        ))
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Index of the capture group holding the domain
    pub fn domain_group(&self) -> usize {
        self.domain_group
    }

    /// Drains the record stream into a candidate set
    ///
    /// Every record reaches `raw_sink`, kept or not. Returns once all senders
    /// are dropped; the raw sink is flushed before returning.
    pub async fn aggregate<S>(
        &self,
        mut records: mpsc::Receiver<RawRecord>,
        raw_sink: &mut S,
    ) -> Result<(CandidateSet, AggregateStats)>
    where
        S: RecordSink + ?Sized,
    {
        let mut candidates = CandidateSet::new();
        let mut stats = AggregateStats::default();

        while let Some(record) = records.recv().await {
            stats.received += 1;
            match self.ingest(&record, raw_sink)? {
                Ingested::Kept(value) => {
                    candidates.insert(value);
                }
                Ingested::BelowThreshold => stats.below_threshold += 1,
                Ingested::Unmatched => stats.unmatched += 1,
            }
        }

        raw_sink.finish()?;

        tracing::info!(
            "Aggregated {} records into {} candidates ({} below {}%, {} unmatched)",
            stats.received,
            candidates.len(),
            stats.below_threshold,
            self.threshold,
            stats.unmatched
        );

        Ok((candidates, stats))
    }

    /// Processes one record
    pub fn ingest<S>(&self, record: &RawRecord, raw_sink: &mut S) -> Result<Ingested>
    where
        S: RecordSink + ?Sized,
    {
        let value = record.value.to_lowercase();
        raw_sink.write_record(&value, record.percent)?;

        if record.percent < self.threshold {
            return Ok(Ingested::BelowThreshold);
        }

        match self.extract_domain(&value) {
            Some(domain) => Ok(Ingested::Kept(domain)),
            None => {
                tracing::trace!("'{}' does not match the domain pattern", value);
                Ok(Ingested::Unmatched)
            }
        }
    }

    /// Applies the domain pattern to an already lower-cased value
    pub fn extract_domain(&self, value: &str) -> Option<String> {
        let captures = self.domain_regex.captures(value)?;
        // A selected group that did not participate yields no domain.
        let domain = captures.get(self.domain_group)?.as_str();

        if domain.is_empty() {
            None
        } else {
            Some(domain.to_string())
        }
    }

    /// Splits the candidates into domains and IP literals, both sorted
    ///
    /// A value in which the IP pattern finds a match contributes the matched
    /// text to the IP list and is left out of the domain list.
    pub fn partition(&self, candidates: &CandidateSet) -> Partition {
        let mut ips = BTreeSet::new();
        let mut domains = Vec::with_capacity(candidates.len());

        for value in candidates {
            match self.ip_regex.find(value) {
                Some(ip) => {
                    ips.insert(ip.as_str().to_string());
                }
                None => domains.push(value.clone()),
            }
        }

        // BTreeSet iteration already yields sorted values.
        Partition {
            domains,
            ips: ips.into_iter().collect(),
        }
    }
}

/// What became of one ingested record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Kept; carries the extracted domain
    Kept(String),
    BelowThreshold,
    Unmatched,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)).into())
}
