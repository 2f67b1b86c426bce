//! Redundant subdomain elimination
//!
//! Given a flat list of domains, removes every domain that is a subdomain of
//! another domain in the list and returns the minimal covering set, sorted.
//!
//! The domains are split into labels, reversed (TLD first) and inserted into a
//! [`LabelTrie`] in ascending label count. Inserting shorter domains first means a
//! parent is always marked terminal before any of its subdomains is walked, so
//! the result does not depend on the order of the input.
//!
//! # Example
//!
//! ```
//! use blocked_domains::dedupe::dedupe;
//!
//! let domains = ["b.a.com", "a.com", "c.com"].map(String::from);
//! assert_eq!(dedupe(&domains), vec!["a.com", "c.com"]);
//! ```

mod trie;

pub use trie::{Insertion, LabelTrie};

use crate::url::reversed_labels;
use thiserror::Error;

/// Reasons a domain cannot enter the trie
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DedupeError {
    #[error("empty domain")]
    Empty,

    #[error("domain '{0}' contains an empty label")]
    EmptyLabel(String),
}

/// Detailed result of a dedupe pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeReport {
    /// Minimal covering set, lexicographically sorted
    pub kept: Vec<String>,

    /// Dropped domains with the domain that covers them
    pub redundant: Vec<(String, String)>,

    /// Entries that could not be split into labels
    pub rejected: Vec<(String, DedupeError)>,
}

/// Removes subsumed subdomains and returns the sorted minimal covering set
pub fn dedupe<S: AsRef<str>>(domains: &[S]) -> Vec<String> {
    dedupe_with_report(domains).kept
}

/// Like [`dedupe`], but also reports what was dropped and why
pub fn dedupe_with_report<S: AsRef<str>>(domains: &[S]) -> DedupeReport {
    let mut report = DedupeReport::default();
    let mut entries: Vec<(&str, Vec<&str>)> = Vec::with_capacity(domains.len());

    for domain in domains {
        let domain = domain.as_ref();
        match split_domain(domain) {
            Ok(labels) => entries.push((domain, labels)),
            Err(e) => {
                tracing::warn!("Skipping domain during redundancy check: {}", e);
                report.rejected.push((domain.to_string(), e));
            }
        }
    }

    // Stable: equal-length domains keep their input order.
    entries.sort_by_key(|(_, labels)| labels.len());

    let mut trie = LabelTrie::new();
    for (domain, labels) in entries {
        match trie.insert(&labels) {
            Insertion::Accepted => report.kept.push(domain.to_string()),
            Insertion::Covered { depth } => {
                let parent = covering_domain(&labels[..depth]);
                tracing::debug!("Found redundant domain: {} @ {}", domain, parent);
                report.redundant.push((domain.to_string(), parent));
            }
            Insertion::Duplicate => {
                tracing::trace!("Dropping duplicate domain: {}", domain);
                report.redundant.push((domain.to_string(), domain.to_string()));
            }
        }
    }

    report.kept.sort();
    report
}

fn split_domain(domain: &str) -> Result<Vec<&str>, DedupeError> {
    if domain.is_empty() {
        return Err(DedupeError::Empty);
    }
    reversed_labels(domain).ok_or_else(|| DedupeError::EmptyLabel(domain.to_string()))
}

/// Rebuilds the dotted form of a TLD-first label prefix
fn covering_domain(reversed: &[&str]) -> String {
    reversed.iter().rev().copied().collect::<Vec<_>>().join(".")
}
