//! Output module for writing run results
//!
//! This module handles:
//! - The raw audit file of every crawled record
//! - The final domain and IP lists
//! - The run summary

mod sink;
pub mod stats;

pub use sink::{format_record, write_lines, FileSink, LineSink, OutputFiles, RecordSink};
pub use stats::{print_summary, RunSummary, TargetSummary};
