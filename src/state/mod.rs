//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `JobState`: Tracks the state of individual page jobs (pending, attempting, succeeded, exhausted)

mod job_state;

pub use job_state::{InvalidTransition, JobState};
