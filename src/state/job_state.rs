/// Job state definitions for tracking crawl progress
///
/// Every page job walks `Pending → Attempting(1) → … → Attempting(n)` and ends in
/// exactly one of the terminal states `Succeeded` or `Exhausted`.
use std::fmt;
use thiserror::Error;

/// Represents the current state of a page job inside the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Job has been created but no attempt has started
    Pending,

    /// Attempt number `n` (1-based) is in progress
    Attempting(u32),

    /// An attempt fetched and parsed the page
    Succeeded,

    /// Every attempt of the retry budget failed
    Exhausted,
}

/// Raised when a state change does not follow the job state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

impl JobState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }

    /// Returns the number of the attempt in progress, if any
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Attempting(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match (*self, next) {
            (Self::Pending, Self::Attempting(1)) => true,
            (Self::Attempting(_), Self::Succeeded | Self::Exhausted) => true,
            (Self::Attempting(n), Self::Attempting(m)) => m == n + 1,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(self, next: JobState) -> Result<JobState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Starts the first attempt of a pending job
    pub fn begin(self) -> JobState {
        self.transition(Self::Attempting(1)).unwrap_or(self)
    }

    /// Records a successful attempt
    pub fn succeed(self) -> JobState {
        self.transition(Self::Succeeded).unwrap_or(self)
    }

    /// Records a failed attempt
    ///
    /// Moves to the next attempt while the retry budget `max_attempts` allows it,
    /// otherwise to `Exhausted`.
    pub fn fail(self, max_attempts: u32) -> JobState {
        let next = match self {
            Self::Attempting(n) if n < max_attempts => Self::Attempting(n + 1),
            _ => Self::Exhausted,
        };
        self.transition(next).unwrap_or(self)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Attempting(n) => write!(f, "attempting({})", n),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}
