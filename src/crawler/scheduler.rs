//! Bounded-concurrency crawl scheduler
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Per-job retry with an attempt budget
//! - Isolation of panics at the task boundary
//! - Counted completion: the run ends after exactly one outcome per job
//!
//! Records flow to the consumer over a bounded channel, so a slow consumer
//! applies backpressure to the crawl tasks. Records of different pages arrive in
//! no particular order.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::{ExtractError, RawRecord, RowExtractor};
use crate::crawler::target::PageJob;
use crate::state::JobState;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// Completed jobs between two progress log lines
const PROGRESS_INTERVAL: usize = 50;

/// Scheduler tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of jobs in flight
    pub max_concurrency: usize,

    /// Attempts per job, including the first one
    pub max_retries: u32,

    /// Pause before each retry
    pub retry_delay: Duration,

    /// Capacity of the record channel
    pub channel_capacity: usize,
}

impl SchedulerConfig {
    /// Derives scheduler settings from the crawler configuration
    pub fn from_crawler_config(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrency: config.effective_concurrency(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            channel_capacity: config.channel_capacity,
        }
    }
}

/// Why a job produced no records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    #[error("gave up after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("record stream closed before all records were delivered")]
    StreamClosed,

    #[error("worker pool closed before the job could start")]
    NotScheduled,
}

/// Terminal result of one job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: PageJob,

    /// Number of records delivered, or the reason the job failed
    pub result: Result<usize, JobFailure>,
}

/// Totals of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Number of jobs handed to the scheduler
    pub total: usize,

    /// Jobs that delivered their records
    pub succeeded: usize,

    /// Records delivered over all jobs
    pub records: usize,

    /// Outcomes of every failed job
    pub failures: Vec<JobOutcome>,
}

impl CrawlReport {
    /// Number of jobs that reached a terminal state
    pub fn completed(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    fn record(&mut self, outcome: JobOutcome) {
        match outcome.result {
            Ok(count) => {
                self.succeeded += 1;
                self.records += count;
            }
            Err(_) => self.failures.push(outcome),
        }
    }
}

/// Live handle on a running crawl
pub struct CrawlHandle {
    /// Record stream; closes once every job has completed
    pub records: mpsc::Receiver<RawRecord>,

    /// Resolves to the report after the last completion
    pub completion: JoinHandle<CrawlReport>,

    completed: Arc<AtomicUsize>,
}

impl CrawlHandle {
    /// Number of jobs of this run that reached a terminal state
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

/// Collaborators and limits shared by all tasks of a run
struct JobContext {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn RowExtractor>,
    max_retries: u32,
    retry_delay: Duration,
    /// Completions of every run of the scheduler
    scheduler_completed: Arc<AtomicUsize>,
    /// Completions of this run
    run_completed: Arc<AtomicUsize>,
    total: usize,
}

/// Error of a single attempt
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Scheduler for fanning page jobs out over a bounded pool of tasks
///
/// The scheduler owns its semaphore and completion counter; nothing is kept in
/// process-wide state.
pub struct CrawlScheduler {
    config: SchedulerConfig,
    semaphore: Arc<Semaphore>,
    completed: Arc<AtomicUsize>,
}

impl CrawlScheduler {
    /// Creates a scheduler; concurrency, retries and capacity are at least 1
    pub fn new(mut config: SchedulerConfig) -> Self {
        config.max_concurrency = config.max_concurrency.max(1);
        config.max_retries = config.max_retries.max(1);
        config.channel_capacity = config.channel_capacity.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            completed: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Returns the effective settings
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of jobs completed so far, over all runs of this scheduler
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Starts crawling `jobs` in the background
    ///
    /// Every job is attempted up to `max_retries` times. A job that keeps
    /// failing, or panics, is logged and dropped without affecting the others.
    /// The record stream closes after exactly `jobs.len()` completions.
    pub fn run(
        &self,
        jobs: Vec<PageJob>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn RowExtractor>,
    ) -> CrawlHandle {
        let (record_tx, record_rx) = mpsc::channel(self.config.channel_capacity);
        let run_completed = Arc::new(AtomicUsize::new(0));

        let context = Arc::new(JobContext {
            fetcher,
            extractor,
            max_retries: self.config.max_retries,
            retry_delay: self.config.retry_delay,
            scheduler_completed: Arc::clone(&self.completed),
            run_completed: Arc::clone(&run_completed),
            total: jobs.len(),
        });

        let completion = tokio::spawn(dispatch(
            jobs,
            Arc::clone(&self.semaphore),
            context,
            record_tx,
        ));

        CrawlHandle {
            records: record_rx,
            completion,
            completed: run_completed,
        }
    }
}

/// Spawns one task per job as permits free up, then counts completions
async fn dispatch(
    jobs: Vec<PageJob>,
    semaphore: Arc<Semaphore>,
    context: Arc<JobContext>,
    record_tx: mpsc::Sender<RawRecord>,
) -> CrawlReport {
    let total = jobs.len();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    tracing::info!(
        "Crawling {} pages with {} workers",
        total,
        semaphore.available_permits()
    );

    for job in jobs {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!("Worker pool closed, dropping {}", job.url);
                context.run_completed.fetch_add(1, Ordering::Relaxed);
                context.scheduler_completed.fetch_add(1, Ordering::Relaxed);
                let _ = done_tx.send(JobOutcome {
                    job,
                    result: Err(JobFailure::NotScheduled),
                });
                continue;
            }
        };

        tokio::spawn(run_job(
            job,
            permit,
            Arc::clone(&context),
            record_tx.clone(),
            done_tx.clone(),
        ));
    }
    drop(done_tx);

    let mut report = CrawlReport {
        total,
        ..CrawlReport::default()
    };

    while report.completed() < total {
        match done_rx.recv().await {
            Some(outcome) => report.record(outcome),
            None => {
                tracing::error!(
                    "Completion channel closed after {} of {} jobs",
                    report.completed(),
                    total
                );
                break;
            }
        }
    }

    // Closing our sender ends the record stream once the tasks' clones are gone.
    drop(record_tx);

    tracing::info!(
        "Crawl finished: {} of {} pages succeeded, {} failed, {} records",
        report.succeeded,
        total,
        report.failures.len(),
        report.records
    );

    report
}

/// Task body: runs one job under the permit and always signals completion
async fn run_job(
    job: PageJob,
    permit: OwnedSemaphorePermit,
    context: Arc<JobContext>,
    record_tx: mpsc::Sender<RawRecord>,
    done_tx: mpsc::UnboundedSender<JobOutcome>,
) {
    let _permit = permit;

    let result = AssertUnwindSafe(process_job(&job, &context, &record_tx))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(JobFailure::Panicked(panic_message(payload.as_ref()))));

    match &result {
        Ok(count) => tracing::debug!("{} yielded {} records", job.url, count),
        Err(JobFailure::Panicked(message)) => {
            tracing::error!("Task panicked while crawling {}: {}", job.url, message)
        }
        Err(e) => tracing::warn!("Dropping {}: {}", job.url, e),
    }

    context.scheduler_completed.fetch_add(1, Ordering::Relaxed);
    let completed = context.run_completed.fetch_add(1, Ordering::Relaxed) + 1;
    if completed % PROGRESS_INTERVAL == 0 {
        tracing::info!("Progress: {} of {} pages done", completed, context.total);
    }

    let _ = done_tx.send(JobOutcome { job, result });
}

/// Attempts a job until it succeeds or the retry budget is spent
async fn process_job(
    job: &PageJob,
    context: &JobContext,
    record_tx: &mpsc::Sender<RawRecord>,
) -> Result<usize, JobFailure> {
    let mut state = JobState::Pending.begin();
    let mut last_error = None;
    let mut records = Vec::new();

    while let Some(attempt) = state.attempt() {
        if attempt > 1 {
            tracing::warn!(
                "Attempt {} of {} for {}",
                attempt,
                context.max_retries,
                job.url
            );
            if !context.retry_delay.is_zero() {
                tokio::time::sleep(context.retry_delay).await;
            }
        } else {
            tracing::debug!("Crawling {}", job.url);
        }

        match attempt_once(job, context).await {
            Ok(found) => {
                records = found;
                state = state.succeed();
            }
            Err(e) => {
                tracing::debug!("Attempt {} for {} failed: {}", attempt, job.url, e);
                last_error = Some(e);
                state = state.fail(context.max_retries);
            }
        }
    }

    if state != JobState::Succeeded {
        return Err(JobFailure::Exhausted {
            attempts: context.max_retries,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        });
    }

    let count = records.len();
    for record in records {
        record_tx
            .send(record)
            .await
            .map_err(|_| JobFailure::StreamClosed)?;
    }

    Ok(count)
}

/// One fetch + extract; shares no state with other attempts
async fn attempt_once(
    job: &PageJob,
    context: &JobContext,
) -> Result<Vec<RawRecord>, AttemptError> {
    let body = context.fetcher.fetch(&job.url, &job.referer).await?;
    Ok(context.extractor.extract(&body)?)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
