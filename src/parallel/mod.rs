//! Concurrent task distribution over a bounded worker pool

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::{Config, DispatchStrategy};
use crate::error::{Result, BlurBatchError};
use crate::processing::{BlurTransform, ImageTransform, ImageWorker};

pub mod progress;
pub mod task;

pub use progress::*;
pub use task::*;

/// Builds tasks, runs them on a bounded pool and tallies the outcomes.
///
/// Every submitted task reaches a terminal outcome unless a task returns a
/// fatal error, in which case the batch stops and that error is returned.
pub struct Dispatcher<T: ImageTransform + 'static> {
    worker: Arc<ImageWorker<T>>,
    max_concurrent: usize,
    strategy: DispatchStrategy,
    progress_tracker: Arc<ProgressTracker>,
}

impl<T: ImageTransform + 'static> Dispatcher<T> {
    /// Create a dispatcher; `max_concurrent` defaults to the number of logical CPUs
    pub fn new(worker: ImageWorker<T>, max_concurrent: Option<usize>) -> Self {
        let max_concurrent = max_concurrent.unwrap_or_else(num_cpus::get).max(1);

        debug!("Initializing dispatcher with {} concurrent workers", max_concurrent);

        Self {
            worker: Arc::new(worker),
            max_concurrent,
            strategy: DispatchStrategy::Threads,
            progress_tracker: Arc::new(ProgressTracker::new()),
        }
    }

    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_progress(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.progress_tracker = tracker;
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress_tracker
    }

    /// Process every path and block until the batch completes.
    ///
    /// With [`DispatchStrategy::Async`] this creates its own runtime; from
    /// async code call [`Dispatcher::dispatch_async`] instead.
    pub fn dispatch(&self, paths: Vec<PathBuf>) -> Result<BatchReport> {
        match self.strategy {
            DispatchStrategy::Threads => {
                let start_time = Instant::now();
                let tasks = self.begin(paths);
                let total = tasks.len();
                let outcomes = self.run_threads(tasks)?;
                Ok(self.finish(&outcomes, total, start_time))
            }
            DispatchStrategy::Async => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .max_blocking_threads(self.max_concurrent)
                    .thread_name("blurbatch-runtime")
                    .build()
                    .map_err(|e| BlurBatchError::system(format!("Failed to start runtime: {}", e)))?;
                runtime.block_on(self.dispatch_async(paths))
            }
        }
    }

    /// Async variant: blocking work on tokio's blocking pool, bounded by a semaphore
    pub async fn dispatch_async(&self, paths: Vec<PathBuf>) -> Result<BatchReport> {
        let start_time = Instant::now();
        let tasks = self.begin(paths);
        let total = tasks.len();
        let outcomes = self.run_async(tasks).await?;
        Ok(self.finish(&outcomes, total, start_time))
    }

    fn begin(&self, paths: Vec<PathBuf>) -> Vec<Task> {
        let tasks = build_tasks(paths);

        info!(
            "Starting processing of {} images on {} workers ({:?})",
            tasks.len(),
            self.max_concurrent,
            self.strategy
        );
        self.progress_tracker.start(tasks.len() as u64);

        tasks
    }

    fn finish(&self, outcomes: &[Outcome], total: usize, start_time: Instant) -> BatchReport {
        debug_assert_eq!(outcomes.len(), total);

        self.progress_tracker.complete_batch();

        BatchReport {
            succeeded: sum_outcomes(outcomes),
            total,
            elapsed: start_time.elapsed(),
        }
    }

    /// Dedicated rayon pool; collection short-circuits on the first fatal error
    fn run_threads(&self, tasks: Vec<Task>) -> Result<Vec<Outcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrent)
            .thread_name(|index| format!("blurbatch-worker-{}", index))
            .build()
            .map_err(|e| BlurBatchError::parallel(format!("Failed to build worker pool: {}", e)))?;

        pool.install(|| {
            tasks
                .par_iter()
                .map(|task| run_task(&self.worker, &self.progress_tracker, task))
                .collect()
        })
    }

    async fn run_async(&self, tasks: Vec<Task>) -> Result<Vec<Outcome>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let pending = tasks.into_iter().map(|task| {
            let worker = Arc::clone(&self.worker);
            let progress_tracker = Arc::clone(&self.progress_tracker);
            let semaphore = Arc::clone(&semaphore);

            async move {
                // A closed semaphore means another task failed fatally
                let Ok(_permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    return Ok(None);
                };

                let result = tokio::task::spawn_blocking(move || {
                    run_task(&worker, &progress_tracker, &task)
                })
                .await
                .unwrap_or_else(|e| Err(BlurBatchError::parallel(format!("Task join error: {}", e))));

                if result.is_err() {
                    semaphore.close();
                }

                result.map(Some)
            }
        });

        let mut outcomes = Vec::new();
        for result in futures::future::join_all(pending).await {
            if let Some(outcome) = result? {
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }
}

impl Dispatcher<BlurTransform> {
    /// Build the default blur dispatcher from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(ImageWorker::from_config(config), Some(config.worker_count()))
            .with_strategy(config.processing.strategy)
    }
}

fn run_task<T: ImageTransform>(
    worker: &ImageWorker<T>,
    progress_tracker: &ProgressTracker,
    task: &Task,
) -> Result<Outcome> {
    // A panicking worker is fatal for the batch, like any other non-I/O fault
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.process(task)))
        .map_err(|payload| {
            BlurBatchError::parallel(format!(
                "Worker {} panicked processing {}: {}",
                task.worker_id,
                task.path.display(),
                panic_message(payload.as_ref())
            ))
        })??;

    progress_tracker.complete_task(task, outcome);
    Ok(outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Aggregate result of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub total: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// `"<succeeded>/<total> images processed correctly"`
    pub fn summary_line(&self) -> String {
        format!("{}/{} images processed correctly", self.succeeded, self.total)
    }
}

fn serialize_secs<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
