//! Progress tracking for parallel operations

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use indicatif::ProgressBar;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::parallel::task::{Outcome, Task};

/// Thread-safe progress tracker shared by all workers of a batch
pub struct ProgressTracker {
    sender: broadcast::Sender<ProgressUpdate>,
    start_time: Mutex<Option<Instant>>,
    bar: Option<ProgressBar>,

    total: AtomicU64,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Snapshot of batch progress
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub total_files: u64,
    pub completed_files: usize,
    pub failed_files: usize,
    pub elapsed_time: Duration,
    pub completion_percentage: f64,
}

/// Progress update event
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Started {
        total_files: u64,
    },
    TaskCompleted {
        worker_id: usize,
        path: PathBuf,
        success: bool,
    },
    BatchCompleted {
        final_state: ProgressState,
    },
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);

        Self {
            sender,
            start_time: Mutex::new(None),
            bar: None,
            total: AtomicU64::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Create a tracker that also drives a terminal progress bar
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar: Some(bar),
            ..Self::new()
        }
    }

    /// Reset counters for a new batch
    pub fn start(&self, total_files: u64) {
        *self.start_time.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());

        self.total.store(total_files, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);

        if let Some(bar) = &self.bar {
            bar.set_length(total_files);
            bar.set_position(0);
        }

        let _ = self.sender.send(ProgressUpdate::Started { total_files });

        debug!("Started progress tracking for {} files", total_files);
    }

    /// Record the terminal outcome of a task
    pub fn complete_task(&self, task: &Task, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded => self.completed.fetch_add(1, Ordering::Relaxed),
            Outcome::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
        };

        if let Some(bar) = &self.bar {
            bar.inc(1);
        }

        let _ = self.sender.send(ProgressUpdate::TaskCompleted {
            worker_id: task.worker_id,
            path: task.path.clone(),
            success: outcome.is_success(),
        });
    }

    /// Get current progress state
    pub fn get_state(&self) -> ProgressState {
        let elapsed_time = self
            .start_time
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map(|start| start.elapsed())
            .unwrap_or_default();

        let total_files = self.total.load(Ordering::Relaxed);
        let completed_files = self.completed.load(Ordering::Relaxed);
        let failed_files = self.failed.load(Ordering::Relaxed);

        let completion_percentage = if total_files > 0 {
            ((completed_files + failed_files) as f64 / total_files as f64) * 100.0
        } else {
            100.0
        };

        ProgressState {
            total_files,
            completed_files,
            failed_files,
            elapsed_time,
            completion_percentage,
        }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }

    /// Mark batch as completed
    pub fn complete_batch(&self) {
        let final_state = self.get_state();

        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }

        info!(
            "Batch completed: {}/{} files successful in {:.2}s",
            final_state.completed_files,
            final_state.total_files,
            final_state.elapsed_time.as_secs_f64()
        );

        let _ = self.sender.send(ProgressUpdate::BatchCompleted { final_state });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    /// Get human-readable completion status
    pub fn status_text(&self) -> String {
        let processed = self.completed_files + self.failed_files;
        if processed as u64 >= self.total_files {
            "Completed".to_string()
        } else {
            format!("{}/{} files processed", processed, self.total_files)
        }
    }
}
