//! Task scheduling
//!
//! Every copy runs as its own tokio task. A semaphore caps how many are in
//! flight at once; without a cap every task starts immediately. Tasks never
//! share state beyond the reporter and the atomic statistics.

use crate::config::Concurrency;
use crate::error::{FlattenError, Result};
use crate::fs::{CopyStats, FileCopier};
use crate::progress::ProgressReporter;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upper bound on a single retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// A single copy task
#[derive(Debug, Clone)]
pub struct CopyTask {
    /// Unique task ID
    pub id: u64,
    /// Absolute source path
    pub source: PathBuf,
    /// Absolute destination path
    pub destination: PathBuf,
    /// Source size in bytes
    pub size: u64,
}

impl CopyTask {
    /// Create a new copy task
    pub fn new(id: u64, source: PathBuf, destination: PathBuf, size: u64) -> Self {
        Self {
            id,
            source,
            destination,
            size,
        }
    }
}

/// Result of a settled task
#[derive(Debug)]
pub struct TaskResult {
    /// The task that ran
    pub task: CopyTask,
    /// Success or failure
    pub result: Result<CopyStats>,
    /// Attempts made (1 when no retry happened)
    pub attempts: u32,
}

/// Task scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// In-flight task limit
    pub concurrency: Concurrency,
    /// Maximum retries per task for transient failures
    pub max_retries: u32,
    /// Base delay before the first retry
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Task scheduler statistics
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Total tasks submitted
    pub tasks_submitted: AtomicU64,
    /// Tasks completed successfully
    pub tasks_completed: AtomicU64,
    /// Tasks failed
    pub tasks_failed: AtomicU64,
    /// Tasks currently in progress
    pub tasks_in_progress: AtomicUsize,
    /// Highest number of tasks seen in progress at once
    pub peak_in_progress: AtomicUsize,
    /// Total bytes copied
    pub bytes_copied: AtomicU64,
}

impl SchedulerStats {
    /// Get completion percentage
    pub fn completion_percentage(&self) -> f64 {
        let settled = self.tasks_completed.load(Ordering::Relaxed)
            + self.tasks_failed.load(Ordering::Relaxed);
        let total = self.tasks_submitted.load(Ordering::Relaxed);

        if total == 0 {
            0.0
        } else {
            (settled as f64 / total as f64) * 100.0
        }
    }

    fn enter(&self) {
        let now = self.tasks_in_progress.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_progress.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self, result: &Result<CopyStats>) {
        match result {
            Ok(stats) => {
                self.tasks_completed.fetch_add(1, Ordering::Relaxed);
                self.bytes_copied.fetch_add(stats.bytes_copied, Ordering::Relaxed);
            }
            Err(_) => {
                self.tasks_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.tasks_in_progress.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs copy tasks on the current tokio runtime
pub struct TaskScheduler {
    /// Configuration
    config: SchedulerConfig,
    /// Copier shared by all tasks
    copier: FileCopier,
    /// Reporting sink
    reporter: Arc<ProgressReporter>,
    /// Statistics
    stats: Arc<SchedulerStats>,
}

impl TaskScheduler {
    /// Create a new task scheduler
    pub fn new(config: SchedulerConfig, copier: FileCopier, reporter: Arc<ProgressReporter>) -> Self {
        Self {
            config,
            copier,
            reporter,
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn every task and wait for all of them to settle.
    ///
    /// Results come back in submission order; completion order is
    /// unspecified. A failing task never affects its siblings.
    pub async fn run(&self, tasks: Vec<CopyTask>) -> Vec<TaskResult> {
        let semaphore = self
            .config
            .concurrency
            .limit()
            .map(|permits| Arc::new(Semaphore::new(permits)));

        self.stats
            .tasks_submitted
            .fetch_add(tasks.len() as u64, Ordering::Relaxed);

        let mut handles = Vec::with_capacity(tasks.len());
        let mut submitted = Vec::with_capacity(tasks.len());

        for task in tasks {
            let semaphore = semaphore.clone();
            let copier = self.copier.clone();
            let reporter = Arc::clone(&self.reporter);
            let stats = Arc::clone(&self.stats);
            let max_retries = self.config.max_retries;
            let retry_delay = self.config.retry_delay;
            submitted.push(task.clone());

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            let err = FlattenError::Runtime(format!("Semaphore error: {}", e));
                            reporter.copy_failed(&task.source, &task.destination, &err);
                            return (Err(err), 0);
                        }
                    },
                    None => None,
                };

                stats.enter();
                reporter.copy_started(&task.source, &task.destination);

                let (result, attempts) = copy_with_retry(
                    || copier.copy(&task.source, &task.destination, task.id),
                    &task.source,
                    &reporter,
                    max_retries,
                    retry_delay,
                )
                .await;

                match &result {
                    Ok(copy) => reporter.copy_finished(&task.source, &task.destination, copy.bytes_copied),
                    Err(e) => reporter.copy_failed(&task.source, &task.destination, e),
                }
                stats.leave(&result);

                (result, attempts)
            }));
        }

        let joined = futures::future::join_all(handles).await;

        submitted
            .into_iter()
            .zip(joined)
            .map(|(task, joined)| match joined {
                Ok((result, attempts)) => TaskResult {
                    task,
                    result,
                    attempts,
                },
                Err(e) => {
                    let err = FlattenError::Runtime(format!("Task join error: {}", e));
                    self.reporter.copy_failed(&task.source, &task.destination, &err);
                    TaskResult {
                        task,
                        result: Err(err),
                        attempts: 0,
                    }
                }
            })
            .collect()
    }
}

/// Run `attempt` once, retrying transient failures with exponential backoff.
///
/// Returns the final outcome and how many attempts were made.
pub async fn copy_with_retry<F, Fut>(
    mut attempt: F,
    source: &Path,
    reporter: &ProgressReporter,
    max_retries: u32,
    base_delay: Duration,
) -> (Result<CopyStats>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CopyStats>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(stats) => return (Ok(stats), attempts),
            Err(e) if e.is_transient() && attempts <= max_retries => {
                let delay = backoff_delay(base_delay, attempts);
                reporter.copy_retrying(source, attempts, max_retries, delay, &e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return (Err(e), attempts),
        }
    }
}

/// Delay before retry number `retry` (1-based), doubling each time
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let factor = 1u32 << retry.saturating_sub(1).min(16);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{self, Write};
    use std::sync::atomic::AtomicU32;
    use tempfile::TempDir;

    fn make_tasks(src: &TempDir, dst: &TempDir, count: usize) -> Vec<CopyTask> {
        (0..count)
            .map(|i| {
                let source = src.path().join(format!("f{}.dat", i));
                File::create(&source).unwrap().write_all(&[i as u8; 64]).unwrap();
                CopyTask::new(i as u64, source, dst.path().join(format!("dat/f{}.dat", i)), 64)
            })
            .collect()
    }

    fn scheduler(concurrency: Concurrency) -> TaskScheduler {
        let config = SchedulerConfig {
            concurrency,
            ..Default::default()
        };
        TaskScheduler::new(config, FileCopier::default(), Arc::new(ProgressReporter::disabled()))
    }

    #[tokio::test]
    async fn test_bounded_run_copies_everything() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let tasks = make_tasks(&src, &dst, 20);

        let scheduler = scheduler(Concurrency::Bounded(3));
        let results = scheduler.run(tasks).await;

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.result.is_ok() && r.attempts == 1));

        let stats = scheduler.stats();
        assert_eq!(stats.tasks_completed.load(Ordering::Relaxed), 20);
        assert_eq!(stats.bytes_copied.load(Ordering::Relaxed), 20 * 64);
        assert!(stats.peak_in_progress.load(Ordering::SeqCst) <= 3);
        assert_eq!(stats.tasks_in_progress.load(Ordering::SeqCst), 0);
        assert_eq!(stats.completion_percentage(), 100.0);
    }

    #[tokio::test]
    async fn test_unbounded_run_copies_everything() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let tasks = make_tasks(&src, &dst, 10);

        let results = scheduler(Concurrency::Unbounded).run(tasks).await;

        assert!(results.iter().all(|r| r.result.is_ok()));
        for result in &results {
            assert!(result.task.destination.exists());
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let mut tasks = make_tasks(&src, &dst, 5);
        tasks[2].source = src.path().join("vanished.dat");

        let scheduler = scheduler(Concurrency::Bounded(2));
        let results = scheduler.run(tasks).await;

        assert!(results[2].result.is_err());
        assert_eq!(results.iter().filter(|r| r.result.is_ok()).count(), 4);
        assert_eq!(scheduler.stats().tasks_failed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let task = CopyTask::new(0, src.path().join("missing"), dst.path().join("x/missing"), 0);

        let config = SchedulerConfig {
            concurrency: Concurrency::Bounded(1),
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
        };
        let scheduler =
            TaskScheduler::new(config, FileCopier::default(), Arc::new(ProgressReporter::disabled()));
        let results = scheduler.run(vec![task]).await;

        assert!(results[0].result.is_err());
        assert_eq!(results[0].attempts, 1);
    }

    fn interrupted() -> FlattenError {
        FlattenError::copy("/s/a.txt", "/d/txt/a.txt", io::Error::new(io::ErrorKind::Interrupted, "eintr"))
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_until_success() {
        let reporter = ProgressReporter::disabled();
        let calls = AtomicU32::new(0);

        let (result, attempts) = copy_with_retry(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(interrupted())
                } else {
                    Ok(CopyStats {
                        bytes_copied: 42,
                        duration: Duration::ZERO,
                    })
                }
            },
            Path::new("/s/a.txt"),
            &reporter,
            3,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result.unwrap().bytes_copied, 42);
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_transient_failure_exhausts_retries() {
        let reporter = ProgressReporter::disabled();
        let calls = AtomicU32::new(0);

        let (result, attempts) = copy_with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<CopyStats, _>(interrupted())
            },
            Path::new("/s/a.txt"),
            &reporter,
            2,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retries_by_default() {
        let reporter = ProgressReporter::disabled();

        let (result, attempts) = copy_with_retry(
            || async { Err::<CopyStats, _>(interrupted()) },
            Path::new("/s/a.txt"),
            &reporter,
            0,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 4), Duration::from_millis(800));
        assert_eq!(backoff_delay(base, 30), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_scheduler_stats() {
        let stats = SchedulerStats::default();

        stats.tasks_submitted.store(100, Ordering::Relaxed);
        stats.tasks_completed.store(40, Ordering::Relaxed);
        stats.tasks_failed.store(10, Ordering::Relaxed);

        assert_eq!(stats.completion_percentage(), 50.0);
    }
}
