//! Main copy engine
//!
//! Scans the source once, maps every file to its extension bucket and
//! flattened name, then hands the copies to the scheduler and folds the
//! outcomes into a [`CopyResult`].

use crate::config::{FlattenConfig, OutputFormat};
use crate::core::{CopyTask, SchedulerConfig, TaskScheduler};
use crate::error::{FlattenError, IoResultExt, Result};
use crate::fs::{flatten, FileCopier, ScanResult, Scanner};
use crate::progress::ProgressReporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One file that could not be copied
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CopyFailure {
    /// Source file
    pub source: PathBuf,
    /// Intended destination
    pub destination: PathBuf,
    /// Error text
    pub error: String,
}

/// Several sources that flatten to one destination
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Collision {
    /// Shared destination path
    pub destination: PathBuf,
    /// Colliding sources, in scan order
    pub sources: Vec<PathBuf>,
}

/// Copy operation result
#[derive(Debug, Serialize)]
pub struct CopyResult {
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Source root
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Regular files found by the scan
    pub files_scanned: u64,
    /// Files copied successfully
    pub files_copied: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Per-file failures
    pub failures: Vec<CopyFailure>,
    /// Why the scan was aborted, if it was
    pub scan_failure: Option<String>,
    /// Flattened name collisions (last writer wins)
    pub collisions: Vec<Collision>,
    /// Nothing was written
    pub dry_run: bool,
    /// Total duration
    pub duration: Duration,
}

impl CopyResult {
    /// Check if the run was completely successful
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.scan_failure.is_none()
    }

    /// Scan failure plus per-file failures
    pub fn failure_count(&self) -> usize {
        self.failures.len() + usize::from(self.scan_failure.is_some())
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Average throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.bytes_copied as f64 / secs
        } else {
            0.0
        }
    }

    /// JSON rendering of the whole result
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.summary_text()),
            OutputFormat::Json => self.to_json(),
        }
    }

    /// Human-readable summary
    pub fn summary_text(&self) -> String {
        let mut out = String::new();
        out.push_str(if self.dry_run {
            "\n=== Dry Run Summary ===\n"
        } else {
            "\n=== Copy Summary ===\n"
        });
        out.push_str(&format!("Files scanned:   {}\n", self.files_scanned));
        out.push_str(&format!("Files copied:    {}\n", self.files_copied));
        out.push_str(&format!(
            "Bytes copied:    {}\n",
            humansize::format_size(self.bytes_copied, humansize::BINARY)
        ));
        let rounded = Duration::from_millis(self.duration.as_millis() as u64);
        out.push_str(&format!("Duration:        {}\n", humantime::format_duration(rounded)));
        out.push_str(&format!(
            "Throughput:      {}/s\n",
            humansize::format_size(self.throughput() as u64, humansize::BINARY)
        ));

        if !self.collisions.is_empty() {
            out.push_str(&format!("Collisions:      {}\n", self.collisions.len()));
        }

        if let Some(scan_failure) = &self.scan_failure {
            out.push_str(&format!("\nScan failed: {}\n", scan_failure));
        }

        if !self.failures.is_empty() {
            out.push_str(&format!("\nFailures: {}\n", self.failures.len()));
            for failure in &self.failures {
                out.push_str(&format!(
                    "  {} -> {} - {}\n",
                    failure.source.display(),
                    failure.destination.display(),
                    failure.error
                ));
            }
        }

        out
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("{}", self.summary_text());
    }
}

/// Main copy engine
pub struct FlattenEngine {
    /// Configuration
    config: FlattenConfig,
    /// File copier
    copier: FileCopier,
    /// Reporting sink shared with every task
    reporter: Arc<ProgressReporter>,
}

impl FlattenEngine {
    /// Create a new engine that only logs
    pub fn new(config: FlattenConfig) -> Self {
        Self {
            config,
            copier: FileCopier::default(),
            reporter: Arc::new(ProgressReporter::disabled()),
        }
    }

    /// Set the reporting sink
    pub fn with_reporter(mut self, reporter: Arc<ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Run to completion on a fresh single-threaded runtime.
    ///
    /// Blocking entry point for synchronous callers. From async code, await
    /// [`FlattenEngine::run`] instead; calling this inside a tokio runtime
    /// returns [`FlattenError::Runtime`].
    pub fn execute(&self) -> Result<CopyResult> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(FlattenError::Runtime(
                "execute called from within a tokio runtime; await run() instead".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FlattenError::Runtime(format!("Failed to create runtime: {}", e)))?;

        runtime.block_on(self.run())
    }

    /// Scan, plan, and copy.
    ///
    /// Only setup problems are errors: an unusable destination root, or
    /// collisions in strict mode. Scan and copy failures end up in the
    /// returned [`CopyResult`].
    pub async fn run(&self) -> Result<CopyResult> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let destination = &self.config.destination;

        if !self.config.dry_run {
            tokio::fs::create_dir_all(destination)
                .await
                .with_path(destination)?;
        }

        let scan = Scanner::new(&self.reporter).scan(&self.config.source);
        let tasks = self.plan(&scan);

        let collisions = find_collisions(&tasks);
        for collision in &collisions {
            let sources: Vec<&Path> = collision.sources.iter().map(PathBuf::as_path).collect();
            self.reporter.collision(&collision.destination, &sources);
        }
        if self.config.strict && !collisions.is_empty() {
            return Err(FlattenError::Collision {
                count: collisions.len(),
                collisions: collisions
                    .into_iter()
                    .map(|c| (c.destination, c.sources))
                    .collect(),
            });
        }

        let mut result = CopyResult {
            started_at,
            source: self.config.source.clone(),
            destination: destination.clone(),
            files_scanned: scan.file_count() as u64,
            files_copied: 0,
            bytes_copied: 0,
            failures: Vec::new(),
            scan_failure: scan.failure.clone(),
            collisions,
            dry_run: self.config.dry_run,
            duration: Duration::ZERO,
        };

        if self.config.dry_run {
            for task in &tasks {
                self.reporter.copy_planned(&task.source, &task.destination);
            }
            result.duration = start_time.elapsed();
            return Ok(result);
        }

        self.reporter.set_total_files(tasks.len() as u64);

        let scheduler = TaskScheduler::new(
            SchedulerConfig {
                concurrency: self.config.concurrency,
                max_retries: self.config.retries,
                retry_delay: Duration::from_millis(self.config.retry_delay_ms),
            },
            self.copier.clone(),
            Arc::clone(&self.reporter),
        );

        for settled in scheduler.run(tasks).await {
            match settled.result {
                Ok(stats) => {
                    result.files_copied += 1;
                    result.bytes_copied += stats.bytes_copied;
                }
                Err(e) => result.failures.push(CopyFailure {
                    source: settled.task.source,
                    destination: settled.task.destination,
                    error: e.to_string(),
                }),
            }
        }

        self.reporter.finish();
        result.duration = start_time.elapsed();
        Ok(result)
    }

    /// One copy task per scanned file, targeting `destination/bucket/name`
    pub fn plan(&self, scan: &ScanResult) -> Vec<CopyTask> {
        scan.files
            .iter()
            .enumerate()
            .map(|(id, entry)| {
                let target = flatten(&entry.relative_path);
                let destination = self
                    .config
                    .destination
                    .join(self.config.bucket_for(&target.extension))
                    .join(&target.name);
                CopyTask::new(id as u64, entry.path.clone(), destination, entry.size)
            })
            .collect()
    }
}

/// Destinations targeted by more than one task
pub fn find_collisions(tasks: &[CopyTask]) -> Vec<Collision> {
    let mut by_destination: HashMap<&Path, Vec<&Path>> = HashMap::new();
    for task in tasks {
        by_destination
            .entry(task.destination.as_path())
            .or_default()
            .push(task.source.as_path());
    }

    let mut collisions: Vec<Collision> = by_destination
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(destination, sources)| Collision {
            destination: destination.to_path_buf(),
            sources: sources.into_iter().map(Path::to_path_buf).collect(),
        })
        .collect();
    collisions.sort_by(|a, b| a.destination.cmp(&b.destination));
    collisions
}

/// Flatten-copy `source` into `dest` with default settings.
///
/// Blocks on its own runtime, so it fails with [`FlattenError::Runtime`]
/// when called from async code.
pub fn flatten_copy(source: &Path, dest: &Path) -> Result<CopyResult> {
    let config = FlattenConfig {
        source: source.to_path_buf(),
        destination: dest.to_path_buf(),
        ..Default::default()
    };

    FlattenEngine::new(config).execute()
}
