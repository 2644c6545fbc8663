//! Progress reporter implementation
//!
//! The reporter is the single sink every component writes to: it emits the
//! tracing events for scans and copies, keeps running counters, and drives
//! an indicatif progress bar when one is requested. It is created once in
//! `main` and handed to the engine, which shares it with every copy task.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::FlattenError;

/// Reporting sink for scan and copy events
pub struct ProgressReporter {
    /// File count progress bar
    files_bar: ProgressBar,
    /// Start time
    start_time: Instant,
    /// Total files to copy
    total_files: AtomicU64,
    /// Files copied so far
    files_copied: AtomicU64,
    /// Files that failed
    files_failed: AtomicU64,
    /// Bytes copied so far
    bytes_copied: AtomicU64,
    /// Is the progress bar drawn
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a reporter with a visible progress bar
    pub fn new() -> Self {
        let files_bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
        {
            files_bar.set_style(style.progress_chars("=> "));
        }
        files_bar.set_prefix("Files");

        Self {
            files_bar,
            start_time: Instant::now(),
            total_files: AtomicU64::new(0),
            files_copied: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a reporter that only logs
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.files_bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Run a logging closure without tearing the progress bar
    fn log(&self, emit: impl FnOnce()) {
        if self.is_enabled() {
            self.files_bar.suspend(emit);
        } else {
            emit();
        }
    }

    /// Scan of the source root is starting
    pub fn scan_started(&self, root: &Path) {
        self.log(|| tracing::debug!(root = %root.display(), "Scanning source directory"));
    }

    /// Scan finished with `files` regular files
    pub fn scan_finished(&self, root: &Path, files: usize, elapsed: Duration) {
        self.log(|| {
            tracing::debug!(root = %root.display(), files, ?elapsed, "Scan complete")
        });
    }

    /// Scan was aborted; nothing will be copied from this root
    pub fn scan_failed(&self, root: &Path, error: &FlattenError) {
        self.log(|| {
            tracing::error!(
                root = %root.display(),
                %error,
                "Error reading folder {}. Nothing to copy.",
                root.display()
            )
        });
    }

    /// Set total files to copy
    pub fn set_total_files(&self, total: u64) {
        self.total_files.store(total, Ordering::Relaxed);
        self.files_bar.set_length(total);
    }

    /// A copy task is starting
    pub fn copy_started(&self, source: &Path, destination: &Path) {
        self.log(|| {
            tracing::info!(
                "Copying {} to {}",
                source.display(),
                destination.display()
            )
        });
    }

    /// A copy task finished successfully
    pub fn copy_finished(&self, source: &Path, destination: &Path, bytes: u64) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        self.files_bar.inc(1);
        self.log(|| {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                bytes,
                "Copy complete"
            )
        });
    }

    /// A copy task failed; siblings keep going
    pub fn copy_failed(&self, source: &Path, destination: &Path, error: &FlattenError) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
        self.files_bar.inc(1);
        self.log(|| {
            tracing::error!(
                %error,
                "Error copying {} to {}",
                source.display(),
                destination.display()
            )
        });
    }

    /// A transient failure is about to be retried
    pub fn copy_retrying(&self, source: &Path, attempt: u32, max: u32, delay: Duration, error: &FlattenError) {
        self.log(|| {
            tracing::warn!(
                source = %source.display(),
                %error,
                "Transient copy failure (attempt {}/{}), retrying in {:?}",
                attempt,
                max,
                delay
            )
        });
    }

    /// Several sources flatten to the same destination
    pub fn collision(&self, destination: &Path, sources: &[&Path]) {
        let sources = sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.log(|| {
            tracing::warn!(
                destination = %destination.display(),
                "Flattened name collision, last writer wins: {}",
                sources
            )
        });
    }

    /// Dry run: report the planned copy without performing it
    pub fn copy_planned(&self, source: &Path, destination: &Path) {
        self.log(|| {
            tracing::info!(
                "Would copy {} to {}",
                source.display(),
                destination.display()
            )
        });
    }

    /// Finish the progress bar and log the final tally
    pub fn finish(&self) {
        let summary = self.summary();
        if summary.files_failed == 0 {
            self.files_bar.finish_with_message("done");
        } else {
            self.files_bar.abandon_with_message("with failures");
        }
        tracing::debug!(
            copied = summary.files_copied,
            failed = summary.files_failed,
            bytes = summary.bytes_copied,
            elapsed = ?summary.elapsed,
            "Finished {:.0}% of {} files",
            summary.percentage(),
            summary.total_files
        );
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if the progress bar is drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Get progress summary
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            total_files: self.total_files.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Progress summary
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    /// Total files to copy
    pub total_files: u64,
    /// Files copied so far
    pub files_copied: u64,
    /// Files that failed
    pub files_failed: u64,
    /// Bytes copied so far
    pub bytes_copied: u64,
    /// Elapsed time
    pub elapsed: Duration,
}

impl ProgressSummary {
    /// Get completion percentage (finished files, either way)
    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            ((self.files_copied + self.files_failed) as f64 / self.total_files as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_progress_reporter_counters() {
        let reporter = ProgressReporter::disabled();
        assert!(!reporter.is_enabled());

        reporter.set_total_files(4);
        reporter.copy_finished(Path::new("/s/a"), Path::new("/d/a"), 10);
        reporter.copy_finished(Path::new("/s/b"), Path::new("/d/b"), 5);
        reporter.copy_failed(
            Path::new("/s/c"),
            Path::new("/d/c"),
            &FlattenError::copy("/s/c", "/d/c", io::Error::other("boom")),
        );

        let summary = reporter.summary();
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.files_copied, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.bytes_copied, 15);
        assert_eq!(summary.percentage(), 75.0);
    }

    #[test]
    fn test_empty_summary_percentage() {
        let reporter = ProgressReporter::default();
        assert_eq!(reporter.summary().percentage(), 0.0);
        reporter.finish();
    }
}
