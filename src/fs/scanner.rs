//! Directory scanner
//!
//! Walks the source root and lists every regular file below it, relative to
//! the root. A failed scan never aborts the run: it is reported and yields an
//! empty listing.

use crate::error::{FlattenError, Result};
use crate::fs::RelativePath;
use crate::progress::ProgressReporter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::{DirEntry, WalkDir};

/// A regular file found by the scan
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Absolute (root-joined) path to the file
    pub path: PathBuf,
    /// Relative path from source root
    pub relative_path: RelativePath,
    /// File size in bytes, 0 when metadata was unavailable
    pub size: u64,
}

/// Result of a directory scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Root path that was scanned
    pub root: PathBuf,
    /// All regular files
    pub files: Vec<FileEntry>,
    /// Total size of all files
    pub total_size: u64,
    /// Scan duration
    pub scan_duration: Duration,
    /// Why the scan was aborted, if it was
    pub failure: Option<String>,
}

impl ScanResult {
    /// Empty result for an aborted scan
    fn aborted(root: &Path, failure: String, scan_duration: Duration) -> Self {
        Self {
            root: root.to_path_buf(),
            files: Vec::new(),
            total_size: 0,
            scan_duration,
            failure: Some(failure),
        }
    }

    /// Number of files found
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether the scan completed
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Relative paths of all files
    pub fn relative_paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.files.iter().map(|f| &f.relative_path)
    }
}

/// Source tree scanner
pub struct Scanner<'a> {
    reporter: &'a ProgressReporter,
}

impl<'a> Scanner<'a> {
    /// Create a scanner reporting to `reporter`
    pub fn new(reporter: &'a ProgressReporter) -> Self {
        Self { reporter }
    }

    /// Scan `root`, reporting and swallowing any failure.
    ///
    /// An unreadable root or any traversal error aborts the whole scan and
    /// yields an empty listing with `failure` set.
    pub fn scan(&self, root: &Path) -> ScanResult {
        let start_time = Instant::now();
        self.reporter.scan_started(root);

        match self.try_scan(root) {
            Ok(result) => {
                self.reporter
                    .scan_finished(root, result.file_count(), result.scan_duration);
                result
            }
            Err(err) => {
                self.reporter.scan_failed(root, &err);
                ScanResult::aborted(root, err.to_string(), start_time.elapsed())
            }
        }
    }

    /// Scan `root`, returning the first error encountered
    pub fn try_scan(&self, root: &Path) -> Result<ScanResult> {
        let start_time = Instant::now();

        if !root.exists() {
            return Err(FlattenError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FlattenError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(|e| FlattenError::Traversal {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;

            let Some(size) = regular_file_size(&entry) else {
                continue;
            };

            let relative = entry.path().strip_prefix(root).ok().and_then(RelativePath::from_path);
            if let Some(relative_path) = relative {
                files.push(FileEntry {
                    path: entry.path().to_path_buf(),
                    relative_path,
                    size,
                });
            }
        }

        let total_size = files.iter().map(|f| f.size).sum();

        Ok(ScanResult {
            root: root.to_path_buf(),
            files,
            total_size,
            scan_duration: start_time.elapsed(),
            failure: None,
        })
    }
}

/// Size of the entry if it is a regular file.
///
/// Symlinks count when they resolve to a regular file; dangling links and
/// links to directories do not.
fn regular_file_size(entry: &DirEntry) -> Option<u64> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Some(entry.metadata().map(|m| m.len()).unwrap_or(0));
    }
    if file_type.is_symlink() {
        return std::fs::metadata(entry.path())
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());
    }
    None
}
