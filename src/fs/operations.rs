//! File copy operations
//!
//! One copy = create the destination's parent directories, copy the bytes
//! and permissions into a sibling temporary file, carry the timestamps over,
//! then rename the temporary file onto the destination. Two tasks racing to
//! the same flattened name therefore leave one complete file behind.

use crate::error::{FlattenError, Result};
use filetime::FileTime;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy
    pub duration: Duration,
}

/// Async file copier
#[derive(Debug, Clone, Default)]
pub struct FileCopier;

impl FileCopier {
    /// Copy `source` to `dest`, overwriting any existing file.
    ///
    /// `tag` makes the temporary file name unique per task.
    pub async fn copy(&self, source: &Path, dest: &Path, tag: u64) -> Result<CopyStats> {
        let start = Instant::now();
        let fail = |e: std::io::Error| FlattenError::copy(source, dest, e);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(fail)?;
        }

        let temp = temp_path(dest, tag);
        let result = self.copy_into(source, &temp, dest).await;
        let result = match result {
            Ok(bytes) => tokio::fs::rename(&temp, dest).await.map(|_| bytes),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes_copied) => Ok(CopyStats {
                bytes_copied,
                duration: start.elapsed(),
            }),
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp).await;
                Err(fail(e))
            }
        }
    }

    /// Copy contents and permissions into `target`, then timestamps
    async fn copy_into(&self, source: &Path, target: &Path, dest: &Path) -> std::io::Result<u64> {
        let bytes = tokio::fs::copy(source, target).await?;

        let metadata = tokio::fs::metadata(source).await?;
        let mtime = FileTime::from_last_modification_time(&metadata);
        let atime = FileTime::from_last_access_time(&metadata);
        let owned = target.to_path_buf();
        // best effort: some filesystems refuse timestamp changes
        let outcome = tokio::task::spawn_blocking(move || {
            filetime::set_file_times(&owned, atime, mtime)
        })
        .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(path = %dest.display(), error = %e, "Could not preserve timestamps")
            }
            Err(e) => {
                tracing::debug!(path = %dest.display(), error = %e, "Timestamp task did not complete")
            }
        }

        Ok(bytes)
    }
}

/// Hidden sibling of `dest` used while the copy is in flight.
///
/// The name does not depend on the destination name, so it fits whenever
/// the destination does.
pub fn temp_path(dest: &Path, tag: u64) -> PathBuf {
    dest.with_file_name(format!(".flatcopy-{}.part", tag))
}
