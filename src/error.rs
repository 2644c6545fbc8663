//! Error types for FlatCopy
//!
//! Fatal setup errors and per-file failures share one enum so the scanner,
//! the copier and the coordinator can all speak the same language.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FlatCopy operations
#[derive(Error, Debug)]
pub enum FlattenError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source root does not exist
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Source root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory traversal failed below the root
    #[error("Error reading folder '{root}': {message}")]
    Traversal { root: PathBuf, message: String },

    /// Copying one file failed
    #[error("Error copying '{source_path}' to '{destination}': {cause}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// Strict mode found files that flatten to the same destination
    #[error("{count} flattened name collision(s) detected")]
    Collision {
        count: usize,
        collisions: Vec<(PathBuf, Vec<PathBuf>)>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Async runtime or task join failure
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl FlattenError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a copy failure naming both ends
    pub fn copy(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        cause: std::io::Error,
    ) -> Self {
        Self::Copy {
            source_path: source.into(),
            destination: destination.into(),
            cause,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Underlying I/O error, if any
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Copy { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Check if this error is transient and worth a retry
    ///
    /// Permission and not-found errors are permanent; interrupted, would-block
    /// and timed-out I/O is not.
    pub fn is_transient(&self) -> bool {
        self.io_error().is_some_and(|e| {
            matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            )
        })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::Traversal { root: path, .. }
            | Self::Copy {
                source_path: path, ..
            } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for FlatCopy operations
pub type Result<T> = std::result::Result<T, FlattenError>;

impl From<std::io::Error> for FlattenError {
    fn from(err: std::io::Error) -> Self {
        FlattenError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for FlattenError {
    fn from(err: serde_json::Error) -> Self {
        FlattenError::Runtime(format!("JSON encoding failed: {}", err))
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| FlattenError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_with_path() {
        let io_err = Error::new(ErrorKind::NotFound, "file not found");
        let err = FlattenError::io("/test/path", io_err);
        assert_eq!(err.path(), Some(&PathBuf::from("/test/path")));
    }

    #[test]
    fn test_transient_classification() {
        let timed_out = FlattenError::copy("/a", "/b", Error::new(ErrorKind::TimedOut, "slow"));
        assert!(timed_out.is_transient());

        let denied = FlattenError::copy("/a", "/b", Error::new(ErrorKind::PermissionDenied, "no"));
        assert!(!denied.is_transient());

        assert!(!FlattenError::NotFound(PathBuf::from("/x")).is_transient());
    }

    #[test]
    fn test_copy_error_message_names_both_paths() {
        let err = FlattenError::copy("/src/a.txt", "/dst/txt/a.txt", Error::other("boom"));
        let msg = err.to_string();
        assert!(msg.contains("/src/a.txt"));
        assert!(msg.contains("/dst/txt/a.txt"));
        assert_eq!(err.path(), Some(&PathBuf::from("/src/a.txt")));
    }

    #[test]
    fn test_with_path() {
        let res: std::io::Result<()> = Err(Error::new(ErrorKind::Other, "x"));
        let err = res.with_path("/some/dir").unwrap_err();
        assert_eq!(err.path(), Some(&PathBuf::from("/some/dir")));
    }
}
