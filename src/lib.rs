//! # flatcopy - flatten a directory tree into extension buckets
//!
//! Every regular file under the source root is copied to
//! `destination/<extension>/<name>`, where `<name>` is the first character
//! of each parent directory followed by the original file name. A file at
//! `a/b/report.txt` ends up at `destination/txt/abreport.txt`.
//!
//! ## Features
//!
//! - **Concurrent copies**: one tokio task per file, bounded by a semaphore
//! - **Metadata preservation**: permissions and timestamps follow the bytes
//! - **Atomic replacement**: colliding names leave one complete file behind
//! - **Collision detection**: warn by default, abort in strict mode
//! - **Failure isolation**: a failing file never stops its siblings
//!
//! ## Quick Start
//!
//! ```no_run
//! use flatcopy::core::flatten_copy;
//! use std::path::Path;
//!
//! let result = flatten_copy(Path::new("/source"), Path::new("/destination")).unwrap();
//!
//! println!("Copied {} files ({} bytes)", result.files_copied, result.bytes_copied);
//! ```
//!
//! ## Advanced Usage
//!
//! ```no_run
//! use flatcopy::config::{Concurrency, FlattenConfig};
//! use flatcopy::core::FlattenEngine;
//! use flatcopy::progress::ProgressReporter;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = FlattenConfig {
//!     source: PathBuf::from("/source"),
//!     destination: PathBuf::from("/destination"),
//!     concurrency: Concurrency::Bounded(16),
//!     retries: 2,
//!     strict: true,
//!     ..Default::default()
//! };
//!
//! let engine = FlattenEngine::new(config).with_reporter(Arc::new(ProgressReporter::new()));
//!
//! let result = engine.execute().unwrap();
//! result.print_summary();
//! std::process::exit(result.exit_code());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod progress;

// Re-export commonly used types
pub use config::{Concurrency, FlattenConfig};
pub use core::{CopyResult, FlattenEngine};
pub use error::{FlattenError, Result};
pub use progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use flatcopy::prelude::*;
    //! ```

    pub use crate::config::{Concurrency, FlattenConfig};
    pub use crate::core::{flatten_copy, CopyResult, FlattenEngine};
    pub use crate::error::{FlattenError, Result};
    pub use crate::fs::{flatten, FileEntry, FlattenedTarget, RelativePath, Scanner};
    pub use crate::progress::ProgressReporter;
}
