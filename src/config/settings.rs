//! Configuration settings for FlatCopy
//!
//! Defines the CLI arguments, the runtime configuration derived from them,
//! and their defaults.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Folder name used for files without an extension
pub const DEFAULT_NO_EXTENSION_DIR: &str = "no_extension";

/// FlatCopy - copy a tree into extension buckets with flattened names
#[derive(Parser, Debug, Clone)]
#[command(name = "flatcopy")]
#[command(author = "FlatCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy files from source directory to target directory")]
#[command(long_about = r#"
FlatCopy walks a source directory, and copies every file into a destination
folder named after the file's extension. Each file gets a flattened name made
of the first letter of every parent directory followed by the original name.

  a/b/report.txt  ->  <od>/txt/abreport.txt

Examples:
  flatcopy --id ./photos --od ./sorted
  flatcopy --id ./src --od ./dst --workers 8 --progress
  flatcopy --id ./src --od ./dst --strict --output-format json
"#)]
pub struct CliArgs {
    /// Source directory
    #[arg(long = "id", value_name = "PATH")]
    pub input_dir: PathBuf,

    /// Target directory
    #[arg(long = "od", value_name = "PATH")]
    pub output_dir: PathBuf,

    /// Maximum copies in flight (0 = auto-detect)
    #[arg(short = 'w', long, default_value = "0", value_name = "NUM")]
    pub workers: usize,

    /// Launch every copy at once instead of using a bounded worker pool
    #[arg(long, conflicts_with = "workers")]
    pub unbounded: bool,

    /// Retry transient I/O failures N times
    #[arg(long, default_value = "0", value_name = "NUM")]
    pub retries: u32,

    /// Base delay between retries in milliseconds
    #[arg(long, default_value = "100", value_name = "MS")]
    pub retry_delay_ms: u64,

    /// Refuse to copy when two files flatten to the same name
    #[arg(long)]
    pub strict: bool,

    /// Folder name for files that have no extension
    #[arg(long, default_value = DEFAULT_NO_EXTENSION_DIR, value_name = "NAME")]
    pub no_ext_dir: String,

    /// Dry run (show what would be copied)
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show a progress bar
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl CliArgs {
    /// Log level implied by the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Output format for the run summary
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// How many copy tasks may run at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "workers")]
pub enum Concurrency {
    /// Fixed-size worker pool
    Bounded(usize),
    /// One in-flight task per file
    Unbounded,
}

impl Concurrency {
    /// Auto-detected pool size: four per CPU, at least four
    pub fn auto() -> Self {
        Self::Bounded((num_cpus::get() * 4).max(4))
    }

    /// Build from a worker count where 0 means auto-detect
    pub fn from_workers(workers: usize) -> Self {
        if workers == 0 {
            Self::auto()
        } else {
            Self::Bounded(workers)
        }
    }

    /// Permit count, or `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some((*n).max(1)),
            Self::Unbounded => None,
        }
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::auto()
    }
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlattenConfig {
    /// Source root
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Copy task concurrency
    pub concurrency: Concurrency,
    /// Retry count for transient failures
    pub retries: u32,
    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Abort on flattened name collisions
    pub strict: bool,
    /// Bucket name for extension-less files
    pub no_extension_dir: String,
    /// Dry run mode
    pub dry_run: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            concurrency: Concurrency::default(),
            retries: 0,
            retry_delay_ms: 100,
            strict: false,
            no_extension_dir: DEFAULT_NO_EXTENSION_DIR.to_string(),
            dry_run: false,
        }
    }
}

impl FlattenConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        validate_bucket_name(&args.no_ext_dir)?;

        let concurrency = if args.unbounded {
            Concurrency::Unbounded
        } else {
            Concurrency::from_workers(args.workers)
        };

        Ok(Self {
            source: args.input_dir.clone(),
            destination: args.output_dir.clone(),
            concurrency,
            retries: args.retries,
            retry_delay_ms: args.retry_delay_ms,
            strict: args.strict,
            no_extension_dir: args.no_ext_dir.clone(),
            dry_run: args.dry_run,
        })
    }

    /// Destination bucket for an extension
    pub fn bucket_for<'a>(&'a self, extension: &'a str) -> &'a str {
        if extension.is_empty() {
            &self.no_extension_dir
        } else {
            extension
        }
    }
}

/// The no-extension folder must be a single plain path segment
fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(format!("Invalid no-extension folder name: '{}'", name));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!(
            "No-extension folder name must not contain separators: '{}'",
            name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        let mut argv = vec!["flatcopy"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_required_dirs() {
        assert!(CliArgs::try_parse_from(["flatcopy", "--id", "src"]).is_err());
        assert!(CliArgs::try_parse_from(["flatcopy", "--od", "dst"]).is_err());

        let args = parse(&["--id", "src", "--od", "dst"]);
        assert_eq!(args.input_dir, PathBuf::from("src"));
        assert_eq!(args.output_dir, PathBuf::from("dst"));
    }

    #[test]
    fn test_from_cli_defaults() {
        let args = parse(&["--id", "src", "--od", "dst"]);
        let config = FlattenConfig::from_cli(&args).unwrap();

        assert_eq!(config.concurrency, Concurrency::auto());
        assert_eq!(config.retries, 0);
        assert!(!config.strict);
        assert!(!config.dry_run);
        assert_eq!(config.no_extension_dir, DEFAULT_NO_EXTENSION_DIR);
    }

    #[test]
    fn test_concurrency_flags() {
        let args = parse(&["--id", "s", "--od", "d", "--workers", "3"]);
        let config = FlattenConfig::from_cli(&args).unwrap();
        assert_eq!(config.concurrency, Concurrency::Bounded(3));
        assert_eq!(config.concurrency.limit(), Some(3));

        let args = parse(&["--id", "s", "--od", "d", "--unbounded"]);
        let config = FlattenConfig::from_cli(&args).unwrap();
        assert_eq!(config.concurrency, Concurrency::Unbounded);
        assert_eq!(config.concurrency.limit(), None);
    }

    #[test]
    fn test_auto_concurrency_has_floor() {
        match Concurrency::from_workers(0) {
            Concurrency::Bounded(n) => assert!(n >= 4),
            Concurrency::Unbounded => panic!("auto must be bounded"),
        }
    }

    #[test]
    fn test_bucket_name_validation() {
        let args = parse(&["--id", "s", "--od", "d", "--no-ext-dir", "a/b"]);
        assert!(FlattenConfig::from_cli(&args).is_err());

        let args = parse(&["--id", "s", "--od", "d", "--no-ext-dir", ".."]);
        assert!(FlattenConfig::from_cli(&args).is_err());

        let args = parse(&["--id", "s", "--od", "d", "--no-ext-dir", "misc"]);
        let config = FlattenConfig::from_cli(&args).unwrap();
        assert_eq!(config.bucket_for(""), "misc");
        assert_eq!(config.bucket_for("TXT"), "TXT");
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&["--id", "s", "--od", "d"]).log_level(), "info");
        assert_eq!(parse(&["--id", "s", "--od", "d", "-vv"]).log_level(), "trace");
        assert_eq!(parse(&["--id", "s", "--od", "d", "-q"]).log_level(), "error");
    }
}
