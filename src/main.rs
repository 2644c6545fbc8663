//! flatcopy CLI - flatten a directory tree into extension buckets

use clap::Parser;
use flatcopy::config::{CliArgs, Concurrency, FlattenConfig, OutputFormat};
use flatcopy::core::FlattenEngine;
use flatcopy::error::{FlattenError, Result};
use flatcopy::progress::ProgressReporter;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging, RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &CliArgs) -> Result<i32> {
    // Build configuration
    let config = FlattenConfig::from_cli(args).map_err(FlattenError::ConfigError)?;

    // Print configuration if verbose
    if args.verbose > 0 && !args.quiet {
        print_config(&config);
    }

    // Create progress reporter
    let reporter = if args.progress && !args.quiet {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };

    let engine = FlattenEngine::new(config).with_reporter(Arc::new(reporter));
    let result = engine.execute()?;

    // Print results
    match args.output_format {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Text if !args.quiet => result.print_summary(),
        OutputFormat::Text => {}
    }

    Ok(result.exit_code())
}

fn print_config(config: &FlattenConfig) {
    println!("=== Configuration ===");
    println!("Source:        {}", config.source.display());
    println!("Destination:   {}", config.destination.display());
    match config.concurrency {
        Concurrency::Bounded(n) => println!("Workers:       {}", n),
        Concurrency::Unbounded => println!("Workers:       unbounded"),
    }
    println!("Retries:       {} ({}ms base delay)", config.retries, config.retry_delay_ms);
    println!("No-ext bucket: {}", config.no_extension_dir);
    println!("Strict:        {}", config.strict);
    println!("Dry run:       {}", config.dry_run);
    println!();
}
