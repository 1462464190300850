//! Tracegen - Synthetic process-mining dataset generator.
//!
//! Generates a case table and an event log table by running one bounded
//! random walk per case through a vocabulary's transition graph, fanned out
//! across worker threads.
//!
//! # Usage
//!
//! ```bash
//! # Generate with the bundled vocabulary and defaults
//! tracegen
//!
//! # Start with a configuration file
//! tracegen --config /path/to/tracegen.toml
//!
//! # Override specific options
//! tracegen --cases 100000 --workers 8 --seed 42 --format csv
//! ```
//!
//! # Output layout
//!
//! ```text
//! <output-dir>/
//! ├── sql/
//! │   ├── cases.sql     batched INSERT statements
//! │   ├── events.sql
//! │   └── schema.sql    CREATE TABLE statements
//! └── csv/
//!     ├── cases.csv
//!     └── events.csv
//! ```

mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use config::{OutputFormat, TracegenConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for tracegen.
#[derive(Parser, Debug)]
#[command(
    name = "tracegen",
    about = "Generate synthetic case and event tables for process mining",
    version,
    author
)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a JSON vocabulary document.
    #[arg(short, long, value_name = "FILE")]
    vocabulary: Option<PathBuf>,

    /// Number of cases to generate.
    #[arg(short = 'n', long, value_name = "N")]
    cases: Option<u64>,

    /// Number of workers for event generation.
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Seed for reproducible output.
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,

    /// Root directory for output files.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output formats to write.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log output.
    #[arg(long)]
    json_logs: bool,

    /// Generate events on a single thread with progress reporting.
    #[arg(long)]
    single_threaded: bool,

    /// Print the default configuration and exit.
    #[arg(long)]
    print_config: bool,
}

/// Initialize tracing/logging.
fn init_tracing(config: &config::LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to parse log filter")?;

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if args.print_config {
        let config = TracegenConfig::default();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut config = if let Some(ref config_path) = args.config {
        TracegenConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        TracegenConfig::default()
    };

    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Tracegen starting");

    let vocabulary = pipeline::load_vocabulary(&config)?;

    match pipeline::run(&config, vocabulary).await {
        Ok(summary) => {
            summary.log();
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Generation failed");
            Err(e)
        }
    }
}
