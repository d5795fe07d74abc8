//! Command-line interface components.

use crate::config::{CompressionAlgorithm, PipelineConfig};
use crate::models::ProcessingStats;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ridership_normalizer")]
#[command(about = "Normalize wide-format metro ridership exports into long-format CSV and Parquet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory holding the raw exports and station mapping tables
    #[arg(value_name = "RAW_DIR", default_value = "raw")]
    pub raw_dir: PathBuf,

    /// Output directory for the normalized datasets
    #[arg(short, long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// File name prefix of station workbooks
    #[arg(long, value_name = "PREFIX")]
    pub station_prefix: Option<String>,

    /// File name prefix of station pair workbooks
    #[arg(long, value_name = "PREFIX")]
    pub pair_prefix: Option<String>,

    /// Normalize and report without writing any output
    #[arg(long)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except warnings and errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Build the pipeline configuration from the defaults and these flags
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let compression: CompressionAlgorithm = self
            .compression
            .parse()
            .with_context(|| format!("Invalid --compression value '{}'", self.compression))?;

        let mut config = PipelineConfig::default()
            .with_raw_dir(&self.raw_dir)
            .with_output_dir(&self.output_dir)
            .with_compression(compression);

        if let Some(prefix) = &self.station_prefix {
            config.station_file_prefix = prefix.clone();
        }
        if let Some(prefix) = &self.pair_prefix {
            config.pair_file_prefix = prefix.clone();
        }
        if self.dry_run {
            config = config.with_dry_run();
        }
        if self.quiet {
            config = config.without_progress();
        }

        Ok(config)
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ridership_normalizer={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("Logging initialized at level: {}", log_level);
}

pub fn print_header(config: &PipelineConfig) {
    println!("{}", "Normalizing ridership exports".bright_green().bold());
    println!("  {} {}", "Raw:".bright_cyan(), config.raw_dir.display());
    println!("  {} {}", "Output:".bright_cyan(), config.output_dir.display());
    if config.dry_run {
        println!("  {}", "Dry run: nothing will be written".bright_yellow());
    }
}

pub fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Periods:".bright_cyan(),
        stats.periods.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    for (label, rows) in [
        ("Entry rows:", stats.entry_rows),
        ("Exit rows:", stats.exit_rows),
        ("Pair rows:", stats.pair_rows),
    ] {
        println!(
            "  {} {}",
            label.bright_cyan(),
            rows.to_string().bright_white().bold()
        );
    }
    for path in &stats.output_paths {
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
}
