//! Grid preprocessor.
//!
//! Downloads raw provider files and converts them into the canonical
//! `<name>_grid.json` records served by grid-api.

mod acquire;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_processor::{inspect, run_all, PipelineConfig};
use storage::GridStore;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use acquire::{acquire_all, HttpProvider};
use config::AcquireConfig;

#[derive(Parser, Debug)]
#[command(name = "preprocessor")]
#[command(about = "Prepare canonical ocean and atmosphere grids")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/preprocess.yaml", env = "GRID_PREPROCESS_CONFIG")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert raw files into grid records
    Process {
        /// Override the raw input directory
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Override the output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Fetch the configured raw files
    Download {
        /// Override the raw directory files are written to
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },

    /// Print the axes and variables of a raw file
    Inspect { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Process {
            raw_dir,
            output_dir,
        } => {
            let mut config = PipelineConfig::load(Some(args.config.as_path()))?;
            if let Some(dir) = raw_dir {
                config.raw_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }

            info!(
                raw_dir = %config.raw_dir.display(),
                output_dir = %config.output_dir.display(),
                jobs = config.jobs.len(),
                "Starting preprocessing"
            );

            let store = GridStore::new(&config.output_dir);
            let summary = run_all(config.jobs(), &store).await;
            println!("{}", summary);

            if summary.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Download {
            raw_dir,
            timeout_secs,
        } => {
            let pipeline = PipelineConfig::load(Some(args.config.as_path()))?;
            let raw_dir = raw_dir.unwrap_or(pipeline.raw_dir);
            let acquire = AcquireConfig::load(Some(args.config.as_path()))?;

            if acquire.downloads.is_empty() {
                warn!(config = %args.config.display(), "No downloads configured");
                return Ok(ExitCode::SUCCESS);
            }

            let provider = HttpProvider::new(Duration::from_secs(timeout_secs))?;
            let results = acquire_all(&provider, &acquire.downloads, &raw_dir).await;

            let mut failed = false;
            for acquired in &results {
                match &acquired.result {
                    Ok(path) => println!("  {:<12} {}", acquired.grid, path.display()),
                    Err(e) => {
                        failed = true;
                        println!("  {:<12} FAILED: {} ({})", acquired.grid, e, e.guidance());
                    }
                }
            }

            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Inspect { file } => {
            let dataset = netcdf_parser::open_dataset(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let report = inspect(&dataset)?;
            println!("{}", report);
        }
    }

    Ok(ExitCode::SUCCESS)
}
