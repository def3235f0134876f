use std::path::PathBuf;

use anilyze::{batch::BatchDriver, config::BatchConfig, engine::NativeEngine};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "anilyze",
    version,
    about = "Open microscopy scans as hyperstacks and save max projections"
)]
struct Cli {
    /// Experiment folder holding the scans
    root: PathBuf,
    /// TOML file with batch settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output folder (default: <ROOT>/processed)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Save time series unchanged instead of projecting them
    #[arg(long)]
    no_project: bool,
    /// Run log file name, created inside ROOT
    #[arg(long, value_name = "NAME")]
    log_file: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::default(),
    };
    if cli.output.is_some() {
        config.output_dir = cli.output;
    }
    if cli.no_project {
        config.project_time_series = false;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }

    info!("Starting batch in {}", cli.root.display());
    let mut driver = BatchDriver::new(&cli.root, config, NativeEngine::new());
    let summary = driver
        .run()
        .with_context(|| format!("cannot process {}", cli.root.display()))?;

    println!("{}", summary.summary());
    println!("Done with script");
    Ok(())
}
