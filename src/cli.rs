use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Zephyr NWP ensemble post-processor.
#[derive(Parser)]
#[command(
    name = "zephyr",
    version,
    about = "Neighbourhood, calibration, blending and verification of NWP ensemble fields"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the post-processing pipeline over the configured sources.
    Run(RunArgs),
    /// Score a forecast field against an observation field.
    Verify(VerifyArgs),
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to TOML pipeline configuration file.
    #[arg(short, long, default_value = "zephyr.toml")]
    pub config: PathBuf,

    /// Override output field document path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `verify` subcommand.
#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Forecast field document.
    #[arg(short, long)]
    pub forecast: PathBuf,

    /// Observation field document.
    #[arg(long)]
    pub observation: PathBuf,

    /// Score: brier, reliability or rank-histogram.
    #[arg(short, long, default_value = "brier")]
    pub score: String,

    /// Number of reliability bins.
    #[arg(long, default_value_t = 10)]
    pub bins: usize,

    /// Event threshold applied to continuous observations.
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Comparator for --threshold (gt, ge, lt, le).
    #[arg(long, default_value = "gt")]
    pub comparator: String,

    /// Write the JSON score here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
