//! slipcal - Command Line Calibration of the Slipless Vehicle Model
//!
//! # Commands
//!
//! - `slipcal calibrate -p <constraints> -d <dataset.csv>` - Fit the model constants
//! - `slipcal evaluate -d <dataset.csv> -k <constants>` - Score given constants
//! - `slipcal check -p <constraints> [-d <dataset.csv>]` - Validate inputs
//! - `slipcal synth -n <samples> -o <out.csv>` - Generate a synthetic dataset
//!
//! # Architecture
//!
//! As part of the **S**ervice layer in the A-I-P-S architecture, this crate
//! wires the loaders of adapter_loader to the calibration of vehicle_models.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

pub use error::{CliError, Result};

use config::{build_config, CliOverrides};

/// Slipless vehicle model calibration
#[derive(Parser)]
#[command(name = "slipcal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML, defaults to ./slipcal.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format (json, table)
    #[arg(short, long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model constants to a dataset
    Calibrate {
        /// Parameter constraint file
        #[arg(short = 'p', long)]
        constraints: PathBuf,

        /// Dataset CSV
        #[arg(short, long)]
        dataset: PathBuf,

        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Iteration budget per drivetrain mode
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Fail instead of reporting a non-converged estimate
        #[arg(long)]
        strict: bool,
    },

    /// Score given constants on a dataset
    Evaluate {
        /// Dataset CSV
        #[arg(short, long)]
        dataset: PathBuf,

        /// Nine comma-separated constants in slot order, or "default"
        #[arg(short = 'k', long, allow_hyphen_values = true)]
        constants: String,
    },

    /// Validate a constraint file and optionally a dataset
    Check {
        /// Parameter constraint file
        #[arg(short = 'p', long)]
        constraints: PathBuf,

        /// Dataset CSV
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Generate a dataset by stepping the model with known constants
    Synth {
        /// Nine comma-separated constants in slot order, or "default"
        #[arg(short = 'k', long, default_value = "default", allow_hyphen_values = true)]
        constants: String,

        /// Number of transitions
        #[arg(short = 'n', long, default_value = "200")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Standard deviation of the observation noise
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let max_iterations = match &cli.command {
        Commands::Calibrate { max_iterations, .. } => *max_iterations,
        _ => None,
    };
    let config = build_config(&CliOverrides {
        config_file: cli.config,
        log_level: cli.log_level,
        output_format: cli.format,
        max_iterations,
    })?;

    init_tracing(config.log_level.as_filter_str());
    info!("slipcal v{}", env!("CARGO_PKG_VERSION"));
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Calibrate {
            constraints,
            dataset,
            output,
            strict,
            ..
        } => commands::calibrate::run(&constraints, &dataset, output.as_deref(), strict, &config),
        Commands::Evaluate { dataset, constants } => {
            commands::evaluate::run(&dataset, &constants, &config)
        }
        Commands::Check {
            constraints,
            dataset,
        } => commands::check::run(&constraints, dataset.as_deref(), &config),
        Commands::Synth {
            constants,
            samples,
            seed,
            noise,
            output,
        } => commands::synth::run(&constants, samples, seed, noise, &output),
    }
}
