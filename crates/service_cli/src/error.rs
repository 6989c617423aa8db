//! CLI error type.

use adapter_loader::LoaderError;
use thiserror::Error;
use vehicle_core::types::ModelError;
use vehicle_models::calibration::CalibrationError;

use crate::config::ConfigError;

/// Errors surfaced by `slipcal` commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
