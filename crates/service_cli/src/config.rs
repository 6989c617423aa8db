//! Run configuration
//!
//! Sources, highest priority first:
//! 1. CLI arguments
//! 2. `SLIPCAL_*` environment variables
//! 3. TOML file (`--config`, or `slipcal.toml` in the working directory)
//! 4. Defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use vehicle_core::math::solvers::LbfgsConfig;
use vehicle_models::calibration::DEFAULT_PARALLEL_THRESHOLD;

/// File looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "slipcal.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid output format: {0}. Must be one of: json, table")]
    InvalidOutputFormat(String),

    #[error("Invalid solver setting {name} = {value}: {reason}")]
    InvalidSolverSetting {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Directive understood by `EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_filter_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidLogLevel(s.to_string()))
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(ConfigError::InvalidOutputFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, ConfigError> {
        value.parse()
    }
}

/// Solver settings, the `[solver]` table
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub gradient_tolerance: f64,
    pub max_iterations: usize,
    pub max_evaluations: usize,
    pub history_size: usize,
    pub finite_diff_step: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let lbfgs = LbfgsConfig::default();
        Self {
            tolerance: lbfgs.tolerance,
            gradient_tolerance: lbfgs.gradient_tolerance,
            max_iterations: lbfgs.max_iterations,
            max_evaluations: lbfgs.max_evaluations,
            history_size: lbfgs.history_size,
            finite_diff_step: lbfgs.finite_diff_step,
        }
    }
}

impl SolverSettings {
    /// Solver configuration with these settings; line search constants
    /// keep their defaults.
    pub fn to_lbfgs(&self) -> LbfgsConfig {
        LbfgsConfig {
            tolerance: self.tolerance,
            gradient_tolerance: self.gradient_tolerance,
            max_iterations: self.max_iterations,
            max_evaluations: self.max_evaluations,
            history_size: self.history_size,
            finite_diff_step: self.finite_diff_step,
            ..LbfgsConfig::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidSolverSetting {
                    name,
                    value: value.to_string(),
                    reason: "must be finite and positive",
                })
            }
        };
        let nonzero = |name, value: usize| {
            if value > 0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidSolverSetting {
                    name,
                    value: value.to_string(),
                    reason: "must be at least 1",
                })
            }
        };

        positive("tolerance", self.tolerance)?;
        if !(self.gradient_tolerance.is_finite() && self.gradient_tolerance >= 0.0) {
            return Err(ConfigError::InvalidSolverSetting {
                name: "gradient_tolerance",
                value: self.gradient_tolerance.to_string(),
                reason: "must be finite and non-negative",
            });
        }
        positive("finite_diff_step", self.finite_diff_step)?;
        nonzero("max_iterations", self.max_iterations)?;
        nonzero("max_evaluations", self.max_evaluations)?;
        nonzero("history_size", self.history_size)
    }
}

/// Run configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: LogLevel,
    /// Solver settings
    pub solver: SolverSettings,
    /// Dataset size from which residuals are evaluated in parallel
    pub parallel_threshold: usize,
    /// Report format
    pub output_format: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            solver: SolverSettings::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            output_format: OutputFormat::Table,
        }
    }
}

impl RunConfig {
    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Apply `SLIPCAL_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `SLIPCAL_*` overrides read through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &str, raw: String) -> Result<T, ConfigError> {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("{key}={raw} is not a valid value")))
        }

        if let Some(level) = lookup("SLIPCAL_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(format) = lookup("SLIPCAL_OUTPUT_FORMAT") {
            self.output_format = OutputFormat::from_str(&format)?;
        }
        if let Some(raw) = lookup("SLIPCAL_PARALLEL_THRESHOLD") {
            self.parallel_threshold = parsed("SLIPCAL_PARALLEL_THRESHOLD", raw)?;
        }
        if let Some(raw) = lookup("SLIPCAL_TOLERANCE") {
            self.solver.tolerance = parsed("SLIPCAL_TOLERANCE", raw)?;
        }
        if let Some(raw) = lookup("SLIPCAL_GRADIENT_TOLERANCE") {
            self.solver.gradient_tolerance = parsed("SLIPCAL_GRADIENT_TOLERANCE", raw)?;
        }
        if let Some(raw) = lookup("SLIPCAL_MAX_ITERATIONS") {
            self.solver.max_iterations = parsed("SLIPCAL_MAX_ITERATIONS", raw)?;
        }
        if let Some(raw) = lookup("SLIPCAL_MAX_EVALUATIONS") {
            self.solver.max_evaluations = parsed("SLIPCAL_MAX_EVALUATIONS", raw)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(format) = &cli.output_format {
            self.output_format = OutputFormat::from_str(format)?;
        }
        if let Some(iterations) = cli.max_iterations {
            self.solver.max_iterations = iterations;
        }
        Ok(())
    }
}

/// Global CLI arguments that feed the configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Output format override
    pub output_format: Option<String>,
    /// Iteration budget override
    pub max_iterations: Option<usize>,
}

/// Build configuration from all sources
pub fn build_config(cli: &CliOverrides) -> Result<RunConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => RunConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            RunConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => RunConfig::default(),
    };

    config.apply_env()?;
    config.merge_with_cli(cli)?;
    config.validate()?;
    Ok(config)
}
