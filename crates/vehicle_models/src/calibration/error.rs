//! Calibration error types.

use thiserror::Error;
use vehicle_core::types::{ModelError, SolverError};

/// Calibration error type.
///
/// Configuration problems are raised before the first objective
/// evaluation. Non-convergence only becomes an error through
/// [`crate::calibration::VehicleCalibrator::calibrate_or_error`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Parameter specifications are inconsistent
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the inconsistency
        message: String,
    },

    /// Model constants rejected during evaluation
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The solver refused the problem
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Not enough samples to calibrate
    #[error("Insufficient data (required: {required}, provided: {provided})")]
    InsufficientData {
        /// Minimum required samples
        required: usize,
        /// Samples provided
        provided: usize,
    },

    /// The solver stopped without converging
    ///
    /// Carries the best parameters found so callers can still use them.
    #[error("Calibration did not converge (iterations: {iterations}, loss: {loss:.6e})")]
    NotConverged {
        /// Number of iterations performed
        iterations: usize,
        /// Best loss reached
        loss: f64,
        /// Best flat constants vector found
        parameters: Vec<f64>,
    },
}

impl CalibrationError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        CalibrationError::Configuration {
            message: message.into(),
        }
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, provided: usize) -> Self {
        CalibrationError::InsufficientData { required, provided }
    }

    /// Check if this error was raised before any optimisation work.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            CalibrationError::Configuration { .. }
                | CalibrationError::InsufficientData { .. }
                | CalibrationError::Solver(_)
        )
    }
}
