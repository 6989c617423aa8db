//! Error types for structured error handling.
//!
//! This module provides:
//! - `ModelError`: Invalid parameter vectors handed to the vehicle model
//! - `SolverError`: Minimisation problems the solvers refuse to start

use thiserror::Error;

/// Errors raised when a parameter vector cannot drive the vehicle model.
///
/// Numerical singularities inside the dynamics (zero steering, equal speeds,
/// degenerate denominators) are handled by explicit branches and never
/// produce this error.
///
/// # Examples
/// ```
/// use vehicle_core::types::ModelError;
///
/// let err = ModelError::invalid_parameter("torque_mode", 5.0, "expected 0 (AWD), 1 (FWD) or 2 (RWD)");
/// assert!(format!("{}", err).contains("torque_mode"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelError {
    /// A parameter holds a value the model cannot interpret.
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Offending value
        value: f64,
        /// Why the value was rejected
        reason: String,
    },

    /// A flattened vector has the wrong number of entries.
    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },
}

impl ModelError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &str, value: f64, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        ModelError::DimensionMismatch { expected, actual }
    }
}

/// Solver error types.
///
/// Only conditions that make the problem ill-posed are errors. Running out of
/// iterations or evaluations is reported through the result's `converged`
/// flag instead.
///
/// # Examples
/// ```
/// use vehicle_core::types::SolverError;
///
/// let err = SolverError::InfeasibleBounds { index: 2, lower: 1.0, upper: 0.0 };
/// assert!(format!("{}", err).contains("index 2"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// No parameters to optimise.
    #[error("Empty parameter vector")]
    EmptyProblem,

    /// Parameter and bounds vectors disagree in length.
    #[error("Bounds length {bounds} does not match parameter length {params}")]
    BoundsMismatch {
        /// Number of parameters
        params: usize,
        /// Number of bounds
        bounds: usize,
    },

    /// Lower bound above upper bound, or a non-finite bound.
    #[error("Infeasible bounds at index {index}: [{lower}, {upper}]")]
    InfeasibleBounds {
        /// Parameter index
        index: usize,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// The objective is not finite at the (projected) starting point.
    #[error("Objective is not finite at the starting point: {value}")]
    NonFiniteStart {
        /// Objective value returned
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = ModelError::invalid_parameter("torque_mode", 5.0, "not a drivetrain");
        let msg = err.to_string();
        assert!(msg.contains("torque_mode"));
        assert!(msg.contains('5'));
        assert!(msg.contains("not a drivetrain"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = ModelError::dimension_mismatch(9, 8);
        assert_eq!(err.to_string(), "Dimension mismatch: expected 9 values, got 8");
    }

    #[test]
    fn test_solver_error_display() {
        assert_eq!(SolverError::EmptyProblem.to_string(), "Empty parameter vector");
        let err = SolverError::BoundsMismatch { params: 3, bounds: 2 };
        assert!(err.to_string().contains("3"));
        let err = SolverError::NonFiniteStart { value: f64::NAN };
        assert!(err.to_string().contains("NaN"));
    }
}
