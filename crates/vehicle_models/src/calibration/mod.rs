//! Calibration of the vehicle model against logged transitions.
//!
//! This module provides:
//! - [`ParameterSpec`] / [`ParameterSpecSet`]: Fixed or bounded constants
//! - [`TrainingSample`] / [`Dataset`]: Logged single-step transitions
//! - [`ResidualEvaluator`]: Sum-of-squares single-step loss
//! - [`VehicleCalibrator`]: Box-constrained calibration with a sweep over
//!   the drivetrain mode
//! - [`SyntheticDatasetBuilder`]: Data generated by the model itself
//!
//! ## Data flow
//!
//! ```text
//! ParameterSpecSet ──► bounds, initial guess ──► VehicleCalibrator
//!                                                    │   ▲
//!                                   ModelConstants   ▼   │ loss
//!                                               ResidualEvaluator ◄── Dataset
//! ```
//!
//! ## Example
//!
//! ```
//! use vehicle_models::calibration::{
//!     ParameterSpec, ParameterSpecSet, ResidualEvaluator, SyntheticDatasetBuilder,
//!     VehicleCalibrator,
//! };
//! use vehicle_models::models::ModelConstants;
//!
//! let truth = ModelConstants::default();
//! let dataset = SyntheticDatasetBuilder::new(truth).with_samples(100).build().unwrap();
//!
//! let specs = ParameterSpecSet::all_fixed(&truth)
//!     .with_spec(0, ParameterSpec::bounded(0.0, 0.05))
//!     .unwrap();
//!
//! let evaluator = ResidualEvaluator::new(&dataset);
//! let result = VehicleCalibrator::with_defaults().calibrate(&evaluator, &specs).unwrap();
//! assert!((result.parameters.understeer_slope - 0.01).abs() < 1e-4);
//! ```

mod calibrator;
mod error;
mod residual;
mod result;
mod sample;
mod scaling;
mod spec;
mod synthetic;

pub use calibrator::{VehicleCalibrator, VehicleCalibratorConfig};
pub use error::CalibrationError;
pub use residual::{Objective, ResidualBreakdown, ResidualEvaluator, DEFAULT_PARALLEL_THRESHOLD};
pub use result::{CalibrationDiagnostics, CalibrationResult, ModeOutcome};
pub use sample::{from_schema_order, to_schema_order, Dataset, TrainingSample};
pub use scaling::UnitScaling;
pub use spec::{ParameterSpec, ParameterSpecSet};
pub use synthetic::SyntheticDatasetBuilder;
