//! Vehicle dynamics.
//!
//! This module provides the single-step motion model used for calibration:
//! - [`ModelConstants`]: The nine named physical constants
//! - [`TorqueMode`]: Drivetrain configuration with exhaustive dispatch
//! - [`step`]: Slipless kinematic bicycle step
//!
//! ## Example
//!
//! ```
//! use vehicle_core::types::{ControlAction, VehicleState};
//! use vehicle_models::models::{step_vector, ModelConstants};
//!
//! let mut flat = ModelConstants::<f64>::default().to_array();
//! flat[5] = 5.0; // not a drivetrain mode
//!
//! let result = step_vector(&VehicleState::zero(), &ControlAction::zero(), 0.1, &flat);
//! assert!(result.is_err());
//! ```

pub mod constants;
pub mod slipless;

pub use constants::{
    ModelConstants, TorqueMode, PARAMETER_COUNT, PARAMETER_NAMES, TORQUE_MODE_INDEX,
};
pub use slipless::{angular_speed, drive_force, mean_speed, slip_angle, step, step_vector};
