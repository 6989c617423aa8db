//! Core value types shared by every slipcal crate.
//!
//! - [`VehicleState`] and [`ControlAction`]: one-step model inputs and outputs
//! - [`ModelError`]: invalid model parameters reaching the dynamics
//! - [`SolverError`]: problems rejected by the minimisers

pub mod error;
pub mod state;

pub use error::{ModelError, SolverError};
pub use state::{ControlAction, VehicleState};
