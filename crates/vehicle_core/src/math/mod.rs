//! Numerical building blocks.
//!
//! - [`solvers`]: box-constrained minimisation used by model calibration

pub mod solvers;
