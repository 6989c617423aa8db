//! # Vehicle Models (L2: Business Logic)
//!
//! Kinematic vehicle dynamics and their calibration to logged driving data.
//!
//! This crate provides:
//! - Named physical constants with a validated drivetrain mode
//! - The slipless kinematic bicycle step function
//! - Single-step residual evaluation over a dataset of transitions
//! - Box-constrained calibration of the constants, with a categorical
//!   sweep over the drivetrain mode
//! - Synthetic dataset generation for regression testing
//!
//! ## Design Principles
//!
//! - **Named structures internally**, flat `[f64; 9]` vectors only at the
//!   optimiser boundary
//! - **Exhaustive enum dispatch** for the drivetrain mode
//! - **Singularities as branches**: the dynamics never produce NaN for
//!   finite, valid inputs
//!
//! ## Example
//!
//! ```
//! use vehicle_core::types::{ControlAction, VehicleState};
//! use vehicle_models::models::{step, ModelConstants};
//!
//! let constants = ModelConstants::<f64>::default();
//! let state = VehicleState::new(0.0, 0.0, 0.0, 5.0);
//! let next = step(&state, &ControlAction::new(0.0, 10.0), 0.1, &constants);
//!
//! assert!(next.speed >= 0.0);
//! assert_eq!(next.yaw, 0.0);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod calibration;
pub mod models;
