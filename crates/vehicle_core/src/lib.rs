//! # vehicle_core: Foundation for Kinematic Model Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! vehicle_core is the bottom layer of the slipcal workspace, providing:
//! - Planar vehicle state and control types (`types::state`)
//! - Error types: `ModelError`, `SolverError` (`types::error`)
//! - Parameter bounds and calibration settings (`traits::calibration`)
//! - Box-constrained quasi-Newton minimisation (`math::solvers`)
//!
//! ## Dependencies
//!
//! Nothing from the rest of the workspace. External crates are kept to:
//! - num-traits: `Float` bound of the state types
//! - thiserror: error enums
//! - tracing: one debug event per solver iteration
//! - serde (optional): derives on the plain data types
//!
//! ## Usage Examples
//!
//! ```rust
//! use vehicle_core::math::solvers::{LbfgsConfig, ProjectedLbfgsSolver};
//! use vehicle_core::traits::calibration::ParameterBounds;
//!
//! // Minimise (p0 - 0.3)^2 + (p1 - 2)^2 with p1 capped at 1
//! let bounds = vec![ParameterBounds::new(0.0, 1.0), ParameterBounds::new(0.0, 1.0)];
//! let solver = ProjectedLbfgsSolver::new(LbfgsConfig::default());
//! let result = solver
//!     .minimize(|p: &[f64]| (p[0] - 0.3).powi(2) + (p[1] - 2.0).powi(2), vec![0.5, 0.5], &bounds)
//!     .unwrap();
//!
//! assert!((result.params[0] - 0.3).abs() < 1e-6);
//! assert_eq!(result.params[1], 1.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for state, action and bounds types

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod traits;
pub mod types;
