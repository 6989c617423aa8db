//! Optimisation solvers for model calibration.
//!
//! ## Available Solvers
//!
//! - [`ProjectedLbfgsSolver`]: Limited-memory quasi-Newton minimisation inside
//!   a box, with finite-difference gradients
//!
//! ## Configuration
//!
//! The solver uses [`LbfgsConfig`]:
//! - `tolerance`: Relative objective reduction that ends the run (default: 1e-10)
//! - `gradient_tolerance`: Projected gradient norm that ends the run (default: 1e-10)
//! - `max_iterations` / `max_evaluations`: Budget (default: 500 / 20 000)
//!
//! ## Fixed Parameters
//!
//! A parameter whose bounds collapse to a point (`min == max`) is never
//! perturbed, neither by the gradient probes nor by the line search.
//!
//! ## Example
//!
//! ```
//! use vehicle_core::math::solvers::{LbfgsConfig, ProjectedLbfgsSolver};
//! use vehicle_core::traits::calibration::ParameterBounds;
//!
//! // Minimise (p[0] - 2)² + (p[1] - 3)² with p[1] pinned at 5
//! let bounds = [ParameterBounds::new(-10.0, 10.0), ParameterBounds::fixed(5.0)];
//! let solver = ProjectedLbfgsSolver::new(LbfgsConfig::default());
//! let result = solver
//!     .minimize(|p: &[f64]| (p[0] - 2.0).powi(2) + (p[1] - 3.0).powi(2), vec![0.0, 5.0], &bounds)
//!     .unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! assert_eq!(result.params[1], 5.0);
//! ```

mod projected_lbfgs;

pub use projected_lbfgs::{LbfgsConfig, LbfgsResult, ProjectedLbfgsSolver, Termination};
