//! # adapter_loader: Input Adapters
//!
//! ## A Layer (Adapter) Role
//!
//! Turns files on disk into the validated types of vehicle_models:
//! - Constraint files into a [`ParameterSpecSet`](vehicle_models::calibration::ParameterSpecSet)
//!   (`constraints`)
//! - Transition tables into a [`Dataset`](vehicle_models::calibration::Dataset) and
//!   back (`dataset`)
//!
//! Every error is raised while loading, before any calibration work starts.
//!
//! ## Usage Examples
//!
//! ```rust
//! use adapter_loader::parse_constraints;
//!
//! let text = "\
//! understeer_slope [0,0.05]
//! cg_to_front [0.5, 2.5]
//! cg_to_rear [0.5,2.5]
//! gear_ratio 4
//! saturating_motor_torque 230
//! torque_mode 0
//! wheel_radius 0.2
//! car_mass 280
//! rolling_drag [0,200]
//! ";
//! let specs = parse_constraints(text).unwrap();
//! assert_eq!(specs.initial_guess()[1], 1.5);
//! assert_eq!(specs.free_count(), 4);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod constraints;
pub mod dataset;
pub mod error;

pub use constraints::{load_constraints, parse_constraints};
pub use dataset::{load_dataset, read_dataset, save_dataset, write_dataset, DatasetRecord, REQUIRED_COLUMNS};
pub use error::LoaderError;
