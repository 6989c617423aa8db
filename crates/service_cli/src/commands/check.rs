//! Check command implementation
//!
//! Validates a constraint file, and optionally a dataset, without
//! running the optimiser.

use std::path::Path;

use adapter_loader::{load_constraints, load_dataset};
use tracing::info;

use super::require_file;
use crate::config::RunConfig;
use crate::output::{CheckReport, Render};
use crate::Result;

/// Load and validate the inputs.
pub fn check_files(constraints: &Path, dataset: Option<&Path>) -> Result<CheckReport> {
    require_file(constraints)?;
    let specs = load_constraints(constraints)?;
    let modes = specs.torque_modes()?;

    let samples = match dataset {
        Some(path) => {
            require_file(path)?;
            Some(load_dataset(path)?.len())
        }
        None => None,
    };

    Ok(CheckReport::new(&specs, &modes, samples))
}

/// Run the check command
pub fn run(constraints: &Path, dataset: Option<&Path>, config: &RunConfig) -> Result<()> {
    info!(constraints = %constraints.display(), "Checking inputs");
    let report = check_files(constraints, dataset)?;
    println!("{}", report.render(config.output_format)?);
    info!("Inputs are valid");
    Ok(())
}
