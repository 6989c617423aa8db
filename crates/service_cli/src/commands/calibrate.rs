//! Calibrate command implementation
//!
//! Fits the model constants to a logged dataset within the box given by a
//! constraint file.

use std::path::Path;

use adapter_loader::{load_constraints, load_dataset};
use tracing::{info, warn};
use vehicle_models::calibration::{ResidualEvaluator, VehicleCalibrator, VehicleCalibratorConfig};

use super::require_file;
use crate::config::RunConfig;
use crate::output::{CalibrationReport, Render};
use crate::Result;

/// Load both inputs, calibrate and build the report.
///
/// With `strict`, a run that does not converge is an error instead of a
/// report with `converged = false`.
pub fn calibrate_files(
    constraints: &Path,
    dataset: &Path,
    strict: bool,
    config: &RunConfig,
) -> Result<CalibrationReport> {
    require_file(constraints)?;
    require_file(dataset)?;

    let specs = load_constraints(constraints)?;
    let data = load_dataset(dataset)?;
    info!(
        samples = data.len(),
        free = specs.free_count(),
        "Inputs loaded"
    );

    let evaluator = ResidualEvaluator::new(&data).with_parallel_threshold(config.parallel_threshold);
    let calibrator = VehicleCalibrator::new(VehicleCalibratorConfig::new(config.solver.to_lbfgs()));
    let result = if strict {
        calibrator.calibrate_or_error(&evaluator, &specs)?
    } else {
        calibrator.calibrate(&evaluator, &specs)?
    };

    let breakdown = evaluator.breakdown(result.params());
    Ok(CalibrationReport::new(&result, &breakdown))
}

/// Run the calibrate command
pub fn run(
    constraints: &Path,
    dataset: &Path,
    output: Option<&Path>,
    strict: bool,
    config: &RunConfig,
) -> Result<()> {
    info!(
        constraints = %constraints.display(),
        dataset = %dataset.display(),
        "Starting calibration"
    );

    let report = calibrate_files(constraints, dataset, strict, config)?;
    if !report.converged {
        warn!("Best estimate reported without convergence");
    }
    println!("{}", report.render(config.output_format)?);

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!(path = %path.display(), "Calibrated constants written");
    }

    info!("Calibration complete");
    Ok(())
}
