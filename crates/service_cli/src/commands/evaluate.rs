//! Evaluate command implementation
//!
//! Scores a given set of constants against a dataset without fitting.

use std::path::Path;

use adapter_loader::load_dataset;
use tracing::info;
use vehicle_models::calibration::ResidualEvaluator;

use super::{parse_constants, require_file};
use crate::config::RunConfig;
use crate::output::{EvaluationReport, Render};
use crate::Result;

/// Load the dataset and score `constants` on it.
pub fn evaluate_file(dataset: &Path, constants: &str, config: &RunConfig) -> Result<EvaluationReport> {
    require_file(dataset)?;
    let constants = parse_constants(constants)?;
    let data = load_dataset(dataset)?;

    let evaluator = ResidualEvaluator::new(&data).with_parallel_threshold(config.parallel_threshold);
    let breakdown = evaluator.breakdown(&constants);
    Ok(EvaluationReport::new(&constants, &breakdown))
}

/// Run the evaluate command
pub fn run(dataset: &Path, constants: &str, config: &RunConfig) -> Result<()> {
    info!(dataset = %dataset.display(), "Evaluating constants");
    let report = evaluate_file(dataset, constants, config)?;
    println!("{}", report.render(config.output_format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::synth;
    use crate::CliError;

    #[test]
    fn test_true_constants_score_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        synth::run("default", 20, 3, 0.0, &path).unwrap();

        let report = evaluate_file(&path, "default", &RunConfig::default()).unwrap();
        assert_eq!(report.residuals.samples, 20);
        assert!(report.residuals.loss < 1e-20);

        let off = evaluate_file(&path, "0.01,0.8,0.75,4,230,0,0.2,280,120", &RunConfig::default()).unwrap();
        assert!(off.residuals.loss > report.residuals.loss);
    }

    #[test]
    fn test_bad_constants_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        synth::run("default", 5, 3, 0.0, &path).unwrap();

        let result = evaluate_file(&path, "0.01,0.8,0.75,4,230,3,0.2,280,50", &RunConfig::default());
        assert!(matches!(result, Err(CliError::Model(_))));
    }
}
