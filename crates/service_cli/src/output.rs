//! Report types and their JSON/table renderings.

use serde::Serialize;
use vehicle_models::calibration::{CalibrationResult, ParameterSpec, ParameterSpecSet, ResidualBreakdown};
use vehicle_models::models::{ModelConstants, TorqueMode, PARAMETER_NAMES};

use crate::config::OutputFormat;
use crate::Result;

/// Names of the residual components, in dataset column order.
const COMPONENTS: [&str; 4] = ["x", "y", "v", "yaw"];

/// One line per entry, each newline-terminated.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

/// A report printable as JSON or as a table.
pub trait Render: Serialize {
    /// Human-readable table.
    fn table(&self) -> String;

    /// Render in the configured format.
    fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Table => Ok(self.table()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: &'static str,
    pub value: f64,
}

fn named_constants(constants: &ModelConstants<f64>) -> Vec<NamedValue> {
    constants
        .named()
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualReport {
    pub samples: usize,
    pub loss: f64,
    pub rmse: f64,
    pub max_abs_error: f64,
    pub component_rmse: Vec<NamedValue>,
}

impl From<&ResidualBreakdown> for ResidualReport {
    fn from(breakdown: &ResidualBreakdown) -> Self {
        Self {
            samples: breakdown.sample_count,
            loss: breakdown.loss,
            rmse: breakdown.rmse(),
            max_abs_error: breakdown.max_abs_error(),
            component_rmse: COMPONENTS
                .iter()
                .zip(breakdown.component_rmse())
                .map(|(&name, value)| NamedValue { name, value })
                .collect(),
        }
    }
}

impl ResidualReport {
    fn write_table(&self, out: &mut Vec<String>) {
        out.push(format!("{:<24} {}", "samples", self.samples));
        out.push(format!("{:<24} {:.6e}", "loss", self.loss));
        out.push(format!("{:<24} {:.6e}", "rmse", self.rmse));
        out.push(format!("{:<24} {:.6e}", "max abs error", self.max_abs_error));
        for component in &self.component_rmse {
            out.push(format!("{:<24} {:.6e}", format!("rmse[{}]", component.name), component.value));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeReport {
    pub mode: String,
    pub loss: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub constants: Vec<NamedValue>,
    pub torque_mode: String,
    pub converged: bool,
    pub termination: Option<String>,
    pub iterations: usize,
    pub evaluations: usize,
    pub duration_ms: f64,
    pub mode_outcomes: Vec<ModeReport>,
    pub residuals: ResidualReport,
}

impl CalibrationReport {
    pub fn new(result: &CalibrationResult<ModelConstants<f64>>, breakdown: &ResidualBreakdown) -> Self {
        let diagnostics = result.diagnostics();
        Self {
            constants: named_constants(result.params()),
            torque_mode: result.params().torque_mode.to_string(),
            converged: result.converged,
            termination: diagnostics.termination.map(|t| format!("{t:?}")),
            iterations: diagnostics.iterations,
            evaluations: diagnostics.evaluations,
            duration_ms: diagnostics.duration.as_secs_f64() * 1e3,
            mode_outcomes: diagnostics
                .mode_outcomes
                .iter()
                .map(|outcome| ModeReport {
                    mode: outcome.mode.to_string(),
                    loss: outcome.loss,
                    converged: outcome.converged,
                })
                .collect(),
            residuals: ResidualReport::from(breakdown),
        }
    }
}

impl Render for CalibrationReport {
    fn table(&self) -> String {
        let mut out = Vec::new();
        out.push("Calibrated constants".to_string());
        out.push("-".repeat(40));
        for constant in &self.constants {
            out.push(format!("{:<24} {:>15.8}", constant.name, constant.value));
        }
        out.push(format!("{:<24} {:>15}", "drivetrain", self.torque_mode));
        out.push("-".repeat(40));
        out.push(format!("{:<24} {}", "converged", self.converged));
        if let Some(termination) = &self.termination {
            out.push(format!("{:<24} {}", "termination", termination));
        }
        out.push(format!("{:<24} {}", "iterations", self.iterations));
        out.push(format!("{:<24} {}", "evaluations", self.evaluations));
        out.push(format!("{:<24} {:.1} ms", "duration", self.duration_ms));
        if self.mode_outcomes.len() > 1 {
            for outcome in &self.mode_outcomes {
                out.push(format!(
                    "{:<24} {:.6e}{}",
                    format!("loss[{}]", outcome.mode),
                    outcome.loss,
                    if outcome.converged { "" } else { " (not converged)" }
                ));
            }
        }
        self.residuals.write_table(&mut out);
        join_lines(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub constants: Vec<NamedValue>,
    pub residuals: ResidualReport,
}

impl EvaluationReport {
    pub fn new(constants: &ModelConstants<f64>, breakdown: &ResidualBreakdown) -> Self {
        Self {
            constants: named_constants(constants),
            residuals: ResidualReport::from(breakdown),
        }
    }
}

impl Render for EvaluationReport {
    fn table(&self) -> String {
        let mut out = Vec::new();
        for constant in &self.constants {
            out.push(format!("{:<24} {:>15.8}", constant.name, constant.value));
        }
        out.push("-".repeat(40));
        self.residuals.write_table(&mut out);
        join_lines(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintReport {
    pub name: &'static str,
    pub label: String,
    pub fixed: Option<f64>,
    pub bounds: Option<[f64; 2]>,
    pub initial_guess: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub constraints: Vec<ConstraintReport>,
    pub free_parameters: usize,
    pub torque_modes: Vec<String>,
    pub dataset_samples: Option<usize>,
}

impl CheckReport {
    pub fn new(specs: &ParameterSpecSet, modes: &[TorqueMode], dataset_samples: Option<usize>) -> Self {
        let guess = specs.initial_guess();
        let constraints = specs
            .specs()
            .iter()
            .zip(specs.labels())
            .enumerate()
            .map(|(slot, (spec, label))| {
                let (fixed, bounds) = match *spec {
                    ParameterSpec::Fixed(value) => (Some(value), None),
                    ParameterSpec::Bounded { lo, hi } => (None, Some([lo, hi])),
                };
                ConstraintReport {
                    name: PARAMETER_NAMES[slot],
                    label: label.clone(),
                    fixed,
                    bounds,
                    initial_guess: guess[slot],
                }
            })
            .collect();

        Self {
            constraints,
            free_parameters: specs.free_count(),
            torque_modes: modes.iter().map(ToString::to_string).collect(),
            dataset_samples,
        }
    }
}

impl Render for CheckReport {
    fn table(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("{:<24} {:<20} {:>12}", "constant", "constraint", "start"));
        out.push("-".repeat(58));
        for c in &self.constraints {
            let constraint = match (c.fixed, c.bounds) {
                (Some(value), _) => format!("fixed {value}"),
                (None, Some([lo, hi])) => format!("[{lo}, {hi}]"),
                (None, None) => String::new(),
            };
            out.push(format!("{:<24} {:<20} {:>12.6}", c.name, constraint, c.initial_guess));
        }
        out.push("-".repeat(58));
        out.push(format!("{:<24} {}", "free parameters", self.free_parameters));
        out.push(format!("{:<24} {}", "drivetrain modes", self.torque_modes.join(", ")));
        if let Some(samples) = self.dataset_samples {
            out.push(format!("{:<24} {}", "dataset samples", samples));
        }
        join_lines(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehicle_models::calibration::{ResidualEvaluator, SyntheticDatasetBuilder};

    fn breakdown() -> ResidualBreakdown {
        let truth = ModelConstants::default();
        let dataset = SyntheticDatasetBuilder::new(truth).with_samples(10).build().unwrap();
        let probe = ModelConstants {
            rolling_drag: 80.0,
            ..truth
        };
        ResidualEvaluator::new(&dataset).breakdown(&probe)
    }

    #[test]
    fn test_evaluation_report_json() {
        let report = EvaluationReport::new(&ModelConstants::default(), &breakdown());
        let json = report.render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["constants"].as_array().unwrap().len(), 9);
        assert_eq!(value["constants"][7]["name"], "car_mass");
        assert_eq!(value["residuals"]["samples"], 10);
        assert_eq!(value["residuals"]["component_rmse"][2]["name"], "v");
        assert!(value["residuals"]["loss"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_evaluation_report_table() {
        let report = EvaluationReport::new(&ModelConstants::default(), &breakdown());
        let table = report.render(OutputFormat::Table).unwrap();
        assert!(table.contains("rolling_drag"));
        assert!(table.contains("rmse[yaw]"));
    }

    #[test]
    fn test_table_has_one_row_per_entry() {
        let report = EvaluationReport::new(&ModelConstants::default(), &breakdown());
        let table = report.table();

        assert!(table.ends_with('\n'));
        // 9 constants, a rule, 4 summary rows, 4 component rows
        assert_eq!(table.lines().count(), 18);
        assert!(table.lines().nth(9).unwrap().chars().all(|c| c == '-'));
        assert!(table.lines().last().unwrap().starts_with("rmse[yaw]"));
    }

    #[test]
    fn test_check_report() {
        let specs = ParameterSpecSet::all_fixed(&ModelConstants::default())
            .with_spec(8, ParameterSpec::bounded(0.0, 200.0))
            .unwrap();
        let report = CheckReport::new(&specs, &[TorqueMode::Awd], Some(42));

        assert_eq!(report.free_parameters, 1);
        assert_eq!(report.constraints[8].bounds, Some([0.0, 200.0]));
        assert_eq!(report.constraints[8].initial_guess, 100.0);
        assert_eq!(report.constraints[7].fixed, Some(280.0));

        let table = report.table();
        assert!(table.contains("[0, 200]"));
        assert!(table.contains("AWD"));
        assert!(table.contains("42"));
    }
}
