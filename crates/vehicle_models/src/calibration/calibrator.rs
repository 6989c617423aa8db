//! Calibration of the model constants against an objective.
//!
//! This module wires a [`ParameterSpecSet`] and an [`Objective`] into the
//! projected L-BFGS solver from vehicle_core:
//!
//! 1. The box is mapped to unit coordinates ([`UnitScaling`]), fixed slots
//!    collapse to a point and are never probed.
//! 2. The drivetrain mode is categorical, so it is never handed to the
//!    solver as a continuous variable. Each admitted mode is solved with
//!    the mode held fixed and the lowest loss wins.
//! 3. Non-convergence is reported through `converged = false` and a
//!    warning; [`VehicleCalibrator::calibrate_or_error`] turns it into an
//!    error.

use std::time::Instant;

use tracing::{debug, info, warn};
use vehicle_core::math::solvers::{LbfgsConfig, LbfgsResult, ProjectedLbfgsSolver};
use vehicle_core::traits::calibration::{CalibrationConfig, ParameterBounds};
use vehicle_core::types::ModelError;

use super::error::CalibrationError;
use super::residual::Objective;
use super::result::{CalibrationDiagnostics, CalibrationResult, ModeOutcome};
use super::scaling::UnitScaling;
use super::spec::ParameterSpecSet;
use crate::models::{ModelConstants, TorqueMode, TORQUE_MODE_INDEX};

/// Configuration for the vehicle calibrator.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCalibratorConfig {
    /// Solver configuration, applied to each drivetrain mode solved.
    pub solver: LbfgsConfig,
    /// Minimum number of scalar residuals the objective must provide.
    pub min_observations: usize,
}

impl Default for VehicleCalibratorConfig {
    fn default() -> Self {
        Self {
            solver: LbfgsConfig::default(),
            min_observations: 1,
        }
    }
}

impl VehicleCalibratorConfig {
    /// Create a new configuration.
    pub fn new(solver: LbfgsConfig) -> Self {
        Self {
            solver,
            ..Default::default()
        }
    }

    /// Create from CalibrationConfig.
    pub fn from_calibration_config(config: &CalibrationConfig) -> Self {
        Self::new(LbfgsConfig::from_calibration_config(config))
    }

    /// Set the minimum number of scalar residuals.
    pub fn with_min_observations(mut self, min_observations: usize) -> Self {
        self.min_observations = min_observations;
        self
    }
}

#[derive(Debug)]
struct ModeSolve {
    constants: ModelConstants<f64>,
    solver: LbfgsResult,
}

/// Calibrates [`ModelConstants`] to minimise an [`Objective`].
///
/// # Example
///
/// ```
/// use vehicle_core::types::{ControlAction, VehicleState};
/// use vehicle_models::calibration::{
///     Dataset, ParameterSpec, ParameterSpecSet, ResidualEvaluator, TrainingSample, VehicleCalibrator,
/// };
/// use vehicle_models::models::{step, ModelConstants};
///
/// let truth = ModelConstants::default();
/// let dataset: Dataset = (0..20)
///     .map(|i| {
///         let state = VehicleState::new(0.0, 0.0, 0.0, 2.0 + i as f64);
///         let action = ControlAction::new(0.0, 10.0 * i as f64);
///         TrainingSample::new(state, action, 0.2, step(&state, &action, 0.2, &truth)).unwrap()
///     })
///     .collect();
///
/// // Only the rolling drag is free
/// let specs = ParameterSpecSet::all_fixed(&truth)
///     .with_spec(8, ParameterSpec::bounded(0.0, 200.0))
///     .unwrap();
///
/// let evaluator = ResidualEvaluator::new(&dataset);
/// let result = VehicleCalibrator::with_defaults().calibrate(&evaluator, &specs).unwrap();
/// assert!((result.parameters.rolling_drag - 50.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VehicleCalibrator {
    config: VehicleCalibratorConfig,
}

impl VehicleCalibrator {
    /// Create a new calibrator.
    pub fn new(config: VehicleCalibratorConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the configuration.
    pub fn config(&self) -> &VehicleCalibratorConfig {
        &self.config
    }

    /// Calibrate the constants inside `specs`.
    ///
    /// Returns the best constants found. A run that stops on its budget is
    /// still `Ok`, with `converged == false`.
    ///
    /// # Errors
    ///
    /// - [`CalibrationError::InsufficientData`] when the objective has too few residuals
    /// - [`CalibrationError::Model`] for a fixed torque mode outside {0, 1, 2},
    ///   or when the objective rejects a proposed vector
    /// - [`CalibrationError::Configuration`] for a torque mode interval with no mode in it
    /// - [`CalibrationError::Solver`] when the solver refuses the problem
    pub fn calibrate<O>(
        &self,
        objective: &O,
        specs: &ParameterSpecSet,
    ) -> Result<CalibrationResult<ModelConstants<f64>>, CalibrationError>
    where
        O: Objective + ?Sized,
    {
        let observations = objective.observation_count();
        if observations < self.config.min_observations {
            return Err(CalibrationError::insufficient_data(
                self.config.min_observations,
                observations,
            ));
        }

        let modes = specs.torque_modes()?;
        let started = Instant::now();
        info!(
            free_parameters = specs.free_count(),
            modes = modes.len(),
            observations,
            "starting calibration"
        );

        let mut best: Option<ModelConstants<f64>> = None;
        let mut best_loss = f64::INFINITY;
        let mut outcomes = Vec::with_capacity(modes.len());

        for mode in modes {
            let solve = self.calibrate_mode(objective, specs, mode)?;
            info!(
                mode = %mode,
                loss = solve.solver.objective,
                iterations = solve.solver.iterations,
                converged = solve.solver.converged,
                "drivetrain mode solved"
            );
            outcomes.push(ModeOutcome {
                mode,
                loss: solve.solver.objective,
                converged: solve.solver.converged,
                iterations: solve.solver.iterations,
                evaluations: solve.solver.evaluations,
                termination: solve.solver.termination,
            });

            if best.is_none() || solve.solver.objective < best_loss {
                best_loss = solve.solver.objective;
                best = Some(solve.constants);
            }
        }

        let best = best.ok_or_else(|| CalibrationError::configuration("no drivetrain mode to solve"))?;
        let diagnostics = CalibrationDiagnostics::summarise(outcomes, observations, started.elapsed());
        let result = CalibrationResult::new(best, diagnostics);

        if result.converged {
            info!(
                loss = result.loss(),
                mode = %best.torque_mode,
                "calibration converged"
            );
        } else {
            warn!(
                loss = result.loss(),
                termination = ?result.diagnostics.termination,
                "calibration did not converge, returning best estimate"
            );
        }
        Ok(result)
    }

    /// Calibrate and return [`CalibrationError::NotConverged`] on failure.
    pub fn calibrate_or_error<O>(
        &self,
        objective: &O,
        specs: &ParameterSpecSet,
    ) -> Result<CalibrationResult<ModelConstants<f64>>, CalibrationError>
    where
        O: Objective + ?Sized,
    {
        let result = self.calibrate(objective, specs)?;
        if result.converged {
            Ok(result)
        } else {
            Err(CalibrationError::NotConverged {
                iterations: result.diagnostics.iterations,
                loss: result.diagnostics.final_loss,
                parameters: result.parameters.to_array().to_vec(),
            })
        }
    }

    /// Solve with the drivetrain mode held at `mode`.
    fn calibrate_mode<O>(
        &self,
        objective: &O,
        specs: &ParameterSpecSet,
        mode: TorqueMode,
    ) -> Result<ModeSolve, CalibrationError>
    where
        O: Objective + ?Sized,
    {
        let mut bounds = specs.bounds();
        bounds[TORQUE_MODE_INDEX] = ParameterBounds::fixed(mode.to_value());
        let mut initial = specs.initial_guess();
        initial[TORQUE_MODE_INDEX] = mode.to_value();

        let scaling = UnitScaling::new(bounds);
        let unit_initial = scaling.to_unit(&initial);
        let unit_bounds = scaling.unit_bounds();
        debug!(mode = %mode, initial = ?initial, "solving drivetrain mode");

        // First rejection from the model, surfaced after the solve
        let mut model_error: Option<ModelError> = None;
        let solver = ProjectedLbfgsSolver::new(self.config.solver);
        let outcome = solver.minimize(
            |unit: &[f64]| {
                let physical = scaling.to_physical(unit);
                let loss = ModelConstants::from_slice(&physical)
                    .and_then(|constants| objective.loss(&constants));
                match loss {
                    Ok(value) => value,
                    Err(err) => {
                        model_error.get_or_insert(err);
                        f64::INFINITY
                    }
                }
            },
            unit_initial,
            &unit_bounds,
        );

        if let Some(err) = model_error {
            return Err(err.into());
        }
        let solved = outcome?;
        let constants = ModelConstants::from_slice(&scaling.to_physical(&solved.params))?;

        Ok(ModeSolve {
            constants,
            solver: solved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::spec::ParameterSpec;
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;

    /// Quadratic bowl around known constants, independent of any dataset.
    /// The drivetrain mode only enters through `mode_penalty`.
    struct Bowl {
        target: ModelConstants<f64>,
        mode_penalty: [f64; 3],
    }

    const BOWL_SCALE: [f64; 9] = [0.05, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 200.0];

    impl Objective for Bowl {
        fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError> {
            let a = constants.to_array();
            let t = self.target.to_array();
            let distance: f64 = (0..9)
                .filter(|&i| i != TORQUE_MODE_INDEX)
                .map(|i| ((a[i] - t[i]) / BOWL_SCALE[i]).powi(2))
                .sum();
            Ok(distance + self.mode_penalty[constants.torque_mode.code() as usize])
        }

        fn observation_count(&self) -> usize {
            9
        }
    }

    struct Failing;

    impl Objective for Failing {
        fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError> {
            Err(ModelError::invalid_parameter("car_mass", constants.car_mass, "rejected"))
        }

        fn observation_count(&self) -> usize {
            1
        }
    }

    struct Recording<'a, O> {
        inner: &'a O,
        seen: RefCell<Vec<[f64; 9]>>,
    }

    impl<O: Objective> Objective for Recording<'_, O> {
        fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError> {
            self.seen.borrow_mut().push(constants.to_array());
            self.inner.loss(constants)
        }

        fn observation_count(&self) -> usize {
            self.inner.observation_count()
        }
    }

    fn bowl() -> Bowl {
        Bowl {
            target: ModelConstants {
                understeer_slope: 0.02,
                cg_to_front: 1.1,
                rolling_drag: 80.0,
                ..ModelConstants::default()
            },
            mode_penalty: [0.0, 0.0, 0.0],
        }
    }

    fn bowl_specs() -> ParameterSpecSet {
        ParameterSpecSet::all_fixed(&ModelConstants::default())
            .with_spec(0, ParameterSpec::bounded(0.0, 0.05))
            .and_then(|s| s.with_spec(1, ParameterSpec::bounded(0.5, 2.5)))
            .and_then(|s| s.with_spec(8, ParameterSpec::bounded(0.0, 200.0)))
            .unwrap()
    }

    #[test]
    fn test_calibrate_recovers_bowl_minimum() {
        let result = VehicleCalibrator::with_defaults()
            .calibrate(&bowl(), &bowl_specs())
            .unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.parameters.understeer_slope, 0.02, epsilon = 1e-6);
        assert_abs_diff_eq!(result.parameters.cg_to_front, 1.1, epsilon = 1e-5);
        assert_abs_diff_eq!(result.parameters.rolling_drag, 80.0, epsilon = 1e-3);
        assert_eq!(result.parameters.car_mass, 280.0);
        assert!(result.diagnostics.evaluations > 0);
        assert_eq!(result.diagnostics.mode_outcomes.len(), 1);
    }

    #[test]
    fn test_fixed_parameters_constant_in_every_proposal() {
        let inner = bowl();
        let recording = Recording {
            inner: &inner,
            seen: RefCell::new(Vec::new()),
        };
        let specs = bowl_specs();
        VehicleCalibrator::with_defaults()
            .calibrate(&recording, &specs)
            .unwrap();

        let seen = recording.seen.into_inner();
        assert!(seen.len() > 10);
        for proposal in &seen {
            for (slot, spec) in specs.specs().iter().enumerate() {
                if let ParameterSpec::Fixed(value) = spec {
                    assert_eq!(proposal[slot], *value, "slot {slot} moved");
                }
            }
        }
    }

    #[test]
    fn test_bounded_mode_sweep_picks_lowest_loss() {
        let mut objective = bowl();
        objective.mode_penalty = [3.0, 1.0, 2.0];
        let specs = bowl_specs()
            .with_spec(TORQUE_MODE_INDEX, ParameterSpec::bounded(0.0, 2.0))
            .unwrap();

        let result = VehicleCalibrator::with_defaults()
            .calibrate(&objective, &specs)
            .unwrap();

        assert_eq!(result.parameters.torque_mode, TorqueMode::Fwd);
        assert_eq!(result.diagnostics.mode_outcomes.len(), 3);
        assert_abs_diff_eq!(result.loss(), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_invalid_fixed_mode_fails_before_solving() {
        let recording = Recording {
            inner: &bowl(),
            seen: RefCell::new(Vec::new()),
        };
        let specs = bowl_specs()
            .with_spec(TORQUE_MODE_INDEX, ParameterSpec::fixed(5.0))
            .unwrap();

        let err = VehicleCalibrator::with_defaults()
            .calibrate(&recording, &specs)
            .unwrap_err();
        assert!(matches!(err, CalibrationError::Model(ModelError::InvalidParameter { .. })));
        assert!(recording.seen.borrow().is_empty());
    }

    #[test]
    fn test_objective_error_is_surfaced() {
        let err = VehicleCalibrator::with_defaults()
            .calibrate(&Failing, &bowl_specs())
            .unwrap_err();
        assert!(matches!(err, CalibrationError::Model(_)));
    }

    #[test]
    fn test_insufficient_data() {
        let calibrator =
            VehicleCalibrator::new(VehicleCalibratorConfig::default().with_min_observations(100));
        let err = calibrator.calibrate(&bowl(), &bowl_specs()).unwrap_err();
        assert_eq!(err, CalibrationError::insufficient_data(100, 9));
    }

    #[test]
    fn test_budget_exhaustion_is_not_fatal() {
        let config = VehicleCalibratorConfig::new(LbfgsConfig {
            max_iterations: 1,
            tolerance: 0.0,
            gradient_tolerance: 0.0,
            ..Default::default()
        });
        let calibrator = VehicleCalibrator::new(config);

        let result = calibrator.calibrate(&bowl(), &bowl_specs()).unwrap();
        assert!(!result.converged);
        assert!(result.loss().is_finite());

        match calibrator.calibrate_or_error(&bowl(), &bowl_specs()) {
            Err(CalibrationError::NotConverged { parameters, .. }) => assert_eq!(parameters.len(), 9),
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[test]
    fn test_all_fixed_returns_initial_guess() {
        let target = bowl().target;
        let specs = ParameterSpecSet::all_fixed(&target);
        let result = VehicleCalibrator::with_defaults()
            .calibrate(&bowl(), &specs)
            .unwrap();
        assert!(result.converged);
        assert_eq!(result.parameters, target);
        assert_eq!(result.loss(), 0.0);
    }
}
