//! End-to-end calibration tests.
//!
//! Datasets are generated by the dynamics model itself with known
//! constants; calibration from a perturbed starting point must recover
//! them and drive the loss to zero.

use std::cell::RefCell;

use approx::assert_abs_diff_eq;
use vehicle_core::traits::calibration::CalibrationConfig;
use vehicle_core::types::ModelError;
use vehicle_models::calibration::{
    Objective, ParameterSpec, ParameterSpecSet, ResidualEvaluator, SyntheticDatasetBuilder,
    VehicleCalibrator, VehicleCalibratorConfig,
};
use vehicle_models::models::{ModelConstants, TorqueMode};

// ============================================================================
// Fixtures
// ============================================================================

fn true_constants() -> ModelConstants<f64> {
    ModelConstants {
        understeer_slope: 0.012,
        cg_to_front: 0.82,
        cg_to_rear: 0.71,
        gear_ratio: 4.0,
        saturating_motor_torque: 230.0,
        torque_mode: TorqueMode::Awd,
        wheel_radius: 0.2,
        car_mass: 280.0,
        rolling_drag: 45.0,
    }
}

/// Geometry, understeer and drag free; drivetrain constants fixed.
fn specs_for(truth: &ModelConstants<f64>) -> ParameterSpecSet {
    ParameterSpecSet::new(vec![
        ParameterSpec::bounded(0.0, 0.05),
        ParameterSpec::bounded(0.5, 2.5),
        ParameterSpec::bounded(0.5, 2.5),
        ParameterSpec::fixed(truth.gear_ratio),
        ParameterSpec::fixed(truth.saturating_motor_torque),
        ParameterSpec::fixed(truth.torque_mode.to_value()),
        ParameterSpec::fixed(truth.wheel_radius),
        ParameterSpec::fixed(truth.car_mass),
        ParameterSpec::bounded(0.0, 200.0),
    ])
    .unwrap()
}

fn calibrator() -> VehicleCalibrator {
    VehicleCalibrator::new(VehicleCalibratorConfig::from_calibration_config(
        &CalibrationConfig::high_precision(),
    ))
}

/// Records every constants vector the calibrator proposes.
struct Recording<'a> {
    inner: ResidualEvaluator<'a>,
    proposals: RefCell<Vec<[f64; 9]>>,
}

impl Objective for Recording<'_> {
    fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError> {
        self.proposals.borrow_mut().push(constants.to_array());
        Objective::loss(&self.inner, constants)
    }

    fn observation_count(&self) -> usize {
        self.inner.observation_count()
    }
}

// ============================================================================
// Recovery Tests
// ============================================================================

/// The canonical regression test for the whole pipeline.
#[test]
fn test_recovers_known_constants_from_synthetic_data() {
    let truth = true_constants();
    let dataset = SyntheticDatasetBuilder::new(truth)
        .with_samples(200)
        .with_seed(2024)
        .build()
        .unwrap();
    let specs = specs_for(&truth);

    // The midpoint start is well away from the truth
    let start = specs.initial_guess();
    assert!((start[8] - truth.rolling_drag).abs() > 10.0);

    let evaluator = ResidualEvaluator::new(&dataset);
    let result = calibrator().calibrate(&evaluator, &specs).unwrap();
    let fitted = result.parameters;

    assert!(result.loss() < 1e-6, "loss = {}", result.loss());
    assert_abs_diff_eq!(fitted.understeer_slope, truth.understeer_slope, epsilon = 1e-3);
    assert_abs_diff_eq!(fitted.cg_to_front, truth.cg_to_front, epsilon = 1e-3);
    assert_abs_diff_eq!(fitted.cg_to_rear, truth.cg_to_rear, epsilon = 1e-3);
    assert_abs_diff_eq!(fitted.rolling_drag, truth.rolling_drag, epsilon = 1e-3);

    assert_eq!(fitted.gear_ratio, truth.gear_ratio);
    assert_eq!(fitted.car_mass, truth.car_mass);
    assert_eq!(fitted.torque_mode, truth.torque_mode);
}

/// Every proposed vector carries the fixed values bit-exactly.
#[test]
fn test_fixed_parameters_never_move() {
    let truth = true_constants();
    let dataset = SyntheticDatasetBuilder::new(truth)
        .with_samples(60)
        .with_seed(11)
        .build()
        .unwrap();
    let specs = specs_for(&truth);
    let recording = Recording {
        inner: ResidualEvaluator::new(&dataset),
        proposals: RefCell::new(Vec::new()),
    };

    let result = calibrator().calibrate(&recording, &specs).unwrap();
    let proposals = recording.proposals.into_inner();
    assert!(proposals.len() > 20);

    for proposal in proposals.iter().chain(std::iter::once(&result.parameters.to_array())) {
        for (slot, spec) in specs.specs().iter().enumerate() {
            match *spec {
                ParameterSpec::Fixed(value) => {
                    assert_eq!(proposal[slot].to_bits(), value.to_bits(), "slot {slot}")
                }
                ParameterSpec::Bounded { lo, hi } => {
                    assert!(lo <= proposal[slot] && proposal[slot] <= hi, "slot {slot}")
                }
            }
        }
    }
}

/// A bounded drivetrain mode is swept and the true mode wins.
#[test]
fn test_mode_sweep_identifies_drivetrain() {
    let truth = ModelConstants {
        torque_mode: TorqueMode::Rwd,
        ..true_constants()
    };
    let dataset = SyntheticDatasetBuilder::new(truth)
        .with_samples(120)
        .with_torque_range(20.0, 200.0)
        .with_seed(5)
        .build()
        .unwrap();

    let specs = ParameterSpecSet::all_fixed(&truth)
        .with_spec(5, ParameterSpec::bounded(0.0, 2.0))
        .and_then(|s| s.with_spec(8, ParameterSpec::bounded(0.0, 200.0)))
        .unwrap();

    let evaluator = ResidualEvaluator::new(&dataset);
    let result = calibrator().calibrate(&evaluator, &specs).unwrap();

    assert_eq!(result.parameters.torque_mode, TorqueMode::Rwd);
    assert_eq!(result.diagnostics.mode_outcomes.len(), 3);
    assert!(result.loss() < 1e-8);
    assert_abs_diff_eq!(result.parameters.rolling_drag, truth.rolling_drag, epsilon = 1e-3);

    let rwd_loss = result.loss();
    for outcome in &result.diagnostics.mode_outcomes {
        if outcome.mode != TorqueMode::Rwd {
            assert!(outcome.loss > rwd_loss);
        }
    }
}

/// Noisy data still lands near the truth and reports a positive loss.
#[test]
fn test_noisy_data_estimates_close_to_truth() {
    let truth = true_constants();
    let dataset = SyntheticDatasetBuilder::new(truth)
        .with_samples(400)
        .with_noise(1e-3)
        .with_seed(99)
        .build()
        .unwrap();
    let specs = specs_for(&truth);

    let evaluator = ResidualEvaluator::new(&dataset);
    let result = calibrator().calibrate(&evaluator, &specs).unwrap();

    assert!(result.loss() > 0.0);
    assert!(result.loss() <= evaluator.loss(&truth));
    assert_abs_diff_eq!(result.parameters.rolling_drag, truth.rolling_drag, epsilon = 2.0);
    assert_abs_diff_eq!(result.parameters.cg_to_rear, truth.cg_to_rear, epsilon = 0.05);
}

/// An out-of-range fixed drivetrain mode is rejected before any evaluation.
#[test]
fn test_invalid_mode_rejected_before_solving() {
    let truth = true_constants();
    let dataset = SyntheticDatasetBuilder::new(truth).with_samples(10).build().unwrap();
    let specs = specs_for(&truth).with_spec(5, ParameterSpec::fixed(5.0)).unwrap();
    let recording = Recording {
        inner: ResidualEvaluator::new(&dataset),
        proposals: RefCell::new(Vec::new()),
    };

    assert!(calibrator().calibrate(&recording, &specs).is_err());
    assert!(recording.proposals.borrow().is_empty());
}
