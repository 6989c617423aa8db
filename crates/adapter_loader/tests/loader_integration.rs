//! File-level tests for the loaders.

use std::fs;

use adapter_loader::{load_constraints, load_dataset, save_dataset, LoaderError};
use approx::assert_relative_eq;
use tempfile::tempdir;
use vehicle_models::calibration::{ParameterSpec, SyntheticDatasetBuilder};
use vehicle_models::models::{ModelConstants, TorqueMode};

const CONSTRAINTS: &str = "\
# bench vehicle
understeer_slope [0,0.05]
cg_to_front [0.5,2.5]
cg_to_rear [0.5,2.5]
gear_ratio 4.0
saturating_motor_torque 230
torque_mode [0,2]
wheel_radius 0.2
car_mass 280
rolling_drag [0,200]
";

#[test]
fn test_load_constraints_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("parameter_constraints.txt");
    fs::write(&path, CONSTRAINTS).unwrap();

    let specs = load_constraints(&path).unwrap();
    assert_eq!(specs.free_count(), 5);
    assert_eq!(specs.specs()[5], ParameterSpec::bounded(0.0, 2.0));
    assert_eq!(specs.torque_modes().unwrap(), TorqueMode::ALL.to_vec());
}

#[test]
fn test_missing_files_are_io_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.txt");

    match load_constraints(&missing) {
        Err(LoaderError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected io error, got {other:?}"),
    }
    assert!(matches!(load_dataset(&missing), Err(LoaderError::Io { .. })));
}

#[test]
fn test_saved_dataset_loads_back() {
    let truth = ModelConstants {
        torque_mode: TorqueMode::Fwd,
        ..ModelConstants::default()
    };
    let dataset = SyntheticDatasetBuilder::new(truth)
        .with_samples(25)
        .with_seed(3)
        .build()
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("train.csv");
    save_dataset(&dataset, &path).unwrap();
    let loaded = load_dataset(&path).unwrap();

    assert_eq!(loaded.len(), dataset.len());
    for (a, b) in loaded.iter().zip(dataset.iter()) {
        assert_relative_eq!(a.timestep, b.timestep);
        assert_relative_eq!(a.state_out_truth.speed, b.state_out_truth.speed);
        assert_relative_eq!(a.state_out_truth.yaw, b.state_out_truth.yaw);
        assert_relative_eq!(a.action.steering_angle, b.action.steering_angle);
    }
}
