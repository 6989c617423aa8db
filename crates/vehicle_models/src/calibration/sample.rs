//! Logged single-step transitions.
//!
//! Logs store a state as `[x, y, v, yaw]`; the model works in
//! `[x, y, yaw, v]`. [`from_schema_order`] and [`to_schema_order`] are the
//! only places that permutation happens.

use vehicle_core::types::{ControlAction, ModelError, VehicleState};

/// Build a state from log order `[x, y, v, yaw]`.
///
/// # Examples
/// ```
/// use vehicle_models::calibration::from_schema_order;
///
/// let state = from_schema_order([1.0, 2.0, 10.0, 0.5]);
/// assert_eq!(state.speed, 10.0);
/// assert_eq!(state.yaw, 0.5);
/// ```
#[inline]
pub fn from_schema_order(values: [f64; 4]) -> VehicleState<f64> {
    let [x, y, speed, yaw] = values;
    VehicleState::new(x, y, yaw, speed)
}

/// Flatten a state to log order `[x, y, v, yaw]`.
#[inline]
pub fn to_schema_order(state: &VehicleState<f64>) -> [f64; 4] {
    [state.x, state.y, state.speed, state.yaw]
}

/// One logged transition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingSample {
    /// State at the start of the step
    pub state_in: VehicleState<f64>,
    /// Inputs held during the step
    pub action: ControlAction<f64>,
    /// Step length in seconds, strictly positive
    pub timestep: f64,
    /// Observed state at the end of the step
    pub state_out_truth: VehicleState<f64>,
}

impl TrainingSample {
    /// Create a sample, rejecting a non-positive or non-finite timestep.
    pub fn new(
        state_in: VehicleState<f64>,
        action: ControlAction<f64>,
        timestep: f64,
        state_out_truth: VehicleState<f64>,
    ) -> Result<Self, ModelError> {
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(ModelError::invalid_parameter(
                "timestep",
                timestep,
                "must be finite and strictly positive",
            ));
        }
        Ok(Self {
            state_in,
            action,
            timestep,
            state_out_truth,
        })
    }

    /// Create a sample from log-order state columns.
    pub fn from_schema(
        state_in: [f64; 4],
        steering_angle: f64,
        torque_command: f64,
        timestep: f64,
        state_out_truth: [f64; 4],
    ) -> Result<Self, ModelError> {
        Self::new(
            from_schema_order(state_in),
            ControlAction::new(steering_angle, torque_command),
            timestep,
            from_schema_order(state_out_truth),
        )
    }
}

/// Ordered, immutable collection of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<TrainingSample>,
}

impl Dataset {
    /// Wrap samples, keeping their order.
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in load order.
    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    /// Iterate in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrainingSample> {
        self.samples.iter()
    }
}

impl From<Vec<TrainingSample>> for Dataset {
    fn from(samples: Vec<TrainingSample>) -> Self {
        Self::new(samples)
    }
}

impl FromIterator<TrainingSample> for Dataset {
    fn from_iter<I: IntoIterator<Item = TrainingSample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TrainingSample;
    type IntoIter = std::slice::Iter<'a, TrainingSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
