//! Planar vehicle state and control action.
//!
//! The model-side ordering of a state vector is `[x, y, yaw, speed]`.
//! Logged datasets store the same quantities as `[x, y, speed, yaw]`; the
//! conversion between the two lives next to the residual evaluator, not here.

use num_traits::Float;

/// Planar pose plus scalar forward speed.
///
/// # Examples
/// ```
/// use vehicle_core::types::VehicleState;
///
/// let state = VehicleState::new(1.0_f64, 2.0, 0.5, 10.0);
/// assert_eq!(state.to_array(), [1.0, 2.0, 0.5, 10.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState<T: Float> {
    /// Position along the world x axis (m)
    pub x: T,
    /// Position along the world y axis (m)
    pub y: T,
    /// Heading (rad)
    pub yaw: T,
    /// Forward speed (m/s), never negative for states produced by the model
    pub speed: T,
}

impl<T: Float> VehicleState<T> {
    /// Number of components in the model-order array.
    pub const DIM: usize = 4;

    /// Create a state from its components.
    pub fn new(x: T, y: T, yaw: T, speed: T) -> Self {
        Self { x, y, yaw, speed }
    }

    /// State at the origin, facing +x, at rest.
    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero())
    }

    /// Model-order array `[x, y, yaw, speed]`.
    pub fn to_array(&self) -> [T; 4] {
        [self.x, self.y, self.yaw, self.speed]
    }

    /// Build from a model-order array `[x, y, yaw, speed]`.
    pub fn from_array(values: [T; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.yaw.is_finite() && self.speed.is_finite()
    }
}

impl<T: Float> Default for VehicleState<T> {
    fn default() -> Self {
        Self::zero()
    }
}

/// Commanded inputs for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlAction<T: Float> {
    /// Steering wheel angle as logged (rad); the model inverts its sign
    pub steering_angle: T,
    /// Motor torque command before the gear reduction
    pub torque_command: T,
}

impl<T: Float> ControlAction<T> {
    /// Create an action.
    pub fn new(steering_angle: T, torque_command: T) -> Self {
        Self {
            steering_angle,
            torque_command,
        }
    }

    /// No steering, no torque.
    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero())
    }
}

impl<T: Float> Default for ControlAction<T> {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_array_order() {
        let state = VehicleState::new(1.0_f64, 2.0, 3.0, 4.0);
        assert_eq!(state.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(VehicleState::from_array(state.to_array()), state);
    }

    #[test]
    fn test_state_default_is_zero() {
        let state: VehicleState<f64> = VehicleState::default();
        assert_eq!(state, VehicleState::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_state_is_finite() {
        assert!(VehicleState::new(0.0_f64, 1.0, 2.0, 3.0).is_finite());
        assert!(!VehicleState::new(f64::NAN, 1.0, 2.0, 3.0).is_finite());
        assert!(!VehicleState::new(0.0, 1.0, 2.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_action_with_f32() {
        let action = ControlAction::new(0.1_f32, 20.0);
        assert_eq!(action.steering_angle, 0.1);
        assert_eq!(ControlAction::<f32>::zero(), ControlAction::new(0.0, 0.0));
    }
}
