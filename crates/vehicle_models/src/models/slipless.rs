//! Slipless kinematic bicycle model.
//!
//! One step advances a [`VehicleState`] by `dt` under a constant
//! [`ControlAction`]:
//!
//! ```text
//! δ      = -steering                       (sign convention of the logs)
//! τ      = torque_command · gear_ratio     (axle-referred torque)
//! τ_max  = saturating_motor_torque · 0.5 · gear_ratio
//! β      = atan(l_r / L · tan(δ / (1 + k v)))
//! F      = drivetrain force from τ, τ_max, δ, β
//! v'     = max(0, v + (F / (r m) - drag / m) dt)
//! v̄      = (2/3)(v'³ - v³)/(v'² - v²)      (v̄ = v when v' = v)
//! δ̄      = δ / (1 + k v̄)
//! ω      = sign(δ̄) v̄ / sqrt(l_r² + (L / tan δ̄)²)
//! ```
//!
//! with `L = l_f + l_r`. The pose follows a circular arc of radius
//! `L / tan δ̄` when `ω ≠ 0`, otherwise a straight line at `v̄`.
//!
//! Every singular denominator is a branch, so finite valid inputs never
//! produce NaN.

use num_traits::Float;
use vehicle_core::types::{ControlAction, ModelError, VehicleState};

use super::constants::{ModelConstants, TorqueMode};

/// Slip angle of the bicycle geometry at `speed`.
///
/// Zero when `1 + understeer_slope · speed` vanishes or the adjusted
/// steering angle has zero cosine.
#[inline]
pub fn slip_angle<T: Float>(steering: T, speed: T, constants: &ModelConstants<T>) -> T {
    let understeer = T::one() + constants.understeer_slope * speed;
    if understeer == T::zero() {
        return T::zero();
    }
    let adjusted = steering / understeer;
    if adjusted.cos() == T::zero() {
        return T::zero();
    }
    let rear_share = constants.cg_to_rear / constants.wheelbase();
    (rear_share * adjusted.tan()).atan()
}

#[inline]
fn clip<T: Float>(value: T, cap: T) -> T {
    (-cap).max(value.min(cap))
}

/// Longitudinal force (in axle torque units) delivered by the drivetrain.
///
/// AWD halves the axle torque first and clips each half against the cap.
#[inline]
pub fn drive_force<T: Float>(
    axle_torque: T,
    steering: T,
    slip: T,
    constants: &ModelConstants<T>,
) -> T {
    let half = T::one() / (T::one() + T::one());
    let cap = constants.saturating_motor_torque * half * constants.gear_ratio;
    let front = (steering - slip).cos();
    let rear = slip.cos();

    match constants.torque_mode {
        TorqueMode::Awd => {
            let per_axle = clip(axle_torque * half, cap);
            per_axle * front + per_axle * rear
        }
        TorqueMode::Fwd => clip(axle_torque, cap) * front,
        TorqueMode::Rwd => clip(axle_torque, cap) * rear,
    }
}

/// Time-average of a speed varying quadratically from `speed` to `next_speed`.
///
/// Returns `speed` exactly when the two are equal.
///
/// # Examples
/// ```
/// use vehicle_models::models::mean_speed;
///
/// assert_eq!(mean_speed(3.0_f64, 3.0), 3.0);
/// assert!((mean_speed(0.0_f64, 3.0) - 2.0).abs() < 1e-12);
/// ```
#[inline]
pub fn mean_speed<T: Float>(speed: T, next_speed: T) -> T {
    let denominator = next_speed * next_speed - speed * speed;
    if next_speed == speed || denominator == T::zero() {
        return speed;
    }
    let two_thirds = T::from(2.0 / 3.0).unwrap_or(T::zero());
    two_thirds * (next_speed.powi(3) - speed.powi(3)) / denominator
}

/// Yaw rate for an understeer-corrected steering angle.
///
/// Zero for a zero corrected angle; otherwise carries the angle's sign.
#[inline]
pub fn angular_speed<T: Float>(corrected_steering: T, avg_speed: T, constants: &ModelConstants<T>) -> T {
    if corrected_steering == T::zero() {
        return T::zero();
    }
    let turn_radius = constants.wheelbase() / corrected_steering.tan();
    let rear = constants.cg_to_rear;
    let magnitude = avg_speed / (rear * rear + turn_radius * turn_radius).sqrt();
    if corrected_steering > T::zero() {
        magnitude
    } else {
        -magnitude
    }
}

/// Advance `state` by `timestep` under `action`.
///
/// Pure and deterministic; the returned speed is never negative.
pub fn step<T: Float>(
    state: &VehicleState<T>,
    action: &ControlAction<T>,
    timestep: T,
    constants: &ModelConstants<T>,
) -> VehicleState<T> {
    let steering = -action.steering_angle;
    let axle_torque = action.torque_command * constants.gear_ratio;
    let speed = state.speed;

    let slip = slip_angle(steering, speed, constants);
    let force = drive_force(axle_torque, steering, slip, constants);
    let acceleration = force / (constants.wheel_radius * constants.car_mass)
        - constants.rolling_drag / constants.car_mass;
    let next_speed = T::zero().max(speed + acceleration * timestep);

    let avg_speed = mean_speed(speed, next_speed);

    let understeer = T::one() + constants.understeer_slope * avg_speed;
    let corrected = if understeer == T::zero() {
        T::zero()
    } else {
        steering / understeer
    };

    let omega = angular_speed(corrected, avg_speed, constants);
    let yaw = state.yaw;
    let next_yaw = yaw + omega * timestep;

    let (x, y) = if omega != T::zero() {
        let radius = constants.wheelbase() / corrected.tan();
        let rear = constants.cg_to_rear;
        let (sin0, cos0) = yaw.sin_cos();
        let (sin1, cos1) = next_yaw.sin_cos();
        (
            state.x + rear * (cos1 - cos0) + radius * (sin1 - sin0),
            state.y + rear * (sin1 - sin0) + radius * (cos0 - cos1),
        )
    } else {
        (
            state.x + avg_speed * yaw.cos() * timestep,
            state.y + avg_speed * yaw.sin() * timestep,
        )
    };

    VehicleState::new(x, y, next_yaw, next_speed)
}

/// [`step`] with constants given as a flat slot-order vector.
///
/// # Errors
/// - [`ModelError::DimensionMismatch`] unless `constants` has nine entries
/// - [`ModelError::InvalidParameter`] when the torque mode slot is not 0, 1 or 2
pub fn step_vector<T: Float>(
    state: &VehicleState<T>,
    action: &ControlAction<T>,
    timestep: T,
    constants: &[T],
) -> Result<VehicleState<T>, ModelError> {
    let constants = ModelConstants::from_slice(constants)?;
    Ok(step(state, action, timestep, &constants))
}
