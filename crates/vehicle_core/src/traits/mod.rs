//! Numeric bound and calibration settings.
//!
//! - [`Float`]: the scalar bound every state and model type is generic over
//! - [`calibration`]: parameter boxes and solver budgets

/// Scalar bound of the state types and the dynamics model.
///
/// The model runs in `f64` for calibration; `f32` works for replay on
/// smaller targets.
///
/// # Examples
/// ```
/// use vehicle_core::traits::Float;
///
/// fn travelled<T: Float>(speed: T, dt: T) -> T {
///     speed * dt
/// }
///
/// assert_eq!(travelled(2.0_f32, 0.5), 1.0);
/// ```
pub use num_traits::Float;

pub mod calibration;
