//! Physical constants of the slipless model.
//!
//! The nine constants always travel in one fixed order:
//!
//! | Slot | Name | Unit |
//! |------|------|------|
//! | 0 | `understeer_slope` | s/m |
//! | 1 | `cg_to_front` | m |
//! | 2 | `cg_to_rear` | m |
//! | 3 | `gear_ratio` | - |
//! | 4 | `saturating_motor_torque` | N·m |
//! | 5 | `torque_mode` | 0 = AWD, 1 = FWD, 2 = RWD |
//! | 6 | `wheel_radius` | m |
//! | 7 | `car_mass` | kg |
//! | 8 | `rolling_drag` | N |
//!
//! Inside the crate they are a named struct; the flat form exists only
//! for the optimiser and for text/CSV interchange.

use std::fmt;

use num_traits::Float;
use vehicle_core::types::ModelError;

/// Number of model constants.
pub const PARAMETER_COUNT: usize = 9;

/// Constant names in slot order.
pub const PARAMETER_NAMES: [&str; PARAMETER_COUNT] = [
    "understeer_slope",
    "cg_to_front",
    "cg_to_rear",
    "gear_ratio",
    "saturating_motor_torque",
    "torque_mode",
    "wheel_radius",
    "car_mass",
    "rolling_drag",
];

/// Slot of `torque_mode` in the flat vector.
pub const TORQUE_MODE_INDEX: usize = 5;

/// Drivetrain configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TorqueMode {
    /// Torque split evenly between both axles.
    #[default]
    Awd,
    /// Front axle only.
    Fwd,
    /// Rear axle only.
    Rwd,
}

impl TorqueMode {
    /// All modes in code order.
    pub const ALL: [TorqueMode; 3] = [TorqueMode::Awd, TorqueMode::Fwd, TorqueMode::Rwd];

    /// Integer code used in the flat vector.
    pub fn code(&self) -> u8 {
        match self {
            TorqueMode::Awd => 0,
            TorqueMode::Fwd => 1,
            TorqueMode::Rwd => 2,
        }
    }

    /// Mode for an integer code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TorqueMode::Awd),
            1 => Some(TorqueMode::Fwd),
            2 => Some(TorqueMode::Rwd),
            _ => None,
        }
    }

    /// Decode an optimiser float.
    ///
    /// Only exactly `0`, `1` and `2` are accepted; `0.5`, `5` or NaN fail
    /// with [`ModelError::InvalidParameter`].
    ///
    /// # Examples
    /// ```
    /// use vehicle_models::models::TorqueMode;
    ///
    /// assert_eq!(TorqueMode::from_value(2.0_f64).unwrap(), TorqueMode::Rwd);
    /// assert!(TorqueMode::from_value(5.0_f64).is_err());
    /// ```
    pub fn from_value<T: Float>(value: T) -> Result<Self, ModelError> {
        let raw = value.to_f64().unwrap_or(f64::NAN);
        let mode = if raw.fract() == 0.0 {
            Self::from_code(raw as i64)
        } else {
            None
        };
        mode.ok_or_else(|| {
            ModelError::invalid_parameter(
                PARAMETER_NAMES[TORQUE_MODE_INDEX],
                raw,
                "torque mode must be exactly 0 (AWD), 1 (FWD) or 2 (RWD)",
            )
        })
    }

    /// Float encoding for the optimiser.
    pub fn to_value<T: Float>(&self) -> T {
        T::from(self.code()).unwrap_or(T::zero())
    }
}

impl fmt::Display for TorqueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorqueMode::Awd => write!(f, "AWD"),
            TorqueMode::Fwd => write!(f, "FWD"),
            TorqueMode::Rwd => write!(f, "RWD"),
        }
    }
}

/// The nine physical constants of the slipless model.
///
/// # Examples
/// ```
/// use vehicle_models::models::{ModelConstants, TorqueMode};
///
/// let flat = [0.01, 0.8, 0.75, 4.0, 230.0, 1.0, 0.2, 280.0, 50.0];
/// let constants = ModelConstants::from_slice(&flat).unwrap();
/// assert_eq!(constants.torque_mode, TorqueMode::Fwd);
/// assert_eq!(constants.to_array(), flat);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelConstants<T: Float> {
    /// Reduction of effective steering per unit speed
    pub understeer_slope: T,
    /// Distance from the centre of gravity to the front axle
    pub cg_to_front: T,
    /// Distance from the centre of gravity to the rear axle
    pub cg_to_rear: T,
    /// Motor to axle gear reduction
    pub gear_ratio: T,
    /// Motor torque at saturation
    pub saturating_motor_torque: T,
    /// Drivetrain configuration
    pub torque_mode: TorqueMode,
    /// Wheel radius
    pub wheel_radius: T,
    /// Vehicle mass
    pub car_mass: T,
    /// Constant rolling resistance force
    pub rolling_drag: T,
}

impl<T: Float> ModelConstants<T> {
    /// Wheelbase `cg_to_front + cg_to_rear`.
    #[inline]
    pub fn wheelbase(&self) -> T {
        self.cg_to_front + self.cg_to_rear
    }

    /// Build from a flat slot-order vector.
    ///
    /// # Errors
    /// - [`ModelError::DimensionMismatch`] unless exactly nine values are given
    /// - [`ModelError::InvalidParameter`] for a torque mode outside {0, 1, 2}
    pub fn from_slice(values: &[T]) -> Result<Self, ModelError> {
        if values.len() != PARAMETER_COUNT {
            return Err(ModelError::dimension_mismatch(PARAMETER_COUNT, values.len()));
        }
        Ok(Self {
            understeer_slope: values[0],
            cg_to_front: values[1],
            cg_to_rear: values[2],
            gear_ratio: values[3],
            saturating_motor_torque: values[4],
            torque_mode: TorqueMode::from_value(values[TORQUE_MODE_INDEX])?,
            wheel_radius: values[6],
            car_mass: values[7],
            rolling_drag: values[8],
        })
    }

    /// Flatten to slot order.
    pub fn to_array(&self) -> [T; PARAMETER_COUNT] {
        [
            self.understeer_slope,
            self.cg_to_front,
            self.cg_to_rear,
            self.gear_ratio,
            self.saturating_motor_torque,
            self.torque_mode.to_value(),
            self.wheel_radius,
            self.car_mass,
            self.rolling_drag,
        ]
    }

    /// Named `(name, value)` pairs in slot order.
    pub fn named(&self) -> [(&'static str, T); PARAMETER_COUNT] {
        let values = self.to_array();
        std::array::from_fn(|i| (PARAMETER_NAMES[i], values[i]))
    }

    /// Check that the constants describe a physical vehicle.
    ///
    /// The dynamics accept any finite values; this check is for inputs
    /// that are meant to generate data or be reported, not for every
    /// vector the optimiser probes.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in self.named() {
            if !value.is_finite() {
                return Err(ModelError::invalid_parameter(
                    name,
                    value.to_f64().unwrap_or(f64::NAN),
                    "must be finite",
                ));
            }
        }

        let positive = [
            ("cg_to_front", self.cg_to_front),
            ("cg_to_rear", self.cg_to_rear),
            ("wheel_radius", self.wheel_radius),
            ("car_mass", self.car_mass),
        ];
        for (name, value) in positive {
            if value <= T::zero() {
                return Err(ModelError::invalid_parameter(
                    name,
                    value.to_f64().unwrap_or(f64::NAN),
                    "must be positive",
                ));
            }
        }

        let non_negative = [
            ("gear_ratio", self.gear_ratio),
            ("saturating_motor_torque", self.saturating_motor_torque),
            ("rolling_drag", self.rolling_drag),
        ];
        for (name, value) in non_negative {
            if value < T::zero() {
                return Err(ModelError::invalid_parameter(
                    name,
                    value.to_f64().unwrap_or(f64::NAN),
                    "must be non-negative",
                ));
            }
        }

        Ok(())
    }
}

impl<T: Float> Default for ModelConstants<T> {
    /// A small single-seat electric race car.
    fn default() -> Self {
        let c = |v: f64| T::from(v).unwrap_or(T::zero());
        Self {
            understeer_slope: c(0.01),
            cg_to_front: c(0.8),
            cg_to_rear: c(0.75),
            gear_ratio: c(4.0),
            saturating_motor_torque: c(230.0),
            torque_mode: TorqueMode::Awd,
            wheel_radius: c(0.2),
            car_mass: c(280.0),
            rolling_drag: c(50.0),
        }
    }
}
