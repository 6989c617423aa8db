//! Per-constant calibration bounds.
//!
//! A [`ParameterSpecSet`] holds one [`ParameterSpec`] per model constant, in
//! slot order, and derives from them the solver bounds and the initial guess.

use vehicle_core::traits::calibration::ParameterBounds;

use super::error::CalibrationError;
use crate::models::{ModelConstants, TorqueMode, PARAMETER_COUNT, PARAMETER_NAMES, TORQUE_MODE_INDEX};

/// How one constant may vary during calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterSpec {
    /// Held at exactly this value.
    Fixed(f64),
    /// Free inside the closed interval.
    Bounded {
        /// Lower bound
        lo: f64,
        /// Upper bound
        hi: f64,
    },
}

impl ParameterSpec {
    /// Fixed value.
    pub fn fixed(value: f64) -> Self {
        ParameterSpec::Fixed(value)
    }

    /// Closed interval `[lo, hi]`.
    pub fn bounded(lo: f64, hi: f64) -> Self {
        ParameterSpec::Bounded { lo, hi }
    }

    /// True for [`ParameterSpec::Fixed`].
    pub fn is_fixed(&self) -> bool {
        matches!(self, ParameterSpec::Fixed(_))
    }

    /// Starting value: the literal for fixed specs, the midpoint otherwise.
    pub fn initial_guess(&self) -> f64 {
        match *self {
            ParameterSpec::Fixed(value) => value,
            ParameterSpec::Bounded { lo, hi } => 0.5 * (lo + hi),
        }
    }

    /// Solver bounds; a fixed spec collapses to a point.
    pub fn bounds(&self) -> ParameterBounds {
        match *self {
            ParameterSpec::Fixed(value) => ParameterBounds::fixed(value),
            ParameterSpec::Bounded { lo, hi } => ParameterBounds::new(lo, hi),
        }
    }

    /// Check the values are finite and ordered.
    pub fn validate(&self, name: &str) -> Result<(), CalibrationError> {
        match *self {
            ParameterSpec::Fixed(value) if !value.is_finite() => Err(CalibrationError::configuration(
                format!("{name}: fixed value {value} is not finite"),
            )),
            ParameterSpec::Bounded { lo, hi } if !(lo.is_finite() && hi.is_finite()) => {
                Err(CalibrationError::configuration(format!(
                    "{name}: bounds [{lo}, {hi}] are not finite"
                )))
            }
            ParameterSpec::Bounded { lo, hi } if lo > hi => Err(CalibrationError::configuration(
                format!("{name}: lower bound {lo} exceeds upper bound {hi}"),
            )),
            _ => Ok(()),
        }
    }
}

/// The full set of nine specs, validated.
///
/// # Examples
/// ```
/// use vehicle_models::calibration::{ParameterSpec, ParameterSpecSet};
///
/// let mut specs = vec![ParameterSpec::fixed(1.0); 9];
/// specs[0] = ParameterSpec::bounded(0.0, 0.1);
/// specs[5] = ParameterSpec::fixed(0.0);
/// let set = ParameterSpecSet::new(specs).unwrap();
///
/// assert_eq!(set.initial_guess()[0], 0.05);
/// assert_eq!(set.free_count(), 1);
/// assert!(ParameterSpecSet::new(vec![ParameterSpec::fixed(1.0); 8]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSpecSet")
)]
pub struct ParameterSpecSet {
    specs: Vec<ParameterSpec>,
    labels: Vec<String>,
}

/// Unchecked wire form; deserialization goes through [`ParameterSpecSet::with_labels`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSpecSet {
    specs: Vec<ParameterSpec>,
    labels: Vec<String>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSpecSet> for ParameterSpecSet {
    type Error = CalibrationError;

    fn try_from(raw: RawSpecSet) -> Result<Self, CalibrationError> {
        Self::with_labels(raw.specs, raw.labels)
    }
}

impl ParameterSpecSet {
    /// Build from nine specs in slot order, labelled with the canonical names.
    pub fn new(specs: Vec<ParameterSpec>) -> Result<Self, CalibrationError> {
        let labels = PARAMETER_NAMES.iter().map(|n| n.to_string()).collect();
        Self::with_labels(specs, labels)
    }

    /// Build from nine specs with caller-supplied labels, e.g. the names read
    /// from a constraint file.
    pub fn with_labels(specs: Vec<ParameterSpec>, labels: Vec<String>) -> Result<Self, CalibrationError> {
        if specs.len() != PARAMETER_COUNT {
            return Err(CalibrationError::configuration(format!(
                "expected {PARAMETER_COUNT} parameter specs, got {}",
                specs.len()
            )));
        }
        if labels.len() != specs.len() {
            return Err(CalibrationError::configuration(format!(
                "expected {} labels, got {}",
                specs.len(),
                labels.len()
            )));
        }
        for (spec, name) in specs.iter().zip(PARAMETER_NAMES) {
            spec.validate(name)?;
        }
        Ok(Self { specs, labels })
    }

    /// Every constant fixed at the given values.
    pub fn all_fixed(constants: &ModelConstants<f64>) -> Self {
        Self {
            specs: constants.to_array().iter().map(|v| ParameterSpec::Fixed(*v)).collect(),
            labels: PARAMETER_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Specs in slot order.
    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    /// Labels in slot order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Spec for one slot.
    pub fn get(&self, index: usize) -> Option<&ParameterSpec> {
        self.specs.get(index)
    }

    /// Replace one slot, re-validating it.
    pub fn with_spec(mut self, index: usize, spec: ParameterSpec) -> Result<Self, CalibrationError> {
        let name = PARAMETER_NAMES.get(index).ok_or_else(|| {
            CalibrationError::configuration(format!("no parameter slot {index}"))
        })?;
        spec.validate(name)?;
        self.specs[index] = spec;
        Ok(self)
    }

    /// Initial guess in slot order.
    pub fn initial_guess(&self) -> [f64; PARAMETER_COUNT] {
        std::array::from_fn(|i| self.specs[i].initial_guess())
    }

    /// Solver bounds in slot order.
    pub fn bounds(&self) -> Vec<ParameterBounds> {
        self.specs.iter().map(ParameterSpec::bounds).collect()
    }

    /// Number of bounded slots.
    pub fn free_count(&self) -> usize {
        self.specs.iter().filter(|s| !s.is_fixed()).count()
    }

    /// Drivetrain modes admitted by the `torque_mode` slot.
    ///
    /// A fixed value must be exactly 0, 1 or 2. An interval admits every
    /// mode whose code it contains and must contain at least one.
    pub fn torque_modes(&self) -> Result<Vec<TorqueMode>, CalibrationError> {
        match self.specs[TORQUE_MODE_INDEX] {
            ParameterSpec::Fixed(value) => Ok(vec![TorqueMode::from_value(value)?]),
            ParameterSpec::Bounded { lo, hi } => {
                let modes: Vec<TorqueMode> = TorqueMode::ALL
                    .into_iter()
                    .filter(|mode| {
                        let code = f64::from(mode.code());
                        lo <= code && code <= hi
                    })
                    .collect();
                if modes.is_empty() {
                    return Err(CalibrationError::configuration(format!(
                        "torque_mode interval [{lo}, {hi}] contains no drivetrain mode"
                    )));
                }
                Ok(modes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_specs() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::bounded(0.0, 0.05),
            ParameterSpec::bounded(0.5, 2.5),
            ParameterSpec::bounded(0.5, 2.5),
            ParameterSpec::fixed(4.0),
            ParameterSpec::fixed(230.0),
            ParameterSpec::fixed(0.0),
            ParameterSpec::fixed(0.2),
            ParameterSpec::fixed(280.0),
            ParameterSpec::bounded(0.0, 200.0),
        ]
    }

    #[test]
    fn test_initial_guess_midpoints_and_literals() {
        let set = ParameterSpecSet::new(sample_specs()).unwrap();
        assert_eq!(
            set.initial_guess(),
            [0.025, 1.5, 1.5, 4.0, 230.0, 0.0, 0.2, 280.0, 100.0]
        );
        assert_eq!(set.free_count(), 4);
    }

    #[test]
    fn test_bounds_collapse_for_fixed() {
        let set = ParameterSpecSet::new(sample_specs()).unwrap();
        let bounds = set.bounds();
        assert!(bounds[7].is_fixed());
        assert_eq!(bounds[7].min, 280.0);
        assert_eq!(bounds[8], ParameterBounds::new(0.0, 200.0));
    }

    #[test]
    fn test_wrong_count_rejected() {
        let mut specs = sample_specs();
        specs.push(ParameterSpec::fixed(1.0));
        assert!(matches!(
            ParameterSpecSet::new(specs),
            Err(CalibrationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let mut specs = sample_specs();
        specs[1] = ParameterSpec::bounded(2.0, 1.0);
        let err = ParameterSpecSet::new(specs).unwrap_err();
        assert!(err.to_string().contains("cg_to_front"));
    }

    #[test]
    fn test_torque_modes_fixed() {
        let set = ParameterSpecSet::new(sample_specs()).unwrap();
        assert_eq!(set.torque_modes().unwrap(), vec![TorqueMode::Awd]);

        let bad = set.with_spec(TORQUE_MODE_INDEX, ParameterSpec::fixed(5.0)).unwrap();
        assert!(matches!(bad.torque_modes(), Err(CalibrationError::Model(_))));
    }

    #[test]
    fn test_torque_modes_interval() {
        let set = ParameterSpecSet::new(sample_specs())
            .unwrap()
            .with_spec(TORQUE_MODE_INDEX, ParameterSpec::bounded(0.0, 2.0))
            .unwrap();
        assert_eq!(set.torque_modes().unwrap(), TorqueMode::ALL.to_vec());

        let partial = set
            .clone()
            .with_spec(TORQUE_MODE_INDEX, ParameterSpec::bounded(0.5, 2.0))
            .unwrap();
        assert_eq!(
            partial.torque_modes().unwrap(),
            vec![TorqueMode::Fwd, TorqueMode::Rwd]
        );

        let empty = set
            .with_spec(TORQUE_MODE_INDEX, ParameterSpec::bounded(0.2, 0.8))
            .unwrap();
        assert!(empty.torque_modes().is_err());
    }

    #[test]
    fn test_all_fixed() {
        let constants = ModelConstants::<f64>::default();
        let set = ParameterSpecSet::all_fixed(&constants);
        assert_eq!(set.free_count(), 0);
        assert_eq!(set.initial_guess(), constants.to_array());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates() {
        let set = ParameterSpecSet::new(sample_specs()).unwrap();
        let value = serde_json::to_value(&set).unwrap();
        let back: ParameterSpecSet = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, set);

        let mut short = value.clone();
        short["specs"].as_array_mut().unwrap().pop();
        assert!(serde_json::from_value::<ParameterSpecSet>(short).is_err());

        let mut inverted = value;
        inverted["specs"][0] = serde_json::json!({ "Bounded": { "lo": 1.0, "hi": 0.0 } });
        assert!(serde_json::from_value::<ParameterSpecSet>(inverted).is_err());
    }
}
