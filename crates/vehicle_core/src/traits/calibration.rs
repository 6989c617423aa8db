//! Calibration budgets and per-parameter boxes.
//!
//! [`CalibrationConfig`] says when a run stops; [`ParameterBounds`] says
//! where each parameter may go. Neither knows which solver is used.
//!
//! # Example
//!
//! ```
//! use vehicle_core::traits::calibration::{CalibrationConfig, ParameterBounds, Precision};
//!
//! let config = CalibrationConfig::preset(Precision::Fast);
//! assert!(config.tolerance > CalibrationConfig::default().tolerance);
//!
//! let mass = ParameterBounds::fixed(280.0);
//! assert!(mass.is_fixed());
//! assert_eq!(mass.clamp(300.0), 280.0);
//! ```

/// Named budget levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Loose tolerances, small budget
    Fast,
    /// Defaults suited to noiseless logs of a few hundred steps
    #[default]
    Standard,
    /// Tight tolerances for synthetic recovery checks
    High,
}

/// Stopping rules of a calibration run.
///
/// The iteration and evaluation budgets are the only timeout a run has.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationConfig {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Evaluation budget, gradient probes included.
    pub max_evaluations: usize,
    /// Stop once the relative objective reduction of a step is at most this.
    pub tolerance: f64,
    /// Stop once the projected gradient infinity-norm is at most this.
    pub gradient_tolerance: f64,
    /// Correction pairs remembered by the limited-memory update.
    pub history_size: usize,
    /// Relative step of the central finite differences.
    pub finite_diff_step: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::preset(Precision::Standard)
    }
}

impl CalibrationConfig {
    /// Budgets for a precision level.
    pub fn preset(precision: Precision) -> Self {
        let (max_iterations, max_evaluations, tolerance, gradient_tolerance, history_size) =
            match precision {
                Precision::Fast => (100, 2_000, 1e-6, 1e-6, 10),
                Precision::Standard => (500, 20_000, 1e-10, 1e-10, 10),
                Precision::High => (2_000, 100_000, 1e-14, 1e-12, 20),
            };
        Self {
            max_iterations,
            max_evaluations,
            tolerance,
            gradient_tolerance,
            history_size,
            finite_diff_step: 1e-6,
        }
    }

    /// Standard budgets with the given tolerance and iteration cap.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    /// Shorthand for [`Precision::High`].
    pub fn high_precision() -> Self {
        Self::preset(Precision::High)
    }

    /// Replace the evaluation budget.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }
}

/// Closed interval `[min, max]` for one parameter.
///
/// `min == max` marks a fixed parameter: solvers never probe it and
/// [`clamp`](Self::clamp) returns that exact value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBounds {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
}

impl ParameterBounds {
    /// Interval `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Interval collapsed to `value`.
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    /// `[0, 1]`
    pub fn unit_interval() -> Self {
        Self::new(0.0, 1.0)
    }

    /// True when the interval is a single point.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// False for `min > max` or a NaN end.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// `max - min`
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Nearest point of the interval; exactly `min` when fixed.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.is_fixed() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let fast = CalibrationConfig::preset(Precision::Fast);
        let standard = CalibrationConfig::default();
        let high = CalibrationConfig::high_precision();

        assert_eq!(standard, CalibrationConfig::preset(Precision::default()));
        assert!(fast.tolerance > standard.tolerance && standard.tolerance > high.tolerance);
        assert!(fast.max_evaluations < standard.max_evaluations);
        assert!(standard.max_evaluations < high.max_evaluations);
        assert_eq!(standard.max_iterations, 500);
    }

    #[test]
    fn test_new_keeps_standard_budgets() {
        let config = CalibrationConfig::new(1e-6, 50).with_max_evaluations(123);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.max_evaluations, 123);
        assert_eq!(config.history_size, CalibrationConfig::default().history_size);
    }

    #[test]
    fn test_fixed_bounds_clamp_exactly() {
        let b = ParameterBounds::fixed(0.1 + 0.2);
        assert!(b.is_fixed());
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.clamp(-10.0).to_bits(), (0.1_f64 + 0.2).to_bits());
        assert_eq!(b.clamp(10.0).to_bits(), (0.1_f64 + 0.2).to_bits());
    }

    #[test]
    fn test_interval_clamp() {
        let b = ParameterBounds::new(1.0, 3.0);
        assert!(!b.is_fixed());
        assert_eq!(b.clamp(0.0), 1.0);
        assert_eq!(b.clamp(2.5), 2.5);
        assert_eq!(b.clamp(5.0), 3.0);
    }

    #[test]
    fn test_validity() {
        assert!(ParameterBounds::unit_interval().is_valid());
        assert!(ParameterBounds::fixed(4.0).is_valid());
        assert!(!ParameterBounds::new(1.0, 0.0).is_valid());
        assert!(!ParameterBounds::new(f64::NAN, 1.0).is_valid());
    }
}
