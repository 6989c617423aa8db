//! Affine map between physical constants and unit solver coordinates.
//!
//! Bounded slots map `[lo, hi]` onto `[0, 1]` so the solver sees every
//! constant on the same scale. Fixed slots map to the point `0` and always
//! map back to their exact physical value.

use vehicle_core::traits::calibration::ParameterBounds;

/// Per-slot affine scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitScaling {
    bounds: Vec<ParameterBounds>,
}

impl UnitScaling {
    /// Build from physical bounds, which must be finite and ordered.
    pub fn new(bounds: Vec<ParameterBounds>) -> Self {
        Self { bounds }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// True with no slots.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Solver bounds in unit coordinates.
    pub fn unit_bounds(&self) -> Vec<ParameterBounds> {
        self.bounds
            .iter()
            .map(|b| {
                if b.is_fixed() {
                    ParameterBounds::fixed(0.0)
                } else {
                    ParameterBounds::unit_interval()
                }
            })
            .collect()
    }

    /// Physical values to unit coordinates.
    pub fn to_unit(&self, physical: &[f64]) -> Vec<f64> {
        physical
            .iter()
            .zip(&self.bounds)
            .map(|(x, b)| {
                if b.is_fixed() {
                    0.0
                } else {
                    (b.clamp(*x) - b.min) / b.width()
                }
            })
            .collect()
    }

    /// Unit coordinates to physical values, clamped to the bounds.
    pub fn to_physical(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(&self.bounds)
            .map(|(u, b)| b.clamp(b.min + u * b.width()))
            .collect()
    }
}
