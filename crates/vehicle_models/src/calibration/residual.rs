//! Single-step residuals of the dynamics model over a dataset.
//!
//! For each sample the model predicts one step from the logged input state;
//! the prediction and the logged next state are compared in log order
//! `[x, y, v, yaw]`. The loss is the plain sum of squared differences over
//! all samples and components.
//!
//! ## Parallel evaluation
//!
//! With the `parallel` feature, datasets at or above the configured
//! threshold are mapped with rayon. Per-sample terms are collected in
//! dataset order and summed sequentially, so the result is bit-identical to
//! the sequential path.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use vehicle_core::types::ModelError;

use super::sample::{to_schema_order, Dataset, TrainingSample};
use crate::models::{step, ModelConstants};

/// Default sample count from which the parallel path is used.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Scalar objective over model constants.
///
/// The calibrator only sees this trait, so callers can wrap an evaluator,
/// e.g. to record every proposed vector.
pub trait Objective {
    /// Loss for one set of constants.
    fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError>;

    /// Number of scalar residuals summed into the loss.
    fn observation_count(&self) -> usize;
}

/// Per-component summary of the residuals at one set of constants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResidualBreakdown {
    /// Number of samples
    pub sample_count: usize,
    /// Sum of squares per log-order component `[x, y, v, yaw]`
    pub component_sse: [f64; 4],
    /// Largest absolute residual per component
    pub component_max_abs: [f64; 4],
    /// Total loss, the sum of `component_sse`
    pub loss: f64,
}

impl ResidualBreakdown {
    /// Root mean square per component.
    pub fn component_rmse(&self) -> [f64; 4] {
        let n = self.sample_count.max(1) as f64;
        self.component_sse.map(|sse| (sse / n).sqrt())
    }

    /// Root mean square over all residuals.
    pub fn rmse(&self) -> f64 {
        let n = (4 * self.sample_count).max(1) as f64;
        (self.loss / n).sqrt()
    }

    /// Largest absolute residual of any component.
    pub fn max_abs_error(&self) -> f64 {
        self.component_max_abs.iter().copied().fold(0.0, f64::max)
    }
}

/// Evaluates the single-step loss of a dataset.
///
/// # Examples
/// ```
/// use vehicle_core::types::{ControlAction, VehicleState};
/// use vehicle_models::calibration::{to_schema_order, Dataset, ResidualEvaluator, TrainingSample};
/// use vehicle_models::models::{step, ModelConstants};
///
/// let constants = ModelConstants::default();
/// let state = VehicleState::new(0.0, 0.0, 0.0, 4.0);
/// let action = ControlAction::new(0.1, 30.0);
/// let truth = step(&state, &action, 0.1, &constants);
/// let sample = TrainingSample::new(state, action, 0.1, truth).unwrap();
///
/// let dataset = Dataset::new(vec![sample]);
/// let evaluator = ResidualEvaluator::new(&dataset);
/// assert_eq!(evaluator.loss(&constants), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ResidualEvaluator<'a> {
    dataset: &'a Dataset,
    parallel_threshold: usize,
}

impl<'a> ResidualEvaluator<'a> {
    /// Create an evaluator bound to a dataset.
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the sample count from which the parallel path is used.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// The bound dataset.
    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    /// Residual `prediction - truth` of one sample in log order.
    #[inline]
    pub fn sample_residual(sample: &TrainingSample, constants: &ModelConstants<f64>) -> [f64; 4] {
        let predicted = step(&sample.state_in, &sample.action, sample.timestep, constants);
        let predicted = to_schema_order(&predicted);
        let truth = to_schema_order(&sample.state_out_truth);
        std::array::from_fn(|i| predicted[i] - truth[i])
    }

    #[inline]
    fn squared_norm(residual: &[f64; 4]) -> f64 {
        residual.iter().map(|r| r * r).sum()
    }

    #[inline]
    fn sample_loss(sample: &TrainingSample, constants: &ModelConstants<f64>) -> f64 {
        Self::squared_norm(&Self::sample_residual(sample, constants))
    }

    /// Sum of squared residuals over every sample and component.
    pub fn loss(&self, constants: &ModelConstants<f64>) -> f64 {
        let samples = self.dataset.samples();

        #[cfg(feature = "parallel")]
        if samples.len() >= self.parallel_threshold {
            let terms: Vec<f64> = samples
                .par_iter()
                .map(|sample| Self::sample_loss(sample, constants))
                .collect();
            return terms.iter().sum();
        }

        samples
            .iter()
            .map(|sample| Self::sample_loss(sample, constants))
            .sum()
    }

    /// [`loss`](Self::loss) for a flat slot-order constants vector.
    ///
    /// # Errors
    /// Fails on a wrong length or an invalid torque mode.
    pub fn loss_from_vector(&self, constants: &[f64]) -> Result<f64, ModelError> {
        let constants = ModelConstants::from_slice(constants)?;
        Ok(self.loss(&constants))
    }

    /// Per-component residual summary.
    ///
    /// `loss` is reduced sample by sample in log order, the same way
    /// [`loss`](Self::loss) is, so both agree to the last bit.
    pub fn breakdown(&self, constants: &ModelConstants<f64>) -> ResidualBreakdown {
        let mut component_sse = [0.0; 4];
        let mut component_max_abs = [0.0_f64; 4];
        let mut terms = Vec::with_capacity(self.dataset.len());

        for sample in self.dataset {
            let residual = Self::sample_residual(sample, constants);
            for i in 0..4 {
                component_sse[i] += residual[i] * residual[i];
                component_max_abs[i] = component_max_abs[i].max(residual[i].abs());
            }
            terms.push(Self::squared_norm(&residual));
        }

        ResidualBreakdown {
            sample_count: self.dataset.len(),
            component_sse,
            component_max_abs,
            loss: terms.iter().sum(),
        }
    }
}

impl Objective for ResidualEvaluator<'_> {
    fn loss(&self, constants: &ModelConstants<f64>) -> Result<f64, ModelError> {
        Ok(ResidualEvaluator::loss(self, constants))
    }

    fn observation_count(&self) -> usize {
        4 * self.dataset.len()
    }
}
