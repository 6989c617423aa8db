//! Synthetic datasets generated by the dynamics model itself.
//!
//! Each sample draws an independent state, action and timestep from
//! uniform ranges, steps the model once with known constants and
//! optionally adds Gaussian observation noise to the next state. With
//! zero noise the known constants reach a loss of exactly zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;
use vehicle_core::types::{ControlAction, VehicleState};

use super::error::CalibrationError;
use super::sample::{Dataset, TrainingSample};
use crate::models::{step, ModelConstants};

/// Builder for synthetic datasets.
///
/// # Examples
/// ```
/// use vehicle_models::calibration::{ResidualEvaluator, SyntheticDatasetBuilder};
/// use vehicle_models::models::ModelConstants;
///
/// let constants = ModelConstants::default();
/// let dataset = SyntheticDatasetBuilder::new(constants)
///     .with_samples(50)
///     .with_seed(7)
///     .build()
///     .unwrap();
///
/// assert_eq!(dataset.len(), 50);
/// assert_eq!(ResidualEvaluator::new(&dataset).loss(&constants), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDatasetBuilder {
    constants: ModelConstants<f64>,
    samples: usize,
    seed: u64,
    noise_std: f64,
    speed_range: (f64, f64),
    steering_range: (f64, f64),
    torque_range: (f64, f64),
    timestep_range: (f64, f64),
    position_range: (f64, f64),
}

impl SyntheticDatasetBuilder {
    /// Start a builder for the given true constants.
    pub fn new(constants: ModelConstants<f64>) -> Self {
        Self {
            constants,
            samples: 200,
            seed: 42,
            noise_std: 0.0,
            speed_range: (1.0, 20.0),
            steering_range: (-0.3, 0.3),
            torque_range: (5.0, 80.0),
            timestep_range: (0.1, 0.5),
            position_range: (-50.0, 50.0),
        }
    }

    /// Number of samples.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Standard deviation of the noise added to every next-state component.
    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Range of initial speeds.
    pub fn with_speed_range(mut self, lo: f64, hi: f64) -> Self {
        self.speed_range = (lo, hi);
        self
    }

    /// Range of logged steering angles.
    pub fn with_steering_range(mut self, lo: f64, hi: f64) -> Self {
        self.steering_range = (lo, hi);
        self
    }

    /// Range of motor torque commands.
    pub fn with_torque_range(mut self, lo: f64, hi: f64) -> Self {
        self.torque_range = (lo, hi);
        self
    }

    /// Range of step lengths.
    pub fn with_timestep_range(mut self, lo: f64, hi: f64) -> Self {
        self.timestep_range = (lo, hi);
        self
    }

    fn check_range(name: &str, (lo, hi): (f64, f64)) -> Result<(), CalibrationError> {
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            Ok(())
        } else {
            Err(CalibrationError::configuration(format!(
                "{name} range [{lo}, {hi}] is invalid"
            )))
        }
    }

    fn draw(rng: &mut StdRng, (lo, hi): (f64, f64)) -> f64 {
        if lo == hi {
            lo
        } else {
            rng.gen_range(lo..=hi)
        }
    }

    /// Generate the dataset.
    ///
    /// # Errors
    /// - [`CalibrationError::Model`] if the constants are not physical
    /// - [`CalibrationError::Configuration`] for an invalid range, a
    ///   non-positive timestep range or a negative noise level
    pub fn build(&self) -> Result<Dataset, CalibrationError> {
        self.constants.validate()?;
        Self::check_range("speed", self.speed_range)?;
        Self::check_range("steering", self.steering_range)?;
        Self::check_range("torque", self.torque_range)?;
        Self::check_range("timestep", self.timestep_range)?;
        if self.timestep_range.0 <= 0.0 {
            return Err(CalibrationError::configuration("timestep range must be positive"));
        }
        if self.speed_range.0 < 0.0 {
            return Err(CalibrationError::configuration("speed range must be non-negative"));
        }
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(CalibrationError::configuration(format!(
                "noise level must be finite and non-negative, got {}",
                self.noise_std
            )));
        }
        let noise = Normal::new(0.0, self.noise_std).map_err(|err| {
            CalibrationError::configuration(format!("noise level {}: {err}", self.noise_std))
        })?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(self.samples);

        for _ in 0..self.samples {
            let state = VehicleState::new(
                Self::draw(&mut rng, self.position_range),
                Self::draw(&mut rng, self.position_range),
                Self::draw(&mut rng, (-std::f64::consts::PI, std::f64::consts::PI)),
                Self::draw(&mut rng, self.speed_range),
            );
            let action = ControlAction::new(
                Self::draw(&mut rng, self.steering_range),
                Self::draw(&mut rng, self.torque_range),
            );
            let timestep = Self::draw(&mut rng, self.timestep_range);

            let mut truth = step(&state, &action, timestep, &self.constants);
            if self.noise_std > 0.0 {
                truth.x += noise.sample(&mut rng);
                truth.y += noise.sample(&mut rng);
                truth.yaw += noise.sample(&mut rng);
                truth.speed += noise.sample(&mut rng);
            }

            samples.push(TrainingSample::new(state, action, timestep, truth)?);
        }

        debug!(samples = samples.len(), seed = self.seed, noise = self.noise_std, "generated synthetic dataset");
        Ok(Dataset::new(samples))
    }
}
