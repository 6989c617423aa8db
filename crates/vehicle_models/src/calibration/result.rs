//! What a calibration run hands back.
//!
//! Each drivetrain mode solved leaves a [`ModeOutcome`]. The run summary
//! ([`CalibrationDiagnostics`]) is derived from those outcomes, so the
//! reported loss, termination and convergence always belong to the mode
//! whose constants are returned.

use std::time::Duration;

use vehicle_core::math::solvers::Termination;

use crate::models::TorqueMode;

/// Outcome of the solve for one drivetrain mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeOutcome {
    /// Mode held fixed during the solve
    pub mode: TorqueMode,
    /// Best loss reached
    pub loss: f64,
    /// Whether that solve converged
    pub converged: bool,
    /// Accepted solver iterations
    pub iterations: usize,
    /// Objective evaluations, gradient probes included
    pub evaluations: usize,
    /// Why the solve stopped
    pub termination: Termination,
}

/// Summary of a run over one or more drivetrain modes.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationDiagnostics {
    /// Iterations summed over every mode solved
    pub iterations: usize,
    /// Evaluations summed over every mode solved
    pub evaluations: usize,
    /// Loss of the winning mode (sum of squared residuals)
    pub final_loss: f64,
    /// `sqrt(final_loss / observations)`
    pub rmse: f64,
    /// Why the winning solve stopped; `None` when nothing was solved
    pub termination: Option<Termination>,
    /// Wall time of the whole run
    pub duration: Duration,
    /// One entry per mode, in solve order
    pub mode_outcomes: Vec<ModeOutcome>,
}

impl CalibrationDiagnostics {
    /// Summarise per-mode outcomes.
    ///
    /// The winner is the lowest loss; ties go to the earlier mode.
    /// `observations` is the number of scalar residuals behind each loss.
    pub fn summarise(outcomes: Vec<ModeOutcome>, observations: usize, duration: Duration) -> Self {
        let winner = Self::winner_of(&outcomes).copied();
        let final_loss = winner.map_or(f64::INFINITY, |w| w.loss);

        Self {
            iterations: outcomes.iter().map(|o| o.iterations).sum(),
            evaluations: outcomes.iter().map(|o| o.evaluations).sum(),
            final_loss,
            rmse: (final_loss / observations.max(1) as f64).sqrt(),
            termination: winner.map(|w| w.termination),
            duration,
            mode_outcomes: outcomes,
        }
    }

    fn winner_of(outcomes: &[ModeOutcome]) -> Option<&ModeOutcome> {
        outcomes.iter().fold(None, |best: Option<&ModeOutcome>, o| match best {
            Some(b) if b.loss <= o.loss => Some(b),
            _ => Some(o),
        })
    }

    /// Outcome whose constants were returned.
    pub fn winning_outcome(&self) -> Option<&ModeOutcome> {
        Self::winner_of(&self.mode_outcomes)
    }

    /// True when the winning solve converged.
    pub fn converged(&self) -> bool {
        self.winning_outcome().is_some_and(|w| w.converged)
    }
}

/// Calibrated parameters with their diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult<P> {
    /// Best parameters found
    pub parameters: P,
    /// Whether the solve that produced `parameters` converged
    pub converged: bool,
    /// Run summary
    pub diagnostics: CalibrationDiagnostics,
}

impl<P> CalibrationResult<P> {
    /// Pair parameters with their diagnostics; convergence is read from
    /// the winning outcome.
    pub fn new(parameters: P, diagnostics: CalibrationDiagnostics) -> Self {
        Self {
            parameters,
            converged: diagnostics.converged(),
            diagnostics,
        }
    }

    /// Best parameters found.
    pub fn params(&self) -> &P {
        &self.parameters
    }

    /// Run summary.
    pub fn diagnostics(&self) -> &CalibrationDiagnostics {
        &self.diagnostics
    }

    /// Final loss.
    pub fn loss(&self) -> f64 {
        self.diagnostics.final_loss
    }

    /// Root mean squared residual at the final loss.
    pub fn rmse(&self) -> f64 {
        self.diagnostics.rmse
    }
}
