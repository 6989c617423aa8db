//! Projected limited-memory BFGS for box-constrained minimisation.
//!
//! This module provides the [`ProjectedLbfgsSolver`] for minimising a scalar
//! black-box objective over a hyper-rectangle, as needed when calibrating
//! physical model constants.
//!
//! # Algorithm
//!
//! Each iteration:
//!
//! ```text
//! g   = ∇f(x)                        (central finite differences)
//! A   = { i : x_i on a bound and -g_i points outside }  ∪ fixed
//! d   = -H g  restricted to the complement of A    (two-loop recursion)
//! x+  = P(x + α d)                   (projection onto the box)
//! ```
//!
//! where `H` is the limited-memory inverse Hessian estimate and `α` comes from
//! a backtracking Armijo search along the projected path. The run stops when
//!
//! ```text
//! (f_k - f_{k+1}) / max(|f_k|, |f_{k+1}|, 1) <= tolerance
//! ‖P(x - g) - x‖_∞ <= gradient_tolerance
//! ```
//!
//! or when the iteration or evaluation budget is exhausted.
//!
//! # Example
//!
//! ```
//! use vehicle_core::math::solvers::{LbfgsConfig, ProjectedLbfgsSolver, Termination};
//! use vehicle_core::traits::calibration::ParameterBounds;
//!
//! // The unconstrained minimum (3, -1) lies outside the box; the solver
//! // stops on the nearest face.
//! let bounds = [ParameterBounds::new(0.0, 2.0), ParameterBounds::new(-5.0, 5.0)];
//! let solver = ProjectedLbfgsSolver::new(LbfgsConfig::default());
//! let result = solver
//!     .minimize(
//!         |p: &[f64]| (p[0] - 3.0).powi(2) + 10.0 * (p[1] + 1.0).powi(2),
//!         vec![1.0, 1.0],
//!         &bounds,
//!     )
//!     .unwrap();
//!
//! assert!(result.converged);
//! assert_eq!(result.params[0], 2.0);
//! assert!((result.params[1] + 1.0).abs() < 1e-6);
//! ```

use std::collections::VecDeque;

use tracing::debug;

use crate::traits::calibration::{CalibrationConfig, ParameterBounds};
use crate::types::SolverError;

/// Configuration for the projected L-BFGS solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbfgsConfig {
    /// Relative objective reduction below which the run has converged.
    pub tolerance: f64,
    /// Projected gradient infinity-norm below which the run has converged.
    pub gradient_tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of objective evaluations.
    pub max_evaluations: usize,
    /// Number of correction pairs kept.
    pub history_size: usize,
    /// Relative finite-difference step.
    pub finite_diff_step: f64,
    /// Armijo sufficient-decrease constant.
    pub armijo: f64,
    /// Maximum number of step halvings per line search.
    pub max_line_search: usize,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            gradient_tolerance: 1e-10,
            max_iterations: 500,
            max_evaluations: 20_000,
            history_size: 10,
            finite_diff_step: 1e-6,
            armijo: 1e-4,
            max_line_search: 40,
        }
    }
}

impl LbfgsConfig {
    /// Create a new configuration.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Create from the solver-independent calibration settings.
    pub fn from_calibration_config(config: &CalibrationConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            gradient_tolerance: config.gradient_tolerance,
            max_iterations: config.max_iterations,
            max_evaluations: config.max_evaluations,
            history_size: config.history_size.max(1),
            finite_diff_step: config.finite_diff_step,
            ..Default::default()
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Relative objective reduction fell below `tolerance`.
    RelativeReduction,
    /// Projected gradient fell below `gradient_tolerance`.
    ProjectedGradient,
    /// No step along the steepest projected descent direction lowers the
    /// objective any further.
    NoFurtherReduction,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Evaluation budget exhausted.
    MaxEvaluations,
    /// The gradient became non-finite.
    NumericalBreakdown,
}

impl Termination {
    /// True for the stopping reasons that count as convergence.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            Termination::RelativeReduction
                | Termination::ProjectedGradient
                | Termination::NoFurtherReduction
        )
    }
}

/// Result of a projected L-BFGS run.
#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsResult {
    /// Best parameters found.
    pub params: Vec<f64>,
    /// Objective at `params`.
    pub objective: f64,
    /// Number of accepted iterations.
    pub iterations: usize,
    /// Number of objective evaluations, gradient probes included.
    pub evaluations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
    /// Why the run stopped.
    pub termination: Termination,
}

#[derive(Debug, Clone)]
struct CorrectionPair {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

/// Box-constrained limited-memory quasi-Newton solver.
///
/// Solves problems of the form:
/// ```text
/// min_p f(p)   subject to   lo_i <= p_i <= hi_i
/// ```
///
/// The objective is treated as a black box; a non-finite value at a trial
/// point simply rejects that point.
#[derive(Debug, Clone)]
pub struct ProjectedLbfgsSolver {
    config: LbfgsConfig,
}

impl ProjectedLbfgsSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: LbfgsConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: LbfgsConfig::default(),
        }
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LbfgsConfig {
        &self.config
    }

    /// Minimise `objective` inside `bounds`, starting from `initial_params`
    /// projected onto the box.
    ///
    /// # Returns
    ///
    /// * `Ok(LbfgsResult)` - Best point found, converged or not
    /// * `Err(SolverError)` - If the problem is ill-posed
    pub fn minimize<F>(
        &self,
        mut objective: F,
        initial_params: Vec<f64>,
        bounds: &[ParameterBounds],
    ) -> Result<LbfgsResult, SolverError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n_params = initial_params.len();
        if n_params == 0 {
            return Err(SolverError::EmptyProblem);
        }
        if bounds.len() != n_params {
            return Err(SolverError::BoundsMismatch {
                params: n_params,
                bounds: bounds.len(),
            });
        }
        for (index, b) in bounds.iter().enumerate() {
            if !b.is_valid() {
                return Err(SolverError::InfeasibleBounds {
                    index,
                    lower: b.min,
                    upper: b.max,
                });
            }
        }

        let free: Vec<bool> = bounds.iter().map(|b| !b.is_fixed()).collect();
        let mut x = project(&initial_params, bounds);
        let mut f = objective(&x);
        let mut evaluations = 1;
        if !f.is_finite() {
            return Err(SolverError::NonFiniteStart { value: f });
        }

        if !free.iter().any(|&is_free| is_free) {
            return Ok(LbfgsResult {
                params: x,
                objective: f,
                iterations: 0,
                evaluations,
                converged: true,
                termination: Termination::ProjectedGradient,
            });
        }

        let mut g = self.gradient(&mut objective, &x, f, bounds, &free, &mut evaluations);
        let mut history: VecDeque<CorrectionPair> =
            VecDeque::with_capacity(self.config.history_size);
        let mut iterations = 0;

        let termination = loop {
            if g.iter().any(|gi| !gi.is_finite()) {
                break Termination::NumericalBreakdown;
            }
            if projected_gradient_norm(&x, &g, bounds) <= self.config.gradient_tolerance {
                break Termination::ProjectedGradient;
            }
            if iterations >= self.config.max_iterations {
                break Termination::MaxIterations;
            }
            if evaluations >= self.config.max_evaluations {
                break Termination::MaxEvaluations;
            }

            let inactive = inactive_set(&x, &g, bounds, &free);
            let mut direction = two_loop(&g, &history, &inactive);
            if !(dot(&direction, &g) < 0.0) {
                history.clear();
                direction = steepest_descent(&g, &inactive);
            }
            if !(dot(&direction, &g) < 0.0) {
                break Termination::ProjectedGradient;
            }

            let initial_step = if history.is_empty() {
                (1.0 / norm(&direction)).min(1.0)
            } else {
                1.0
            };

            match self.line_search(
                &mut objective,
                &x,
                f,
                &g,
                &direction,
                initial_step,
                bounds,
                &mut evaluations,
            ) {
                Some((x_new, f_new)) => {
                    let g_new =
                        self.gradient(&mut objective, &x_new, f_new, bounds, &free, &mut evaluations);

                    let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
                    let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
                    let sy = dot(&s, &y);
                    if sy > f64::EPSILON * dot(&y, &y) {
                        if history.len() == self.config.history_size {
                            history.pop_front();
                        }
                        history.push_back(CorrectionPair { s, y, rho: 1.0 / sy });
                    }

                    let reduction = (f - f_new) / f.abs().max(f_new.abs()).max(1.0);
                    x = x_new;
                    f = f_new;
                    g = g_new;
                    iterations += 1;

                    debug!(iteration = iterations, objective = f, evaluations, "projected L-BFGS step");

                    if reduction <= self.config.tolerance {
                        break Termination::RelativeReduction;
                    }
                }
                None => {
                    if evaluations >= self.config.max_evaluations {
                        break Termination::MaxEvaluations;
                    }
                    if history.is_empty() {
                        break Termination::NoFurtherReduction;
                    }
                    // Retry from the steepest descent direction
                    history.clear();
                }
            }
        };

        Ok(LbfgsResult {
            params: x,
            objective: f,
            iterations,
            evaluations,
            converged: termination.is_converged(),
            termination,
        })
    }

    /// Central-difference gradient, one-sided against a bound.
    fn gradient<F>(
        &self,
        objective: &mut F,
        x: &[f64],
        f0: f64,
        bounds: &[ParameterBounds],
        free: &[bool],
        evaluations: &mut usize,
    ) -> Vec<f64>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut g = vec![0.0; x.len()];
        let mut probe = x.to_vec();

        for i in 0..x.len() {
            if !free[i] {
                continue;
            }
            let h = self.config.finite_diff_step * x[i].abs().max(1.0);

            let mut up = (x[i] + h).min(bounds[i].max);
            let mut f_up = f0;
            if up > x[i] {
                probe[i] = up;
                f_up = objective(&probe);
                *evaluations += 1;
                if !f_up.is_finite() {
                    up = x[i];
                    f_up = f0;
                }
            }

            let mut down = (x[i] - h).max(bounds[i].min);
            let mut f_down = f0;
            if down < x[i] {
                probe[i] = down;
                f_down = objective(&probe);
                *evaluations += 1;
                if !f_down.is_finite() {
                    down = x[i];
                    f_down = f0;
                }
            }

            probe[i] = x[i];
            let span = up - down;
            g[i] = if span > 0.0 { (f_up - f_down) / span } else { 0.0 };
        }

        g
    }

    /// Backtracking Armijo search along the projected path `P(x + α d)`.
    #[allow(clippy::too_many_arguments)]
    fn line_search<F>(
        &self,
        objective: &mut F,
        x: &[f64],
        f: f64,
        g: &[f64],
        direction: &[f64],
        initial_step: f64,
        bounds: &[ParameterBounds],
        evaluations: &mut usize,
    ) -> Option<(Vec<f64>, f64)>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut step = initial_step;

        for _ in 0..self.config.max_line_search {
            if *evaluations >= self.config.max_evaluations {
                return None;
            }

            let trial: Vec<f64> = x
                .iter()
                .zip(direction)
                .zip(bounds)
                .map(|((xi, di), b)| b.clamp(xi + step * di))
                .collect();
            let displacement: Vec<f64> = trial.iter().zip(x).map(|(t, xi)| t - xi).collect();
            if displacement.iter().all(|d| *d == 0.0) {
                return None;
            }

            let f_trial = objective(&trial);
            *evaluations += 1;

            let sufficient = f + self.config.armijo * dot(g, &displacement).min(0.0);
            if f_trial.is_finite() && f_trial < f && f_trial <= sufficient {
                return Some((trial, f_trial));
            }
            step *= 0.5;
        }

        None
    }
}

/// Clamp every coordinate onto its bounds.
fn project(params: &[f64], bounds: &[ParameterBounds]) -> Vec<f64> {
    params.iter().zip(bounds).map(|(p, b)| b.clamp(*p)).collect()
}

/// `‖P(x - g) - x‖_∞`
fn projected_gradient_norm(x: &[f64], g: &[f64], bounds: &[ParameterBounds]) -> f64 {
    x.iter()
        .zip(g)
        .zip(bounds)
        .map(|((xi, gi), b)| (b.clamp(xi - gi) - xi).abs())
        .fold(0.0, f64::max)
}

/// Coordinates free to move: not fixed and not pressed against a bound.
fn inactive_set(x: &[f64], g: &[f64], bounds: &[ParameterBounds], free: &[bool]) -> Vec<bool> {
    (0..x.len())
        .map(|i| {
            let at_lower = x[i] <= bounds[i].min && g[i] > 0.0;
            let at_upper = x[i] >= bounds[i].max && g[i] < 0.0;
            free[i] && !at_lower && !at_upper
        })
        .collect()
}

fn steepest_descent(g: &[f64], inactive: &[bool]) -> Vec<f64> {
    g.iter()
        .zip(inactive)
        .map(|(gi, &on)| if on { -gi } else { 0.0 })
        .collect()
}

/// L-BFGS two-loop recursion on the inactive subspace.
fn two_loop(g: &[f64], history: &VecDeque<CorrectionPair>, inactive: &[bool]) -> Vec<f64> {
    let mut q: Vec<f64> = g
        .iter()
        .zip(inactive)
        .map(|(gi, &on)| if on { *gi } else { 0.0 })
        .collect();

    let mut alphas = Vec::with_capacity(history.len());
    for pair in history.iter().rev() {
        let alpha = pair.rho * dot(&pair.s, &q);
        for (qi, yi) in q.iter_mut().zip(&pair.y) {
            *qi -= alpha * yi;
        }
        alphas.push(alpha);
    }

    if let Some(last) = history.back() {
        let gamma = dot(&last.s, &last.y) / dot(&last.y, &last.y);
        for qi in q.iter_mut() {
            *qi *= gamma;
        }
    }

    for (pair, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = pair.rho * dot(&pair.y, &q);
        for (qi, si) in q.iter_mut().zip(&pair.s) {
            *qi += (alpha - beta) * si;
        }
    }

    q.iter()
        .zip(inactive)
        .map(|(qi, &on)| if on { -qi } else { 0.0 })
        .collect()
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}
