//! Kaczmarz projection.

use std::collections::BTreeMap;

use linrelax_config::KaczmarzConfig;
use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Operator};
use tracing::{debug, trace};

use super::{live_constraints, ErrorSummary, ProgressMonitor, RelaxOutcome, Relaxation, DEFAULT_MAX_ITERATIONS};
use crate::scope::SolveScope;

/// Projects the current point onto each constraint's hyperplane in turn.
///
/// For a violated constraint with signed deficit `d` and squared norm
/// `‖a‖²`, every participating variable moves by `λ·w·(d / ‖a‖²)·aᵢ`,
/// where `w` is 1 for hard constraints and the penalty for soft ones.
/// Soft projections are additionally scaled by `cooling^sweep`.
///
/// When soft constraints take part, each sweep ends with a pass over the
/// hard constraints alone, so a soft projection cannot leave a hard
/// constraint violated at the end of a sweep.
///
/// # Example
///
/// ```
/// use linrelax_core::{Constraint, LinearSpec, Summand};
/// use linrelax_solver::{Kaczmarz, RelaxationSolver};
///
/// let mut spec = LinearSpec::with_solver(Box::new(RelaxationSolver::new(Kaczmarz::new())));
/// let x = spec.add_variable();
/// let y = spec.add_variable();
/// spec.add_constraint(Constraint::equal([Summand::new(1.0, x), Summand::new(1.0, y)], 10.0)).unwrap();
///
/// assert!(spec.solve().is_optimal());
/// assert!((spec.value(x) + spec.value(y) - 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Kaczmarz {
    max_iterations: u64,
    relaxation_factor: f64,
    cooling_factor: f64,
    constraints: Vec<ConstraintId>,
}

impl Kaczmarz {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            relaxation_factor: 1.0,
            cooling_factor: 1.0,
            constraints: Vec::new(),
        }
    }

    pub fn from_config(config: &KaczmarzConfig) -> Self {
        Self {
            max_iterations: config.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            relaxation_factor: config.relaxation_factor.unwrap_or(1.0),
            cooling_factor: config.cooling_factor.unwrap_or(1.0),
            constraints: Vec::new(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.relaxation_factor = factor;
        self
    }

    pub fn with_cooling_factor(mut self, cooling: f64) -> Self {
        self.cooling_factor = cooling;
        self
    }

    pub fn relaxation_factor(&self) -> f64 {
        self.relaxation_factor
    }

    pub fn cooling_factor(&self) -> f64 {
        self.cooling_factor
    }

    /// Constraint list installed by the last `prepare`.
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }
}

impl Default for Kaczmarz {
    fn default() -> Self {
        Self::new()
    }
}

/// Residual of `constraint` before projection, and whether it was projected.
///
/// Satisfied inequalities and degenerate constraints are left alone;
/// equalities are always projected.
pub(crate) fn project(constraint: &Constraint, values: &mut [f64], factor: f64) -> (f64, bool) {
    let deficit = constraint.deficit(values);
    if constraint.operator() != Operator::Eq && deficit == 0.0 {
        return (0.0, false);
    }
    let norm = constraint.norm_squared();
    if norm < NEAR_ZERO {
        return (deficit.abs(), false);
    }
    let step = factor * deficit / norm;
    for s in constraint.summands() {
        values[s.variable().index()] += step * s.coefficient();
    }
    (deficit.abs(), true)
}

impl Relaxation for Kaczmarz {
    fn prepare(&mut self, _spec: &mut LinearSpec, constraints: &[ConstraintId]) {
        self.constraints = constraints.to_vec();
    }

    fn relax(&mut self, spec: &mut LinearSpec, scope: &mut SolveScope, max_iterations: u64) -> RelaxOutcome {
        let tolerance = scope.tolerance();
        let active = live_constraints(spec, &self.constraints);
        let mut values = spec.values();
        let mut residuals = BTreeMap::new();
        let mut monitor = ProgressMonitor::new(max_iterations);
        let mut summary = ErrorSummary::measure(spec, &active, &values);
        let mut sweeps = 0;
        let mut soft_scale = self.relaxation_factor;
        let has_soft = active
            .iter()
            .any(|&id| spec.constraint(id).is_some_and(|c| !c.is_hard()));

        scope.stats_mut().record_relax_call();

        while summary.max >= tolerance && sweeps < max_iterations {
            sweeps += 1;
            for &id in &active {
                let Some(constraint) = spec.constraint(id) else {
                    continue;
                };
                let factor = if constraint.is_hard() {
                    self.relaxation_factor
                } else {
                    soft_scale * constraint.penalty()
                };
                let (residual, projected) = project(constraint, &mut values, factor);
                residuals.insert(id, residual);
                if projected {
                    scope.stats_mut().record_projection();
                }
            }
            if has_soft {
                for constraint in active.iter().filter_map(|&id| spec.constraint(id)).filter(|c| c.is_hard()) {
                    if project(constraint, &mut values, self.relaxation_factor).1 {
                        scope.stats_mut().record_projection();
                    }
                }
            }
            scope.stats_mut().record_sweep();
            soft_scale *= self.cooling_factor;

            summary = ErrorSummary::measure(spec, &active, &values);
            monitor.record(sweeps, summary.hard);
            trace!(
                event = "sweep",
                sweep = sweeps,
                max_error = summary.max,
                hard_error = summary.hard,
            );
        }

        spec.store_values(&values);
        let status = monitor.classify(summary, tolerance);
        debug!(
            event = "relax_end",
            relaxation = "Kaczmarz",
            status = %status,
            sweeps,
            max_error = summary.max,
        );
        RelaxOutcome {
            status,
            sweeps,
            max_error: summary.max,
            hard_error: summary.hard,
            sweep_residuals: residuals,
        }
    }

    fn constraint_removed(&mut self, _spec: &LinearSpec, id: ConstraintId) -> bool {
        self.constraints.retain(|&c| c != id);
        true
    }

    fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    fn relaxation_type_name(&self) -> &'static str {
        "Kaczmarz"
    }
}
