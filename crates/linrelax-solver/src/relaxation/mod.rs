//! Relaxation engines.
//!
//! A relaxation repeatedly sweeps a prepared constraint list, moving
//! variable values towards each constraint's hyperplane until every
//! constraint is within tolerance or the sweep budget runs out.
//!
//! Three variants are provided:
//! - [`Kaczmarz`]: projects every participating variable.
//! - [`GaussSeidel`]: moves only the pivot variable of each entry.
//! - [`ForceDirected`]: aggregates soft constraints as springs and
//!   re-enforces hard constraints after every force pass.

mod force;
mod gauss_seidel;
mod kaczmarz;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt::Debug;

use linrelax_core::{ConstraintId, LinearSpec, ResultStatus};

use crate::scope::SolveScope;

pub use force::ForceDirected;
pub use gauss_seidel::GaussSeidel;
pub use kaczmarz::Kaczmarz;

/// Sweep budget used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1000;

/// A hard violation still counts as converging when its error at the end
/// of the budget is below this share of the error at mid-budget.
pub const CONVERGING_RATIO: f64 = 0.5;

/// Iterative engine that moves variable values towards satisfying a
/// prepared list of constraints.
///
/// `prepare` is called whenever the constraint list changes; `relax`
/// may then be called any number of times. Values are read from and
/// written back to the specification.
pub trait Relaxation: Send + Debug {
    /// Installs the constraint list swept by [`relax`](Self::relax).
    ///
    /// The order of `constraints` is the sweep order.
    fn prepare(&mut self, spec: &mut LinearSpec, constraints: &[ConstraintId]);

    /// Runs at most `max_iterations` sweeps and classifies the result.
    fn relax(&mut self, spec: &mut LinearSpec, scope: &mut SolveScope, max_iterations: u64) -> RelaxOutcome;

    /// Drops a removed constraint from the prepared list.
    ///
    /// Returns `false` when the relaxation needs a fresh
    /// [`prepare`](Self::prepare) instead.
    fn constraint_removed(&mut self, _spec: &LinearSpec, _id: ConstraintId) -> bool {
        false
    }

    /// Configured sweep budget.
    fn max_iterations(&self) -> u64;

    /// Short name used in log output.
    fn relaxation_type_name(&self) -> &'static str;
}

impl<R: Relaxation + ?Sized> Relaxation for Box<R> {
    fn prepare(&mut self, spec: &mut LinearSpec, constraints: &[ConstraintId]) {
        (**self).prepare(spec, constraints)
    }

    fn relax(&mut self, spec: &mut LinearSpec, scope: &mut SolveScope, max_iterations: u64) -> RelaxOutcome {
        (**self).relax(spec, scope, max_iterations)
    }

    fn constraint_removed(&mut self, spec: &LinearSpec, id: ConstraintId) -> bool {
        (**self).constraint_removed(spec, id)
    }

    fn max_iterations(&self) -> u64 {
        (**self).max_iterations()
    }

    fn relaxation_type_name(&self) -> &'static str {
        (**self).relaxation_type_name()
    }
}

/// Result of one bounded relaxation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxOutcome {
    pub status: ResultStatus,
    /// Sweeps actually performed.
    pub sweeps: u64,
    /// Largest residual over the prepared, enabled constraints.
    pub max_error: f64,
    /// Largest residual over the prepared, enabled hard constraints.
    pub hard_error: f64,
    /// Residual of each constraint observed before it was projected during
    /// the final sweep.
    pub sweep_residuals: BTreeMap<ConstraintId, f64>,
}

impl RelaxOutcome {
    /// Residual recorded for `id` during the final sweep, zero if none.
    pub fn sweep_residual(&self, id: ConstraintId) -> f64 {
        self.sweep_residuals.get(&id).copied().unwrap_or(0.0)
    }
}

/// Residual summary of a constraint list against a value buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ErrorSummary {
    pub max: f64,
    pub hard: f64,
    pub soft_squared: f64,
}

impl ErrorSummary {
    pub fn measure(spec: &LinearSpec, constraints: &[ConstraintId], values: &[f64]) -> Self {
        let mut summary = Self::default();
        for c in constraints
            .iter()
            .filter_map(|&id| spec.constraint(id))
            .filter(|c| c.is_enabled())
        {
            let error = c.error(values).abs();
            summary.max = summary.max.max(error);
            if c.is_hard() {
                summary.hard = summary.hard.max(error);
            } else {
                summary.soft_squared += error * error;
            }
        }
        summary
    }
}

/// Tracks hard-constraint progress across a sweep budget so that a run
/// cut short while still converging is not reported as infeasible.
#[derive(Debug, Clone)]
pub(crate) struct ProgressMonitor {
    midpoint: u64,
    checkpoint: Option<f64>,
}

impl ProgressMonitor {
    pub fn new(max_iterations: u64) -> Self {
        Self {
            midpoint: max_iterations / 2,
            checkpoint: None,
        }
    }

    /// Records the hard error measured after `sweep`.
    pub fn record(&mut self, sweep: u64, hard_error: f64) {
        if self.checkpoint.is_none() && sweep >= self.midpoint {
            self.checkpoint = Some(hard_error);
        }
    }

    /// Classifies the final residuals.
    pub fn classify(&self, summary: ErrorSummary, tolerance: f64) -> ResultStatus {
        if summary.max < tolerance {
            ResultStatus::Optimal
        } else if summary.hard < tolerance {
            ResultStatus::Suboptimal
        } else if self
            .checkpoint
            .is_some_and(|mid| summary.hard < mid * CONVERGING_RATIO)
        {
            ResultStatus::Suboptimal
        } else {
            ResultStatus::Infeasible
        }
    }
}

/// Enabled constraints of `constraints` that still exist in `spec`.
pub(crate) fn live_constraints(spec: &LinearSpec, constraints: &[ConstraintId]) -> Vec<ConstraintId> {
    constraints
        .iter()
        .copied()
        .filter(|&id| spec.constraint(id).is_some_and(|c| c.is_enabled()))
        .collect()
}
