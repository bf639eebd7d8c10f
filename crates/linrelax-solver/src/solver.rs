//! Solvers plugged into a [`LinearSpec`].
//!
//! [`RelaxationSolver`] runs a single relaxation over the enabled
//! constraints in insertion order. [`ConflictResolvingSolver`] wraps a
//! relaxation in a [`ConflictStrategy`] that suspends low-priority
//! constraints when the full system cannot be satisfied.

use std::any::Any;

use linrelax_core::{Constraint, ConstraintId, LinearSpec, ResultStatus, Solver};
use tracing::info;

use crate::conflict::ConflictStrategy;
use crate::relaxation::{Kaczmarz, Relaxation};
use crate::scope::SolveScope;
use crate::stats::SolveStats;

/// Zeroes every value when `reset` is set, otherwise only unset ones.
fn seed_values(spec: &mut LinearSpec, reset: bool) {
    if reset {
        spec.reset_values();
    } else {
        spec.initialize_unset();
    }
}

/// Solver running one relaxation without conflict resolution.
///
/// The relaxation is prepared lazily: the prepared constraint list is
/// kept across solves and only rebuilt when constraints were added or
/// their enabled flags changed. Removals are applied incrementally when
/// the relaxation supports it.
#[derive(Debug)]
pub struct RelaxationSolver<R = Kaczmarz> {
    relaxation: R,
    reset: bool,
    prepared: Option<Vec<ConstraintId>>,
    stats: SolveStats,
}

impl<R: Relaxation> RelaxationSolver<R> {
    pub fn new(relaxation: R) -> Self {
        Self {
            relaxation,
            reset: false,
            prepared: None,
            stats: SolveStats::default(),
        }
    }

    /// Zero all variables before each solve instead of starting from the
    /// previous values.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn relaxation(&self) -> &R {
        &self.relaxation
    }

    /// Statistics of the most recent solve.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }
}

impl Default for RelaxationSolver<Kaczmarz> {
    fn default() -> Self {
        Self::new(Kaczmarz::new())
    }
}

impl<R: Relaxation + 'static> Solver for RelaxationSolver<R> {
    fn solve(&mut self, spec: &mut LinearSpec) -> ResultStatus {
        let mut scope = SolveScope::for_spec(spec);
        seed_values(spec, self.reset);

        let enabled = spec.enabled_constraints();
        if self.prepared.as_ref() != Some(&enabled) {
            self.relaxation.prepare(spec, &enabled);
            self.prepared = Some(enabled);
        }

        info!(
            event = "solve_start",
            solver = self.solver_type_name(),
            relaxation = self.relaxation.relaxation_type_name(),
            constraint_count = spec.constraint_count(),
            variable_count = spec.variables().len(),
        );

        let max_iterations = self.relaxation.max_iterations();
        let outcome = self.relaxation.relax(spec, &mut scope, max_iterations);

        self.stats = scope.into_stats();
        info!(
            event = "solve_end",
            solver = self.solver_type_name(),
            status = %outcome.status,
            sweeps = outcome.sweeps,
            max_error = outcome.max_error,
            projections = self.stats.projections,
            duration_ms = self.stats.elapsed().as_millis() as u64,
        );
        outcome.status
    }

    fn solver_type_name(&self) -> &'static str {
        "Relaxation"
    }

    fn on_constraint_added(&mut self, _spec: &LinearSpec, _id: ConstraintId) {
        self.prepared = None;
    }

    fn on_constraint_removed(&mut self, spec: &LinearSpec, id: ConstraintId, _removed: &Constraint) {
        if self.relaxation.constraint_removed(spec, id) {
            if let Some(prepared) = &mut self.prepared {
                prepared.retain(|&c| c != id);
            }
        } else {
            self.prepared = None;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Solver that isolates and suspends conflicting constraints.
///
/// Each solve sorts the enabled constraints by descending penalty (ties
/// keep insertion order) and hands them to the strategy. Constraints the
/// strategy suspends stay disabled until the next solve, which enables
/// them again and lets the strategy decide afresh; see
/// [`last_suspended`](Self::last_suspended). Constraints the caller
/// disables through [`LinearSpec::set_enabled`] are left alone.
#[derive(Debug)]
pub struct ConflictResolvingSolver<S, R = Kaczmarz> {
    strategy: S,
    relaxation: R,
    reset: bool,
    max_iterations: Option<u64>,
    suspended: Vec<ConstraintId>,
    stats: SolveStats,
}

impl<S: ConflictStrategy, R: Relaxation> ConflictResolvingSolver<S, R> {
    pub fn new(strategy: S, relaxation: R) -> Self {
        Self {
            strategy,
            relaxation,
            reset: false,
            max_iterations: None,
            suspended: Vec::new(),
            stats: SolveStats::default(),
        }
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sweep budget of each relaxation sub-solve; defaults to the
    /// relaxation's own budget.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Constraints suspended by the most recent solve.
    pub fn last_suspended(&self) -> &[ConstraintId] {
        &self.suspended
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }
}

impl<S, R> Solver for ConflictResolvingSolver<S, R>
where
    S: ConflictStrategy + 'static,
    R: Relaxation + 'static,
{
    fn solve(&mut self, spec: &mut LinearSpec) -> ResultStatus {
        let mut scope = SolveScope::for_spec(spec);
        seed_values(spec, self.reset);

        // Earlier suspensions are reconsidered; the conflict may be gone.
        for id in self.suspended.drain(..) {
            if let Some(constraint) = spec.constraint_mut(id) {
                constraint.set_enabled(true);
            }
        }
        let mut sorted = spec.enabled_constraints();
        spec.sort_by_priority(&mut sorted);

        info!(
            event = "solve_start",
            solver = self.solver_type_name(),
            strategy = self.strategy.strategy_type_name(),
            relaxation = self.relaxation.relaxation_type_name(),
            constraint_count = sorted.len(),
            variable_count = spec.variables().len(),
        );

        let max_iterations = self.max_iterations.unwrap_or_else(|| self.relaxation.max_iterations());
        let resolution = self
            .strategy
            .resolve(spec, &sorted, &mut self.relaxation, &mut scope, max_iterations);

        self.stats = scope.into_stats();
        info!(
            event = "solve_end",
            solver = self.solver_type_name(),
            status = %resolution.status,
            suspended = resolution.suspended.len(),
            relax_calls = self.stats.relax_calls,
            sweeps = self.stats.sweeps,
            duration_ms = self.stats.elapsed().as_millis() as u64,
        );
        self.suspended = resolution.suspended;
        resolution.status
    }

    fn solver_type_name(&self) -> &'static str {
        "ConflictResolving"
    }

    fn on_constraint_enabled(&mut self, _spec: &LinearSpec, id: ConstraintId, _enabled: bool) {
        self.suspended.retain(|&c| c != id);
    }

    fn on_constraint_removed(&mut self, spec: &LinearSpec, id: ConstraintId, _removed: &Constraint) {
        self.relaxation.constraint_removed(spec, id);
        self.suspended.retain(|&c| c != id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
