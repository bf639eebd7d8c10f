//! Conflict resolution.
//!
//! When the full constraint set cannot be satisfied, a strategy decides
//! which constraints to suspend. All strategies work on the enabled
//! constraints sorted by descending penalty, so lower-priority
//! constraints are sacrificed first. Suspended constraints are left
//! disabled in the specification until the next solve, which enables
//! them again and reconsiders them.
//!
//! A strategy reports [`ResultStatus::Infeasible`] only when a suspended
//! hard constraint cannot be satisfied even on its own; soft
//! constraints are always eligible for suspension.

mod adding;
mod binary_search;
mod removing;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use linrelax_config::ConflictStrategyType;
use linrelax_core::{ConstraintId, LinearSpec, ResultStatus};
use tracing::debug;

use crate::relaxation::{RelaxOutcome, Relaxation};
use crate::scope::SolveScope;

pub use adding::AddingStrategy;
pub use binary_search::BinarySearchStrategy;
pub use removing::RemovingStrategy;

/// Outcome of a conflict resolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: ResultStatus,
    /// Constraints disabled to reach `status`, in suspension order.
    pub suspended: Vec<ConstraintId>,
}

/// Decides which constraints to suspend so the rest can be solved.
pub trait ConflictStrategy: Send + Debug {
    /// Resolves conflicts among `sorted` (descending penalty), running
    /// bounded relaxations of at most `max_iterations` sweeps each.
    fn resolve(
        &mut self,
        spec: &mut LinearSpec,
        sorted: &[ConstraintId],
        relaxation: &mut dyn Relaxation,
        scope: &mut SolveScope,
        max_iterations: u64,
    ) -> Resolution;

    /// Short name used in log output.
    fn strategy_type_name(&self) -> &'static str;
}

impl<S: ConflictStrategy + ?Sized> ConflictStrategy for Box<S> {
    fn resolve(
        &mut self,
        spec: &mut LinearSpec,
        sorted: &[ConstraintId],
        relaxation: &mut dyn Relaxation,
        scope: &mut SolveScope,
        max_iterations: u64,
    ) -> Resolution {
        (**self).resolve(spec, sorted, relaxation, scope, max_iterations)
    }

    fn strategy_type_name(&self) -> &'static str {
        (**self).strategy_type_name()
    }
}

/// Builds the strategy named by `kind`.
pub fn strategy_for(kind: ConflictStrategyType) -> Box<dyn ConflictStrategy> {
    match kind {
        ConflictStrategyType::Adding => Box::new(AddingStrategy),
        ConflictStrategyType::Removing => Box::new(RemovingStrategy),
        ConflictStrategyType::BinarySearch => Box::new(BinarySearchStrategy),
    }
}

/// Prepares `relaxation` with the enabled members of `sorted` and relaxes.
pub(crate) fn relax_enabled(
    spec: &mut LinearSpec,
    sorted: &[ConstraintId],
    relaxation: &mut dyn Relaxation,
    scope: &mut SolveScope,
    max_iterations: u64,
) -> RelaxOutcome {
    let enabled: Vec<ConstraintId> = sorted
        .iter()
        .copied()
        .filter(|&id| spec.constraint(id).is_some_and(|c| c.is_enabled()))
        .collect();
    relaxation.prepare(spec, &enabled);
    relaxation.relax(spec, scope, max_iterations)
}

pub(crate) fn set_enabled(spec: &mut LinearSpec, ids: &[ConstraintId], enabled: bool) {
    for &id in ids {
        if let Some(constraint) = spec.constraint_mut(id) {
            constraint.set_enabled(enabled);
        }
    }
}

/// Disables `id` and records it as suspended.
pub(crate) fn suspend(spec: &mut LinearSpec, id: ConstraintId, suspended: &mut Vec<ConstraintId>, scope: &mut SolveScope) {
    set_enabled(spec, &[id], false);
    suspended.push(id);
    scope.stats_mut().record_suspension();
    debug!(
        event = "constraint_suspended",
        constraint = %id,
        penalty = spec.constraint(id).map_or(0.0, |c| c.penalty()),
    );
}

/// Final status once the search is over.
pub(crate) fn settle(spec: &LinearSpec, suspended: &[ConstraintId], status: ResultStatus, tolerance: f64) -> ResultStatus {
    let unsatisfiable = suspended
        .iter()
        .filter_map(|&id| spec.constraint(id))
        .any(|c| c.is_hard() && !c.is_satisfiable_alone(tolerance));
    if unsatisfiable {
        ResultStatus::Infeasible
    } else {
        status
    }
}
