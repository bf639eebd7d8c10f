//! Pivot selection.
//!
//! A pivot is the one variable per constraint that pivot-based relaxation
//! moves when projecting that constraint. Selectors produce an ordered
//! list of [`PivotEntry`] values covering the considered constraints.
//! Every variable referenced with a non-zero coefficient ends up as the
//! pivot of at least one entry; variables left without one get a
//! duplicate entry of the constraint they are most influential in,
//! placed directly after that constraint's entries.

mod deterministic;
mod random;
mod two_phase;


use std::collections::HashSet;
use std::fmt::Debug;

use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Variable};

pub use deterministic::DeterministicPivotSelector;
pub use random::RandomPivotSelector;
pub use two_phase::TwoPhasePivotSelector;

/// One constraint/pivot pair of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotEntry {
    pub constraint: ConstraintId,
    /// Variable moved when projecting `constraint`.
    pub pivot: Variable,
    /// True for entries synthesized to give an otherwise unpivoted
    /// variable a governing constraint.
    pub duplicate: bool,
}

impl PivotEntry {
    pub fn new(constraint: ConstraintId, pivot: Variable) -> Self {
        Self {
            constraint,
            pivot,
            duplicate: false,
        }
    }

    pub fn duplicate(constraint: ConstraintId, pivot: Variable) -> Self {
        Self {
            constraint,
            pivot,
            duplicate: true,
        }
    }
}

/// Chooses pivot variables for a constraint list.
pub trait PivotSelector: Send + Debug {
    /// Selects pivots for the enabled constraints of `constraints`,
    /// considering at most `limit` of them.
    ///
    /// `variables` are the variables that need a governing entry; ones not
    /// referenced by a considered constraint are ignored.
    fn init(
        &mut self,
        spec: &LinearSpec,
        constraints: &[ConstraintId],
        variables: &[Variable],
        limit: Option<usize>,
    ) -> Vec<PivotEntry>;

    /// Index of the summand this selector prefers as pivot of `constraint`.
    fn select_pivot_summand(&mut self, constraint: &Constraint) -> Option<usize>;

    /// Drops the entries of a removed constraint and re-homes variables
    /// that lost their only pivot entry.
    fn remove_constraint(
        &mut self,
        spec: &LinearSpec,
        mut entries: Vec<PivotEntry>,
        removed: ConstraintId,
    ) -> Vec<PivotEntry> {
        let released: Vec<Variable> = entries
            .iter()
            .filter(|e| e.constraint == removed)
            .map(|e| e.pivot)
            .collect();
        entries.retain(|e| e.constraint != removed);
        fill_orphans(spec, &mut entries, &released);
        entries
    }

    /// Short name used in log output.
    fn selector_type_name(&self) -> &'static str;
}

impl<P: PivotSelector + ?Sized> PivotSelector for Box<P> {
    fn init(
        &mut self,
        spec: &LinearSpec,
        constraints: &[ConstraintId],
        variables: &[Variable],
        limit: Option<usize>,
    ) -> Vec<PivotEntry> {
        (**self).init(spec, constraints, variables, limit)
    }

    fn select_pivot_summand(&mut self, constraint: &Constraint) -> Option<usize> {
        (**self).select_pivot_summand(constraint)
    }

    fn remove_constraint(
        &mut self,
        spec: &LinearSpec,
        entries: Vec<PivotEntry>,
        removed: ConstraintId,
    ) -> Vec<PivotEntry> {
        (**self).remove_constraint(spec, entries, removed)
    }

    fn selector_type_name(&self) -> &'static str {
        (**self).selector_type_name()
    }
}

/// Enabled constraints of `constraints`, truncated to `limit`.
pub(crate) fn considered(
    spec: &LinearSpec,
    constraints: &[ConstraintId],
    limit: Option<usize>,
) -> Vec<ConstraintId> {
    constraints
        .iter()
        .copied()
        .filter(|&id| spec.constraint(id).is_some_and(|c| c.is_enabled()))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Share of `|coefficient|` that `variable` holds in `constraint`.
pub(crate) fn influence(constraint: &Constraint, variable: Variable) -> f64 {
    constraint
        .summand_index(variable)
        .map_or(0.0, |i| constraint.dominance(i))
}

/// Summand with the largest absolute coefficient, if it is non-zero.
pub(crate) fn dominant_pivot(constraint: &Constraint) -> Option<usize> {
    constraint
        .dominant_summand()
        .filter(|&i| constraint.summands()[i].coefficient().abs() > NEAR_ZERO)
}

/// Constraint among `entries` where `variable` is most influential.
///
/// Ties keep the earliest entry.
pub(crate) fn most_influential(
    spec: &LinearSpec,
    entries: &[PivotEntry],
    variable: Variable,
) -> Option<ConstraintId> {
    let mut best: Option<(ConstraintId, f64)> = None;
    for entry in entries.iter().filter(|e| !e.duplicate) {
        let Some(constraint) = spec.constraint(entry.constraint) else {
            continue;
        };
        let share = influence(constraint, variable);
        if share > NEAR_ZERO && best.map_or(true, |(_, s)| share > s) {
            best = Some((entry.constraint, share));
        }
    }
    best.map(|(id, _)| id)
}

/// Inserts a duplicate entry after the last entry of `source`.
pub(crate) fn insert_duplicate(entries: &mut Vec<PivotEntry>, source: ConstraintId, pivot: Variable) {
    let position = entries
        .iter()
        .rposition(|e| e.constraint == source)
        .map_or(entries.len(), |i| i + 1);
    entries.insert(position, PivotEntry::duplicate(source, pivot));
}

/// Gives every variable of `variables` without a pivot entry a duplicate
/// of the constraint it is most influential in.
///
/// Returns the number of duplicates created.
pub(crate) fn fill_orphans(spec: &LinearSpec, entries: &mut Vec<PivotEntry>, variables: &[Variable]) -> usize {
    let mut governed: HashSet<Variable> = entries.iter().map(|e| e.pivot).collect();
    let mut created = 0;
    for &variable in variables {
        if governed.contains(&variable) {
            continue;
        }
        if let Some(source) = most_influential(spec, entries, variable) {
            insert_duplicate(entries, source, variable);
            governed.insert(variable);
            created += 1;
        }
    }
    created
}

/// Writes the pivot of each primary entry back onto its constraint.
pub(crate) fn apply_pivots(spec: &mut LinearSpec, entries: &[PivotEntry]) {
    for entry in entries.iter().filter(|e| !e.duplicate) {
        if let Some(constraint) = spec.constraint_mut(entry.constraint) {
            let index = constraint.summand_index(entry.pivot);
            constraint.set_pivot(index);
        }
    }
}
