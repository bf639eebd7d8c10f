//! Fewest-unassigned-first pivot selection.

use std::collections::{HashMap, HashSet};

use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Operator, Variable};
use tracing::debug;

use super::{considered, dominant_pivot, insert_duplicate, PivotEntry, PivotSelector};

/// Greedy, reproducible pivot selection.
///
/// Constraints are processed in order of fewest still-unassigned
/// variables (ties by list order). Each picks the unassigned variable
/// with the largest absolute coefficient, falling back to its dominant
/// summand when all of its variables are taken. Equalities consume
/// their pivot; inequalities leave it available to later constraints.
///
/// While scanning, the constraint where each variable is most dominant
/// is remembered and used to create duplicates for variables that end
/// up without a pivot.
#[derive(Debug, Clone, Default)]
pub struct DeterministicPivotSelector;

impl DeterministicPivotSelector {
    pub fn new() -> Self {
        Self
    }
}

fn unassigned_count(constraint: &Constraint, assigned: &HashSet<Variable>) -> usize {
    constraint
        .summands()
        .iter()
        .filter(|s| s.coefficient().abs() > NEAR_ZERO && !assigned.contains(&s.variable()))
        .count()
}

fn largest_unassigned(constraint: &Constraint, assigned: &HashSet<Variable>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in constraint.summands().iter().enumerate() {
        let magnitude = s.coefficient().abs();
        if magnitude <= NEAR_ZERO || assigned.contains(&s.variable()) {
            continue;
        }
        if best.map_or(true, |(_, m)| magnitude > m) {
            best = Some((i, magnitude));
        }
    }
    best.map(|(i, _)| i)
}

impl PivotSelector for DeterministicPivotSelector {
    fn init(
        &mut self,
        spec: &LinearSpec,
        constraints: &[ConstraintId],
        variables: &[Variable],
        limit: Option<usize>,
    ) -> Vec<PivotEntry> {
        let ids = considered(spec, constraints, limit);
        let list: Vec<&Constraint> = ids.iter().filter_map(|&id| spec.constraint(id)).collect();

        let mut assigned: HashSet<Variable> = HashSet::new();
        let mut done = vec![false; list.len()];
        let mut pivots: Vec<Option<Variable>> = vec![None; list.len()];
        let mut dominant: HashMap<Variable, (f64, ConstraintId)> = HashMap::new();

        for _ in 0..list.len() {
            let mut next: Option<(usize, usize)> = None;
            for (i, constraint) in list.iter().enumerate().filter(|(i, _)| !done[*i]) {
                let count = unassigned_count(constraint, &assigned);
                if next.map_or(true, |(_, c)| count < c) {
                    next = Some((i, count));
                }
            }
            let Some((i, _)) = next else {
                break;
            };
            done[i] = true;

            let constraint = list[i];
            let pivot = largest_unassigned(constraint, &assigned).or_else(|| self.select_pivot_summand(constraint));
            if let Some(index) = pivot {
                let variable = constraint.summands()[index].variable();
                pivots[i] = Some(variable);
                if constraint.operator() == Operator::Eq {
                    assigned.insert(variable);
                }
            }

            for (index, s) in constraint.summands().iter().enumerate() {
                let share = constraint.dominance(index);
                if share <= NEAR_ZERO {
                    continue;
                }
                let best = dominant.entry(s.variable()).or_insert((share, ids[i]));
                if share > best.0 {
                    *best = (share, ids[i]);
                }
            }
        }

        let mut entries: Vec<PivotEntry> = ids
            .iter()
            .zip(&pivots)
            .filter_map(|(&id, pivot)| pivot.map(|v| PivotEntry::new(id, v)))
            .collect();

        let governed: HashSet<Variable> = entries.iter().map(|e| e.pivot).collect();
        let mut duplicates = 0;
        for variable in variables.iter().filter(|v| !governed.contains(v)) {
            if let Some(&(_, source)) = dominant.get(variable) {
                insert_duplicate(&mut entries, source, *variable);
                duplicates += 1;
            }
        }

        debug!(
            event = "pivots_selected",
            selector = "Deterministic",
            constraints = ids.len(),
            entries = entries.len(),
            duplicates,
        );
        entries
    }

    fn select_pivot_summand(&mut self, constraint: &Constraint) -> Option<usize> {
        dominant_pivot(constraint)
    }

    fn selector_type_name(&self) -> &'static str {
        "Deterministic"
    }
}
