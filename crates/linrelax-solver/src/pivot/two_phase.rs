//! Two-phase pivot selection with a spaced shuffle.

use std::collections::HashMap;

use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Variable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::{considered, dominant_pivot, influence, insert_duplicate, PivotEntry, PivotSelector};

/// Minimum gap between entries sharing a pivot when none is configured.
pub const DEFAULT_DISTANCE: usize = 3;

/// Local then global pivot selection.
///
/// Phase one gives every constraint its locally dominant summand as
/// pivot. Phase two makes sure each variable is governed by the
/// constraint it is globally most influential in, adding a duplicate
/// entry where that constraint's local pivot is another variable.
///
/// The resulting list is shuffled and then greedily repaired so that
/// entries sharing a pivot variable are at least `distance` positions
/// apart where possible.
#[derive(Debug)]
pub struct TwoPhasePivotSelector {
    rng: StdRng,
    distance: usize,
}

impl TwoPhasePivotSelector {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            distance: DEFAULT_DISTANCE,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn with_distance(mut self, distance: usize) -> Self {
        self.distance = distance.max(1);
        self
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Shuffles `entries`, then rebuilds the order so entries sharing a
    /// pivot are at least `distance` apart where possible.
    ///
    /// Each step takes, among entries whose pivot is absent from the
    /// previous `distance - 1` picks, the one whose pivot has the most
    /// entries left (earliest on ties).
    pub(crate) fn spaced_shuffle(&mut self, mut pool: Vec<PivotEntry>) -> Vec<PivotEntry> {
        pool.shuffle(&mut self.rng);
        let mut remaining: HashMap<Variable, usize> = HashMap::new();
        for entry in &pool {
            *remaining.entry(entry.pivot).or_default() += 1;
        }

        let window = self.distance.saturating_sub(1);
        let mut ordered: Vec<PivotEntry> = Vec::with_capacity(pool.len());
        while !pool.is_empty() {
            let recent = &ordered[ordered.len().saturating_sub(window)..];
            let mut pick: Option<(usize, usize)> = None;
            for (i, entry) in pool.iter().enumerate() {
                if recent.iter().any(|r| r.pivot == entry.pivot) {
                    continue;
                }
                let left = remaining.get(&entry.pivot).copied().unwrap_or(0);
                if pick.map_or(true, |(_, l)| left > l) {
                    pick = Some((i, left));
                }
            }
            let entry = pool.remove(pick.map_or(0, |(i, _)| i));
            if let Some(left) = remaining.get_mut(&entry.pivot) {
                *left -= 1;
            }
            ordered.push(entry);
        }
        ordered
    }
}

impl Default for TwoPhasePivotSelector {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl PivotSelector for TwoPhasePivotSelector {
    fn init(
        &mut self,
        spec: &LinearSpec,
        constraints: &[ConstraintId],
        variables: &[Variable],
        limit: Option<usize>,
    ) -> Vec<PivotEntry> {
        let ids = considered(spec, constraints, limit);

        // Phase one: locally dominant pivots.
        let mut entries = Vec::with_capacity(ids.len());
        for &id in &ids {
            let Some(constraint) = spec.constraint(id) else {
                continue;
            };
            if let Some(index) = self.select_pivot_summand(constraint) {
                entries.push(PivotEntry::new(id, constraint.summands()[index].variable()));
            }
        }

        // Phase two: globally most influential constraint per variable.
        let mut duplicates = 0;
        for &variable in variables {
            let mut best: Option<(ConstraintId, f64)> = None;
            for &id in &ids {
                let share = spec.constraint(id).map_or(0.0, |c| influence(c, variable));
                if share > NEAR_ZERO && best.map_or(true, |(_, s)| share > s) {
                    best = Some((id, share));
                }
            }
            let Some((source, _)) = best else {
                continue;
            };
            let covered = entries
                .iter()
                .any(|e| e.constraint == source && e.pivot == variable);
            if !covered {
                insert_duplicate(&mut entries, source, variable);
                duplicates += 1;
            }
        }

        let entries = self.spaced_shuffle(entries);
        debug!(
            event = "pivots_selected",
            selector = "TwoPhase",
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
        "TwoPhase"
    }
}
