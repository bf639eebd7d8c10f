//! Uniform random pivot selection.

use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Variable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{considered, dominant_pivot, fill_orphans, PivotEntry, PivotSelector};

/// Draws used before falling back to the dominant summand.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Picks a uniformly random summand with a non-zero coefficient.
///
/// Draws landing on a (near) zero coefficient are retried a bounded
/// number of times before the dominant summand is used instead.
#[derive(Debug)]
pub struct RandomPivotSelector {
    rng: StdRng,
    max_retries: u32,
}

impl RandomPivotSelector {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }
}

impl Default for RandomPivotSelector {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl PivotSelector for RandomPivotSelector {
    fn init(
        &mut self,
        spec: &LinearSpec,
        constraints: &[ConstraintId],
        variables: &[Variable],
        limit: Option<usize>,
    ) -> Vec<PivotEntry> {
        let ids = considered(spec, constraints, limit);
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(constraint) = spec.constraint(id) else {
                continue;
            };
            if let Some(index) = self.select_pivot_summand(constraint) {
                entries.push(PivotEntry::new(id, constraint.summands()[index].variable()));
            }
        }
        let duplicates = fill_orphans(spec, &mut entries, variables);

        debug!(
            event = "pivots_selected",
            selector = "Random",
            entries = entries.len(),
            duplicates,
        );
        entries
    }

    fn select_pivot_summand(&mut self, constraint: &Constraint) -> Option<usize> {
        let summands = constraint.summands();
        if summands.is_empty() {
            return None;
        }
        for _ in 0..self.max_retries {
            let index = self.rng.random_range(0..summands.len());
            if summands[index].coefficient().abs() > NEAR_ZERO {
                return Some(index);
            }
        }
        dominant_pivot(constraint)
    }

    fn selector_type_name(&self) -> &'static str {
        "Random"
    }
}
