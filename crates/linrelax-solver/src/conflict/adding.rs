//! Incremental addition.

use linrelax_core::{ConstraintId, LinearSpec, ResultStatus};

use super::{relax_enabled, set_enabled, settle, suspend, ConflictStrategy, Resolution};
use crate::relaxation::Relaxation;
use crate::scope::SolveScope;

/// Enables constraints one at a time in priority order.
///
/// A constraint whose addition keeps the system from solving optimally
/// is disabled again and the values from before its addition restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddingStrategy;

impl ConflictStrategy for AddingStrategy {
    fn resolve(
        &mut self,
        spec: &mut LinearSpec,
        sorted: &[ConstraintId],
        relaxation: &mut dyn Relaxation,
        scope: &mut SolveScope,
        max_iterations: u64,
    ) -> Resolution {
        set_enabled(spec, sorted, false);
        let mut committed = spec.values();
        let mut suspended = Vec::new();

        for &id in sorted {
            set_enabled(spec, &[id], true);
            let outcome = relax_enabled(spec, sorted, relaxation, scope, max_iterations);
            if outcome.status.is_optimal() {
                committed = spec.values();
            } else {
                spec.store_values(&committed);
                suspend(spec, id, &mut suspended, scope);
            }
        }

        Resolution {
            status: settle(spec, &suspended, ResultStatus::Optimal, scope.tolerance()),
            suspended,
        }
    }

    fn strategy_type_name(&self) -> &'static str {
        "Adding"
    }
}
