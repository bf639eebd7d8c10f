//! Incremental removal.

use linrelax_core::{ConstraintId, LinearSpec};

use super::{relax_enabled, settle, suspend, ConflictStrategy, Resolution};
use crate::relaxation::Relaxation;
use crate::scope::SolveScope;

/// Starts from everything enabled and disables violated constraints from
/// the low-priority end until the rest solves optimally.
///
/// "Violated" means a residual of at least the tolerance observed during
/// the final sweep of the failed relaxation, before the constraint's own
/// projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemovingStrategy;

impl ConflictStrategy for RemovingStrategy {
    fn resolve(
        &mut self,
        spec: &mut LinearSpec,
        sorted: &[ConstraintId],
        relaxation: &mut dyn Relaxation,
        scope: &mut SolveScope,
        max_iterations: u64,
    ) -> Resolution {
        let tolerance = scope.tolerance();
        let mut suspended = Vec::new();

        loop {
            let outcome = relax_enabled(spec, sorted, relaxation, scope, max_iterations);
            if outcome.status.is_optimal() {
                return Resolution {
                    status: settle(spec, &suspended, outcome.status, tolerance),
                    suspended,
                };
            }

            let candidate = sorted.iter().rev().copied().find(|&id| {
                spec.constraint(id).is_some_and(|c| c.is_enabled()) && outcome.sweep_residual(id) >= tolerance
            });
            match candidate {
                Some(id) => suspend(spec, id, &mut suspended, scope),
                None => {
                    return Resolution {
                        status: settle(spec, &suspended, outcome.status, tolerance),
                        suspended,
                    };
                }
            }
        }
    }

    fn strategy_type_name(&self) -> &'static str {
        "Removing"
    }
}
