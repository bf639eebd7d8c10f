//! Binary-search conflict isolation.

use linrelax_core::{ConstraintId, LinearSpec, ResultStatus};
use tracing::trace;

use super::{relax_enabled, set_enabled, settle, suspend, ConflictStrategy, Resolution};
use crate::relaxation::Relaxation;
use crate::scope::SolveScope;

/// Grows an enabled window over the sorted list, halving it on failure.
///
/// The window `[start, start + delta)` is tried on top of everything
/// committed so far. Success commits it and doubles `delta`; failure
/// halves it. A failing single-constraint window identifies a conflict,
/// which is suspended before growth resumes with the next constraint.
/// This isolates each conflict in `O(log n)` sub-solves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySearchStrategy;

impl ConflictStrategy for BinarySearchStrategy {
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
        let mut start = 0;
        let mut delta = 1;

        while start < sorted.len() {
            let end = (start + delta).min(sorted.len());
            let window = &sorted[start..end];
            set_enabled(spec, window, true);

            let outcome = relax_enabled(spec, sorted, relaxation, scope, max_iterations);
            trace!(
                event = "window",
                start,
                end,
                status = %outcome.status,
            );
            if outcome.status.is_optimal() {
                committed = spec.values();
                start = end;
                delta *= 2;
                continue;
            }

            set_enabled(spec, window, false);
            spec.store_values(&committed);
            if window.len() > 1 {
                delta = window.len() / 2;
            } else {
                suspend(spec, window[0], &mut suspended, scope);
                start += 1;
                delta = 1;
            }
        }

        Resolution {
            status: settle(spec, &suspended, ResultStatus::Optimal, scope.tolerance()),
            suspended,
        }
    }

    fn strategy_type_name(&self) -> &'static str {
        "BinarySearch"
    }
}
