//! Pivot-based Gauss-Seidel relaxation.

use std::collections::BTreeMap;
use std::mem;

use linrelax_config::GaussSeidelConfig;
use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{Constraint, ConstraintId, LinearSpec, Operator};
use tracing::{debug, trace};

use super::{live_constraints, ErrorSummary, ProgressMonitor, RelaxOutcome, Relaxation, DEFAULT_MAX_ITERATIONS};
use crate::pivot::{apply_pivots, DeterministicPivotSelector, PivotEntry, PivotSelector};
use crate::scope::SolveScope;

/// Moves only the pivot variable of each entry.
///
/// The pivot's exact value `(b - Σ_{i≠p} aᵢxᵢ) / a_p` is blended with its
/// current value using the weight `|a_p| / Σ|a|`, scaled by the penalty
/// for soft constraints. A dominant pivot therefore lands (almost) on the
/// hyperplane, a weak one only nudges towards it.
///
/// As with [`Kaczmarz`](super::Kaczmarz), sweeps over a list with soft
/// constraints end with a pass over the hard entries alone.
///
/// Pivots come from a [`PivotSelector`]; removing a constraint from the
/// specification updates the selection incrementally.
#[derive(Debug)]
pub struct GaussSeidel<P = DeterministicPivotSelector> {
    selector: P,
    max_iterations: u64,
    relaxation_factor: f64,
    constraints: Vec<ConstraintId>,
    entries: Vec<PivotEntry>,
    pending_selection: Option<usize>,
}

impl GaussSeidel<DeterministicPivotSelector> {
    pub fn new() -> Self {
        Self::with_selector(DeterministicPivotSelector::new())
    }
}

impl Default for GaussSeidel<DeterministicPivotSelector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PivotSelector> GaussSeidel<P> {
    pub fn with_selector(selector: P) -> Self {
        Self {
            selector,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            relaxation_factor: 1.0,
            constraints: Vec::new(),
            entries: Vec::new(),
            pending_selection: None,
        }
    }

    pub fn from_config(config: &GaussSeidelConfig, selector: P) -> Self {
        Self {
            max_iterations: config.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            relaxation_factor: config.relaxation_factor.unwrap_or(1.0),
            ..Self::with_selector(selector)
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.relaxation_factor = factor;
        self
    }

    /// Current pivot entries in sweep order.
    pub fn entries(&self) -> &[PivotEntry] {
        &self.entries
    }

    pub fn selector(&self) -> &P {
        &self.selector
    }
}

impl<P> GaussSeidel<P> {
    /// Blends the pivot towards the value satisfying `constraint`.
    ///
    /// Returns false when there is nothing to do: a satisfied inequality
    /// or a (near) zero pivot coefficient.
    fn update_pivot(&self, constraint: &Constraint, entry: &PivotEntry, deficit: f64, values: &mut [f64]) -> bool {
        if constraint.operator() != Operator::Eq && deficit == 0.0 {
            return false;
        }
        let coefficient = constraint.coefficient_of(entry.pivot);
        if coefficient.abs() <= NEAR_ZERO {
            return false;
        }
        let mut weight = self.relaxation_factor * coefficient.abs() / constraint.abs_coefficient_sum();
        if !constraint.is_hard() {
            weight *= constraint.penalty();
        }
        values[entry.pivot.index()] += weight * deficit / coefficient;
        true
    }
}

impl<P: PivotSelector> Relaxation for GaussSeidel<P> {
    fn prepare(&mut self, spec: &mut LinearSpec, constraints: &[ConstraintId]) {
        let variables = spec.variables().to_vec();
        self.entries = self.selector.init(spec, constraints, &variables, None);
        self.constraints = constraints.to_vec();
        self.pending_selection = Some(self.entries.iter().filter(|e| e.duplicate).count());
        apply_pivots(spec, &self.entries);
    }

    fn relax(&mut self, spec: &mut LinearSpec, scope: &mut SolveScope, max_iterations: u64) -> RelaxOutcome {
        let tolerance = scope.tolerance();
        let active = live_constraints(spec, &self.constraints);
        let mut values = spec.values();
        let mut residuals = BTreeMap::new();
        let mut monitor = ProgressMonitor::new(max_iterations);
        let mut summary = ErrorSummary::measure(spec, &active, &values);
        let mut sweeps = 0;
        let has_soft = active
            .iter()
            .any(|&id| spec.constraint(id).is_some_and(|c| !c.is_hard()));

        scope.stats_mut().record_relax_call();
        if let Some(duplicates) = self.pending_selection.take() {
            scope.stats_mut().record_pivot_selection(duplicates);
        }

        while summary.max >= tolerance && sweeps < max_iterations {
            sweeps += 1;
            for entry in &self.entries {
                let Some(constraint) = spec.constraint(entry.constraint).filter(|c| c.is_enabled()) else {
                    continue;
                };
                let deficit = constraint.deficit(&values);
                if !entry.duplicate {
                    residuals.insert(entry.constraint, deficit.abs());
                }
                if self.update_pivot(constraint, entry, deficit, &mut values) {
                    scope.stats_mut().record_projection();
                }
            }
            if has_soft {
                for entry in &self.entries {
                    let Some(constraint) = spec.constraint(entry.constraint).filter(|c| c.is_enabled() && c.is_hard())
                    else {
                        continue;
                    };
                    let deficit = constraint.deficit(&values);
                    if self.update_pivot(constraint, entry, deficit, &mut values) {
                        scope.stats_mut().record_projection();
                    }
                }
            }
            scope.stats_mut().record_sweep();

            summary = ErrorSummary::measure(spec, &active, &values);
            monitor.record(sweeps, summary.hard);
            trace!(
                event = "sweep",
                sweep = sweeps,
                max_error = summary.max,
                hard_error = summary.hard,
            );
        }

        spec.store_values(&values);
        let status = monitor.classify(summary, tolerance);
        debug!(
            event = "relax_end",
            relaxation = "GaussSeidel",
            selector = self.selector.selector_type_name(),
            status = %status,
            sweeps,
            max_error = summary.max,
        );
        RelaxOutcome {
            status,
            sweeps,
            max_error: summary.max,
            hard_error: summary.hard,
            sweep_residuals: residuals,
        }
    }

    fn constraint_removed(&mut self, spec: &LinearSpec, id: ConstraintId) -> bool {
        let entries = mem::take(&mut self.entries);
        self.entries = self.selector.remove_constraint(spec, entries, id);
        self.constraints.retain(|&c| c != id);
        true
    }

    fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    fn relaxation_type_name(&self) -> &'static str {
        "GaussSeidel"
    }
}
