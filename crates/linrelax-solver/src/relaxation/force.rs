//! Force-directed relaxation.

use std::collections::{BTreeMap, HashSet};

use linrelax_config::ForceDirectedConfig;
use linrelax_core::constraint::NEAR_ZERO;
use linrelax_core::{ConstraintId, LinearSpec, Variable, HARD_PENALTY};
use tracing::{debug, trace};

use super::kaczmarz::project;
use super::{live_constraints, ErrorSummary, ProgressMonitor, RelaxOutcome, Relaxation, DEFAULT_MAX_ITERATIONS};
use crate::scope::SolveScope;

/// Spring stiffness of hard constraints.
pub const HARD_STIFFNESS: f64 = 1e6;
/// Spring stiffness of soft constraints above [`HIGH_PENALTY`].
pub const HIGH_STIFFNESS: f64 = 1e3;
/// Penalty above which a soft constraint uses [`HIGH_STIFFNESS`].
pub const HIGH_PENALTY: f64 = 0.8;

const DEFAULT_COOLING: f64 = 0.98;
const DEFAULT_HARD_SWEEPS: u64 = 10;

/// Spring stiffness for a constraint penalty.
pub fn stiffness(penalty: f64) -> f64 {
    if penalty >= HARD_PENALTY {
        HARD_STIFFNESS
    } else if penalty > HIGH_PENALTY {
        HIGH_STIFFNESS
    } else {
        penalty
    }
}

/// Treats every violated constraint as a spring pulling its variables
/// towards the constraint's hyperplane.
///
/// Each round, every variable moves by the stiffness-weighted average of
/// the Kaczmarz displacements its violated constraints ask for, scaled by
/// a geometrically cooling magnitude. Hard constraints are then
/// re-enforced by a few Kaczmarz sweeps over them alone. The run stops
/// once the total squared soft error no longer changes by more than the
/// tolerance, or at the round cap.
#[derive(Debug, Clone)]
pub struct ForceDirected {
    max_iterations: u64,
    cooling_factor: f64,
    hard_sweeps: u64,
    constraints: Vec<ConstraintId>,
}

impl ForceDirected {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            cooling_factor: DEFAULT_COOLING,
            hard_sweeps: DEFAULT_HARD_SWEEPS,
            constraints: Vec::new(),
        }
    }

    pub fn from_config(config: &ForceDirectedConfig) -> Self {
        Self {
            max_iterations: config.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            cooling_factor: config.cooling_factor.unwrap_or(DEFAULT_COOLING),
            hard_sweeps: config.hard_sweeps.unwrap_or(DEFAULT_HARD_SWEEPS).max(1),
            constraints: Vec::new(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cooling_factor(mut self, cooling: f64) -> Self {
        self.cooling_factor = cooling;
        self
    }

    pub fn with_hard_sweeps(mut self, hard_sweeps: u64) -> Self {
        self.hard_sweeps = hard_sweeps.max(1);
        self
    }

    pub fn hard_sweeps(&self) -> u64 {
        self.hard_sweeps
    }

    /// Variables of `active` in order of first appearance.
    fn participants(spec: &LinearSpec, active: &[ConstraintId]) -> Vec<Variable> {
        let mut seen = HashSet::new();
        active
            .iter()
            .filter_map(|&id| spec.constraint(id))
            .flat_map(|c| c.summands().iter().map(|s| s.variable()))
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

impl Default for ForceDirected {
    fn default() -> Self {
        Self::new()
    }
}

impl Relaxation for ForceDirected {
    fn prepare(&mut self, _spec: &mut LinearSpec, constraints: &[ConstraintId]) {
        self.constraints = constraints.to_vec();
    }

    fn relax(&mut self, spec: &mut LinearSpec, scope: &mut SolveScope, max_iterations: u64) -> RelaxOutcome {
        let tolerance = scope.tolerance();
        let active = live_constraints(spec, &self.constraints);
        let members: HashSet<ConstraintId> = active.iter().copied().collect();
        let hard: Vec<ConstraintId> = active
            .iter()
            .copied()
            .filter(|&id| spec.constraint(id).is_some_and(|c| c.is_hard()))
            .collect();
        let participants = Self::participants(spec, &active);

        let mut values = spec.values();
        let mut residuals = BTreeMap::new();
        let mut monitor = ProgressMonitor::new(max_iterations);
        let mut summary = ErrorSummary::measure(spec, &active, &values);
        let mut magnitude = 1.0;
        let mut rounds = 0;

        scope.stats_mut().record_relax_call();

        while summary.max >= tolerance && rounds < max_iterations {
            rounds += 1;
            let previous_soft = summary.soft_squared;

            for &variable in &participants {
                let mut pull = 0.0;
                let mut weight = 0.0;
                for id in spec.active_constraints(variable).filter(|id| members.contains(id)) {
                    let Some(constraint) = spec.constraint(id) else {
                        continue;
                    };
                    let deficit = constraint.deficit(&values);
                    residuals.insert(id, deficit.abs());
                    let norm = constraint.norm_squared();
                    if deficit.abs() < tolerance || norm < NEAR_ZERO {
                        continue;
                    }
                    let k = stiffness(constraint.penalty());
                    pull += k * deficit / norm * constraint.coefficient_of(variable);
                    weight += k;
                }
                if weight > 0.0 {
                    values[variable.index()] += magnitude * pull / weight;
                    scope.stats_mut().record_projection();
                }
            }

            for _ in 0..self.hard_sweeps {
                let mut violated = false;
                for &id in &hard {
                    if let Some(constraint) = spec.constraint(id) {
                        let (residual, projected) = project(constraint, &mut values, 1.0);
                        violated |= residual >= tolerance;
                        if projected {
                            scope.stats_mut().record_projection();
                        }
                    }
                }
                scope.stats_mut().record_sweep();
                if !violated {
                    break;
                }
            }

            magnitude *= self.cooling_factor;
            summary = ErrorSummary::measure(spec, &active, &values);
            monitor.record(rounds, summary.hard);
            trace!(
                event = "sweep",
                sweep = rounds,
                max_error = summary.max,
                hard_error = summary.hard,
                soft_squared_error = summary.soft_squared,
            );

            if summary.hard < tolerance && (previous_soft - summary.soft_squared).abs() < tolerance {
                break;
            }
        }

        spec.store_values(&values);
        let status = monitor.classify(summary, tolerance);
        debug!(
            event = "relax_end",
            relaxation = "ForceDirected",
            status = %status,
            sweeps = rounds,
            max_error = summary.max,
        );
        RelaxOutcome {
            status,
            sweeps: rounds,
            max_error: summary.max,
            hard_error: summary.hard,
            sweep_residuals: residuals,
        }
    }

    fn constraint_removed(&mut self, _spec: &LinearSpec, id: ConstraintId) -> bool {
        self.constraints.retain(|&c| c != id);
        true
    }

    fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    fn relaxation_type_name(&self) -> &'static str {
        "ForceDirected"
    }
}
