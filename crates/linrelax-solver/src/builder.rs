//! Builder module for constructing solver components from configuration
//!
//! This module provides the wiring between configuration types and
//! the relaxation, pivot selection and conflict resolution engines.

use linrelax_config::{PivotSelectorConfig, RelaxationConfig, SolverConfig};
use linrelax_core::{LinRelaxError, Result, Solver};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::conflict::strategy_for;
use crate::pivot::{DeterministicPivotSelector, PivotSelector, RandomPivotSelector, TwoPhasePivotSelector};
use crate::relaxation::{ForceDirected, GaussSeidel, Kaczmarz, Relaxation};
use crate::solver::{ConflictResolvingSolver, RelaxationSolver};

/// Builder for constructing solvers from configuration.
pub struct SolverBuilder;

impl SolverBuilder {
    /// Validates `config` and builds its solver.
    ///
    /// # Errors
    ///
    /// [`LinRelaxError::Config`] naming the offending field.
    pub fn try_build(config: &SolverConfig) -> Result<Box<dyn Solver>> {
        config
            .validate()
            .map_err(|e| LinRelaxError::Config(e.to_string()))?;
        Ok(Self::build(config))
    }

    /// Builds the solver described by `config`.
    pub fn build(config: &SolverConfig) -> Box<dyn Solver> {
        let relaxation = Self::relaxation(config);
        match &config.conflict_resolution {
            None => Box::new(RelaxationSolver::new(relaxation).with_reset(config.reset)),
            Some(resolution) => {
                let mut solver = ConflictResolvingSolver::new(strategy_for(resolution.strategy), relaxation)
                    .with_reset(config.reset);
                if let Some(max_iterations) = resolution.max_iterations {
                    solver = solver.with_max_iterations(max_iterations);
                }
                Box::new(solver)
            }
        }
    }

    /// Builds the relaxation variant, with its pivot selector where needed.
    pub fn relaxation(config: &SolverConfig) -> Box<dyn Relaxation> {
        match &config.relaxation {
            RelaxationConfig::Kaczmarz(c) => Box::new(Kaczmarz::from_config(c)),
            RelaxationConfig::GaussSeidel(c) => {
                let selector = Self::pivot_selector(&config.pivot_selector, config.random_seed);
                Box::new(GaussSeidel::from_config(c, selector))
            }
            RelaxationConfig::ForceDirected(c) => Box::new(ForceDirected::from_config(c)),
        }
    }

    /// Builds a pivot selector; random selectors are seeded from `seed`
    /// when given, from the OS otherwise.
    pub fn pivot_selector(config: &PivotSelectorConfig, seed: Option<u64>) -> Box<dyn PivotSelector> {
        let rng = || match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        match config {
            PivotSelectorConfig::Deterministic => Box::new(DeterministicPivotSelector::new()),
            PivotSelectorConfig::TwoPhase(c) => {
                let selector = TwoPhasePivotSelector::new(rng());
                Box::new(match c.distance {
                    Some(distance) => selector.with_distance(distance),
                    None => selector,
                })
            }
            PivotSelectorConfig::Random(c) => {
                let selector = RandomPivotSelector::new(rng());
                Box::new(match c.max_retries {
                    Some(retries) => selector.with_max_retries(retries),
                    None => selector,
                })
            }
        }
    }
}
