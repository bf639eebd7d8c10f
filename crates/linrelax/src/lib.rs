//! linrelax - Linear constraint relaxation in Rust
//!
//! Describe a layout as linear equalities and inequalities over named
//! variables, mark each constraint hard or soft, and let an iterative
//! relaxation engine find values that satisfy as much of it as possible.
//!
//! # Example
//!
//! ```rust
//! use linrelax::prelude::*;
//!
//! let mut spec = linrelax::default_spec();
//! let left = spec.add_named_variable("left");
//! let right = spec.add_named_variable("right");
//!
//! spec.add_constraint(Constraint::equal([Summand::new(1.0, left)], 0.0)).unwrap();
//! spec.add_constraint(Constraint::equal(
//!     [Summand::new(1.0, right), Summand::new(-1.0, left)],
//!     120.0,
//! )).unwrap();
//!
//! assert!(spec.solve().is_optimal());
//! assert!((spec.value(right) - 120.0).abs() < 1e-6);
//! ```

#[cfg(feature = "console")]
pub mod console;


// Data model
pub use linrelax_core::{
    Constraint, ConstraintId, LinRelaxError, LinearSpec, Operator, Result, ResultStatus, RightSide,
    Solver, Summand, Variable, DEFAULT_TOLERANCE, HARD_PENALTY,
};

// Configuration
pub use linrelax_config::{
    ConflictResolutionConfig, ConflictStrategyType, PivotSelectorConfig, RelaxationConfig, SolverConfig,
};

// Engines
pub use linrelax_solver::{
    AddingStrategy, BinarySearchStrategy, ConflictResolvingSolver, ConflictStrategy,
    DeterministicPivotSelector, ForceDirected, GaussSeidel, Kaczmarz, PivotSelector, RandomPivotSelector,
    Relaxation, RelaxationSolver, RemovingStrategy, SolveStats, SolverBuilder, TwoPhasePivotSelector,
};

/// Creates a specification solved by a plain Kaczmarz [`RelaxationSolver`].
pub fn default_spec() -> LinearSpec {
    LinearSpec::with_solver(Box::new(RelaxationSolver::default()))
}

/// Creates a specification whose tolerance and solver come from `config`.
///
/// # Errors
///
/// [`LinRelaxError::Config`] if the configuration fails validation.
pub fn spec_from_config(config: &SolverConfig) -> Result<LinearSpec> {
    let solver = SolverBuilder::try_build(config)?;
    let mut spec = LinearSpec::with_solver(solver);
    if let Some(tolerance) = config.tolerance {
        spec.set_tolerance(tolerance);
    }
    Ok(spec)
}

pub mod prelude {
    pub use super::{Constraint, ConstraintId, LinearSpec, Operator, ResultStatus, Summand, Variable};
    pub use super::{ConflictStrategyType, SolverConfig};
    pub use super::{BinarySearchStrategy, ConflictResolvingSolver, Kaczmarz, RelaxationSolver};
}
