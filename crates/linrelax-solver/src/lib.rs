//! Relaxation engines for linrelax
//!
//! This crate provides:
//! - Relaxation variants (Kaczmarz, Gauss-Seidel, force-directed)
//! - Pivot selectors assigning a governing variable to each constraint
//! - Conflict resolution strategies (adding, removing, binary search)
//! - Solvers implementing [`linrelax_core::Solver`]
//! - Configuration-driven construction via [`SolverBuilder`]
//!
//! # Example
//!
//! ```
//! use linrelax_core::{Constraint, LinearSpec, Summand};
//! use linrelax_solver::{BinarySearchStrategy, ConflictResolvingSolver, Kaczmarz};
//!
//! let solver = ConflictResolvingSolver::new(BinarySearchStrategy, Kaczmarz::new());
//! let mut spec = LinearSpec::with_solver(Box::new(solver));
//! let x = spec.add_variable();
//! spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 5.0)).unwrap();
//! spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(0.5)).unwrap();
//!
//! assert!(spec.solve().is_optimal());
//! assert!((spec.value(x) - 5.0).abs() < 1e-9);
//! ```

pub mod builder;
pub mod conflict;
pub mod pivot;
pub mod relaxation;
pub mod scope;
pub mod solver;
pub mod stats;


pub use builder::SolverBuilder;
pub use conflict::{AddingStrategy, BinarySearchStrategy, ConflictStrategy, RemovingStrategy, Resolution};
pub use pivot::{
    DeterministicPivotSelector, PivotEntry, PivotSelector, RandomPivotSelector, TwoPhasePivotSelector,
};
pub use relaxation::{ForceDirected, GaussSeidel, Kaczmarz, RelaxOutcome, Relaxation};
pub use scope::SolveScope;
pub use solver::{ConflictResolvingSolver, RelaxationSolver};
pub use stats::SolveStats;
