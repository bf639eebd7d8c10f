//! linrelax Core - Data model for linear constraint relaxation
//!
//! This crate provides the fundamental abstractions for linrelax:
//! - Variables held in an arena owned by a [`LinearSpec`]
//! - Summands and constraints with hard/soft penalties
//! - The [`Solver`] trait implemented by the relaxation engines
//! - Result status and error types

pub mod constraint;
pub mod error;
pub mod solver;
pub mod spec;
pub mod status;
pub mod variable;

pub use constraint::{Constraint, ConstraintId, Operator, RightSide, Summand, HARD_PENALTY};
pub use error::{LinRelaxError, Result};
pub use solver::Solver;
pub use spec::{LinearSpec, DEFAULT_TOLERANCE};
pub use status::ResultStatus;
pub use variable::Variable;
