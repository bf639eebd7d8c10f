//! Error types for linrelax

use thiserror::Error;

use crate::constraint::ConstraintId;
use crate::variable::Variable;

/// Main error type for structural misuse of a specification.
///
/// Numerical problems (infeasibility, non-convergence) are never errors;
/// they are reported through [`ResultStatus`](crate::ResultStatus).
#[derive(Debug, Error)]
pub enum LinRelaxError {
    /// A summand references a variable created by another specification.
    #[error("variable {0} belongs to another specification")]
    ForeignVariable(Variable),

    /// The constraint id is not (or no longer) part of the specification.
    #[error("constraint {0} is not part of this specification")]
    UnknownConstraint(ConstraintId),

    /// Penalty outside of (0, 1].
    #[error("invalid penalty {0}: must be in (0, 1]")]
    InvalidPenalty(f64),

    /// Error in solver configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for linrelax operations
pub type Result<T> = std::result::Result<T, LinRelaxError>;
