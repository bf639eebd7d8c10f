//! Outcome classification of a solve attempt.

use std::fmt;

/// Result of a call to [`Solver::solve`](crate::Solver::solve).
///
/// The relaxation engines only produce `Optimal`, `Suboptimal`,
/// `Infeasible` and `Error`. `Unbounded` and `Timeout` exist for
/// interoperability with alternate backends.
///
/// # Example
///
/// ```
/// use linrelax_core::ResultStatus;
///
/// assert!(ResultStatus::Optimal.is_optimal());
/// assert!(ResultStatus::Suboptimal.is_feasible());
/// assert!(!ResultStatus::Infeasible.is_feasible());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultStatus {
    /// Every enabled constraint is satisfied within tolerance.
    Optimal,
    /// Hard constraints hold (or were still converging when the budget ran out).
    Suboptimal,
    /// Hard constraints could not be satisfied.
    Infeasible,
    /// Objective unbounded (alternate backends only).
    Unbounded,
    /// Time limit reached (alternate backends only).
    Timeout,
    /// The solve could not run at all.
    Error,
}

impl ResultStatus {
    pub fn is_optimal(self) -> bool {
        self == ResultStatus::Optimal
    }

    /// Returns true for `Optimal` and `Suboptimal`.
    pub fn is_feasible(self) -> bool {
        matches!(self, ResultStatus::Optimal | ResultStatus::Suboptimal)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultStatus::Optimal => "optimal",
            ResultStatus::Suboptimal => "suboptimal",
            ResultStatus::Infeasible => "infeasible",
            ResultStatus::Unbounded => "unbounded",
            ResultStatus::Timeout => "timeout",
            ResultStatus::Error => "error",
        };
        f.write_str(name)
    }
}
