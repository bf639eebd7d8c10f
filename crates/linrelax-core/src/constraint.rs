//! Summands and linear constraints.
//!
//! A constraint is `Σ coefficient·variable {=, ≤, ≥} right_side` with a
//! penalty in (0, 1]. Penalty `1.0` marks a hard constraint; anything
//! lower is soft and may be violated or suspended by the solvers.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{LinRelaxError, Result};
use crate::variable::Variable;

/// Penalty of a hard constraint.
pub const HARD_PENALTY: f64 = 1.0;

/// Coefficients with an absolute value below this are treated as zero.
pub const NEAR_ZERO: f64 = 1e-12;

/// Stable handle to a constraint added to a [`LinearSpec`](crate::LinearSpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    /// Slot index of the constraint in its specification.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One `coefficient·variable` term of a constraint's left-hand side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summand {
    coefficient: f64,
    variable: Variable,
}

impl Summand {
    pub fn new(coefficient: f64, variable: Variable) -> Self {
        Self {
            coefficient,
            variable,
        }
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }
}

/// Relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// `lhs = rhs`
    Eq,
    /// `lhs ≤ rhs`
    Le,
    /// `lhs ≥ rhs`
    Ge,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Le => "<=",
            Operator::Ge => ">=",
        }
    }
}

/// Right-hand side of a constraint: a stored value or a provider that is
/// evaluated every time the right-hand side is read.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
/// use linrelax_core::RightSide;
///
/// let width = Arc::new(AtomicU64::new(300));
/// let source = width.clone();
/// let rhs = RightSide::computed(move || source.load(Ordering::Relaxed) as f64);
///
/// assert_eq!(rhs.value(), 300.0);
/// width.store(450, Ordering::Relaxed);
/// assert_eq!(rhs.value(), 450.0);
/// ```
#[derive(Clone)]
pub enum RightSide {
    Fixed(f64),
    Computed(Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl RightSide {
    /// Wraps a provider closure.
    pub fn computed(provider: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        RightSide::Computed(Arc::new(provider))
    }

    /// Current value of the right-hand side.
    pub fn value(&self) -> f64 {
        match self {
            RightSide::Fixed(value) => *value,
            RightSide::Computed(provider) => provider(),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, RightSide::Computed(_))
    }
}

impl fmt::Debug for RightSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RightSide::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            RightSide::Computed(_) => f.debug_tuple("Computed").field(&self.value()).finish(),
        }
    }
}

impl From<f64> for RightSide {
    fn from(value: f64) -> Self {
        RightSide::Fixed(value)
    }
}

/// A linear constraint over variables of one specification.
///
/// A constraint has no effect until it is handed to
/// [`LinearSpec::add_constraint`](crate::LinearSpec::add_constraint).
/// Summands naming the same variable twice are merged on construction.
///
/// # Example
///
/// ```
/// use linrelax_core::{Constraint, LinearSpec, Operator, Summand};
///
/// let mut spec = LinearSpec::new();
/// let left = spec.add_variable();
/// let right = spec.add_variable();
///
/// // right - left >= 100, soft with penalty 0.5
/// let c = Constraint::new(
///     [Summand::new(1.0, right), Summand::new(-1.0, left)],
///     Operator::Ge,
///     100.0,
/// )
/// .with_penalty(0.5);
///
/// assert!(!c.is_hard());
/// assert_eq!(c.summands().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Constraint {
    summands: SmallVec<[Summand; 4]>,
    operator: Operator,
    right_side: RightSide,
    penalty: f64,
    enabled: bool,
    pivot: Option<usize>,
    name: Option<String>,
}

impl Constraint {
    /// Creates a hard, enabled constraint.
    pub fn new(
        summands: impl IntoIterator<Item = Summand>,
        operator: Operator,
        right_side: impl Into<RightSide>,
    ) -> Self {
        let mut merged: SmallVec<[Summand; 4]> = SmallVec::new();
        for summand in summands {
            match merged.iter_mut().find(|s| s.variable == summand.variable) {
                Some(existing) => existing.coefficient += summand.coefficient,
                None => merged.push(summand),
            }
        }
        Self {
            summands: merged,
            operator,
            right_side: right_side.into(),
            penalty: HARD_PENALTY,
            enabled: true,
            pivot: None,
            name: None,
        }
    }

    /// `Σ coefficient·variable = right_side`
    pub fn equal(summands: impl IntoIterator<Item = Summand>, right_side: impl Into<RightSide>) -> Self {
        Self::new(summands, Operator::Eq, right_side)
    }

    /// `Σ coefficient·variable ≤ right_side`
    pub fn at_most(summands: impl IntoIterator<Item = Summand>, right_side: impl Into<RightSide>) -> Self {
        Self::new(summands, Operator::Le, right_side)
    }

    /// `Σ coefficient·variable ≥ right_side`
    pub fn at_least(summands: impl IntoIterator<Item = Summand>, right_side: impl Into<RightSide>) -> Self {
        Self::new(summands, Operator::Ge, right_side)
    }

    /// Sets the penalty. Validated when the constraint is added.
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn summands(&self) -> &[Summand] {
        &self.summands
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Evaluates the right-hand side.
    pub fn right_side(&self) -> f64 {
        self.right_side.value()
    }

    pub fn right_side_source(&self) -> &RightSide {
        &self.right_side
    }

    pub fn set_right_side(&mut self, right_side: impl Into<RightSide>) {
        self.right_side = right_side.into();
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Changes the penalty.
    ///
    /// # Errors
    ///
    /// Returns [`LinRelaxError::InvalidPenalty`] unless `0 < penalty <= 1`.
    pub fn set_penalty(&mut self, penalty: f64) -> Result<()> {
        validate_penalty(penalty)?;
        self.penalty = penalty;
        Ok(())
    }

    /// Returns true for penalty `1.0`.
    pub fn is_hard(&self) -> bool {
        self.penalty >= HARD_PENALTY
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Index of the pivot summand chosen by the last pivot selection.
    pub fn pivot(&self) -> Option<usize> {
        self.pivot
    }

    pub fn pivot_summand(&self) -> Option<&Summand> {
        self.pivot.and_then(|i| self.summands.get(i))
    }

    pub fn set_pivot(&mut self, pivot: Option<usize>) {
        self.pivot = pivot.filter(|&i| i < self.summands.len());
    }

    /// Index of the summand referencing `variable`, if any.
    pub fn summand_index(&self, variable: Variable) -> Option<usize> {
        self.summands.iter().position(|s| s.variable == variable)
    }

    /// Coefficient of `variable`, zero when it does not occur.
    pub fn coefficient_of(&self, variable: Variable) -> f64 {
        self.summands
            .iter()
            .find(|s| s.variable == variable)
            .map_or(0.0, |s| s.coefficient)
    }

    /// `Σ coefficient²`, the squared norm of the constraint's hyperplane normal.
    pub fn norm_squared(&self) -> f64 {
        self.summands.iter().map(|s| s.coefficient * s.coefficient).sum()
    }

    /// `Σ |coefficient|`
    pub fn abs_coefficient_sum(&self) -> f64 {
        self.summands.iter().map(|s| s.coefficient.abs()).sum()
    }

    /// Share of `|coefficient|` held by the summand at `index`.
    pub fn dominance(&self, index: usize) -> f64 {
        let total = self.abs_coefficient_sum();
        match self.summands.get(index) {
            Some(s) if total > NEAR_ZERO => s.coefficient.abs() / total,
            _ => 0.0,
        }
    }

    /// Index of the summand with the largest absolute coefficient.
    ///
    /// Ties keep the earliest summand.
    pub fn dominant_summand(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, s) in self.summands.iter().enumerate() {
            let magnitude = s.coefficient.abs();
            if best.map_or(true, |(_, m)| magnitude > m) {
                best = Some((i, magnitude));
            }
        }
        best.map(|(i, _)| i)
    }

    /// True when every coefficient is (near) zero.
    pub fn is_degenerate(&self) -> bool {
        self.norm_squared() < NEAR_ZERO
    }

    /// Left-hand side evaluated against a value buffer indexed by
    /// [`Variable::index`].
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.summands
            .iter()
            .map(|s| s.coefficient * values[s.variable.index])
            .sum()
    }

    /// Residual against a value buffer.
    ///
    /// `max(0, rhs - lhs)` for `≥`, `max(0, lhs - rhs)` for `≤` and the
    /// signed `rhs - lhs` for `=`.
    pub fn error(&self, values: &[f64]) -> f64 {
        self.error_for_lhs(self.lhs(values))
    }

    /// Signed amount the left-hand side has to move to satisfy the
    /// constraint; zero for satisfied inequalities.
    pub fn deficit(&self, values: &[f64]) -> f64 {
        let gap = self.right_side() - self.lhs(values);
        match self.operator {
            Operator::Eq => gap,
            Operator::Ge => gap.max(0.0),
            Operator::Le => gap.min(0.0),
        }
    }

    fn error_for_lhs(&self, lhs: f64) -> f64 {
        let rhs = self.right_side();
        match self.operator {
            Operator::Eq => rhs - lhs,
            Operator::Ge => (rhs - lhs).max(0.0),
            Operator::Le => (lhs - rhs).max(0.0),
        }
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.error(values).abs() < tolerance
    }

    /// Whether some assignment satisfies this constraint on its own.
    ///
    /// Only degenerate constraints (all coefficients zero) can fail this,
    /// when `0 {op} rhs` does not hold.
    pub fn is_satisfiable_alone(&self, tolerance: f64) -> bool {
        !self.is_degenerate() || self.error_for_lhs(0.0).abs() < tolerance
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        if self.summands.is_empty() {
            f.write_str("0")?;
        }
        for (i, s) in self.summands.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}*{}", s.coefficient, s.variable)?;
        }
        write!(f, " {} {}", self.operator.symbol(), self.right_side())?;
        if !self.is_hard() {
            write!(f, " (penalty {})", self.penalty)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_penalty(penalty: f64) -> Result<()> {
    if penalty.is_finite() && penalty > 0.0 && penalty <= HARD_PENALTY {
        Ok(())
    } else {
        Err(LinRelaxError::InvalidPenalty(penalty))
    }
}

#[cfg(test)]
mod tests;
