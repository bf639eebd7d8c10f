//! The linear specification: arena of variables and constraints.

use std::fmt;

use tracing::warn;

use crate::constraint::{validate_penalty, Constraint, ConstraintId, RightSide};
use crate::error::{LinRelaxError, Result};
use crate::solver::Solver;
use crate::status::ResultStatus;
use crate::variable::{SpecId, Variable, VariableSlot};

/// Default solving tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Owns variables and constraints and delegates solving to a [`Solver`].
///
/// Variables are created from the specification and become attached
/// once a constraint referencing them is added; they are detached again
/// when their last constraint is removed. Constraint insertion order is
/// preserved and is the order relaxation sweeps visit constraints in.
///
/// Storage only grows. A removed constraint leaves an empty slot behind,
/// so a stale [`ConstraintId`] fails with
/// [`LinRelaxError::UnknownConstraint`] instead of naming a newer
/// constraint. A detached variable keeps its slot and value, so its
/// [`Variable`] handle stays readable and can be attached again.
///
/// # Example
///
/// ```
/// use linrelax_core::{Constraint, LinearSpec, Summand};
///
/// let mut spec = LinearSpec::new();
/// let x = spec.add_named_variable("x");
/// let id = spec.add_constraint(Constraint::equal([Summand::new(2.0, x)], 8.0)).unwrap();
///
/// assert!(spec.is_attached(x));
/// assert_eq!(spec.variables(), &[x]);
///
/// spec.set_value(x, 4.0);
/// assert!(spec.is_satisfied(id).unwrap());
///
/// spec.remove_constraint(id).unwrap();
/// assert!(!spec.is_attached(x));
/// ```
pub struct LinearSpec {
    id: SpecId,
    slots: Vec<VariableSlot>,
    attached: Vec<Variable>,
    constraints: Vec<Option<Constraint>>,
    order: Vec<ConstraintId>,
    tolerance: f64,
    solver: Option<Box<dyn Solver>>,
    last_status: Option<ResultStatus>,
}

impl LinearSpec {
    /// Creates an empty specification without a solver.
    pub fn new() -> Self {
        Self {
            id: SpecId::next(),
            slots: Vec::new(),
            attached: Vec::new(),
            constraints: Vec::new(),
            order: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            solver: None,
            last_status: None,
        }
    }

    /// Creates an empty specification solved by `solver`.
    pub fn with_solver(solver: Box<dyn Solver>) -> Self {
        let mut spec = Self::new();
        spec.solver = Some(solver);
        spec
    }

    pub fn set_solver(&mut self, solver: Box<dyn Solver>) {
        self.solver = Some(solver);
    }

    pub fn solver(&self) -> Option<&dyn Solver> {
        self.solver.as_deref()
    }

    /// Downcasts the configured solver.
    pub fn solver_as<T: 'static>(&self) -> Option<&T> {
        self.solver.as_ref()?.as_any().downcast_ref::<T>()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Sets the tolerance below which a residual counts as zero.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        if tolerance.is_finite() && tolerance > 0.0 {
            self.tolerance = tolerance;
        } else {
            warn!(tolerance, "ignoring invalid tolerance");
        }
    }

    // === Variables ===

    /// Creates an unattached, unset variable.
    pub fn add_variable(&mut self) -> Variable {
        self.push_slot(None)
    }

    pub fn add_named_variable(&mut self, name: impl Into<String>) -> Variable {
        self.push_slot(Some(name.into()))
    }

    fn push_slot(&mut self, name: Option<String>) -> Variable {
        let variable = Variable {
            spec: self.id,
            index: self.slots.len(),
        };
        self.slots.push(VariableSlot::new(name));
        variable
    }

    fn owns(&self, variable: Variable) -> bool {
        variable.spec == self.id && variable.index < self.slots.len()
    }

    fn slot(&self, variable: Variable) -> &VariableSlot {
        assert!(
            self.owns(variable),
            "variable {variable} belongs to another specification"
        );
        &self.slots[variable.index]
    }

    fn slot_mut(&mut self, variable: Variable) -> &mut VariableSlot {
        assert!(
            self.owns(variable),
            "variable {variable} belongs to another specification"
        );
        &mut self.slots[variable.index]
    }

    /// Current value; NaN while unset.
    ///
    /// # Panics
    ///
    /// Panics if `variable` was created by another specification.
    pub fn value(&self, variable: Variable) -> f64 {
        self.slot(variable).value
    }

    /// # Panics
    ///
    /// Panics if `variable` was created by another specification.
    pub fn set_value(&mut self, variable: Variable, value: f64) {
        self.slot_mut(variable).value = value;
    }

    pub fn name(&self, variable: Variable) -> Option<&str> {
        self.slot(variable).name.as_deref()
    }

    pub fn set_name(&mut self, variable: Variable, name: impl Into<String>) {
        self.slot_mut(variable).name = Some(name.into());
    }

    /// Name of the variable, or its `x<index>` label.
    pub fn label(&self, variable: Variable) -> String {
        self.name(variable)
            .map_or_else(|| variable.to_string(), str::to_owned)
    }

    /// True while at least one added constraint references `variable`.
    pub fn is_attached(&self, variable: Variable) -> bool {
        !self.slot(variable).active.is_empty()
    }

    /// Constraints currently referencing `variable`.
    pub fn active_constraints(&self, variable: Variable) -> impl Iterator<Item = ConstraintId> + '_ {
        self.slot(variable).active.iter().copied()
    }

    /// Attached variables in attachment order.
    pub fn variables(&self) -> &[Variable] {
        &self.attached
    }

    /// Number of variables ever created, attached or not.
    pub fn variable_count(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of all values indexed by [`Variable::index`].
    pub fn values(&self) -> Vec<f64> {
        self.slots.iter().map(|slot| slot.value).collect()
    }

    /// Writes back a buffer obtained from [`values`](Self::values).
    pub fn store_values(&mut self, values: &[f64]) {
        for (slot, &value) in self.slots.iter_mut().zip(values) {
            slot.value = value;
        }
    }

    /// Sets every variable to zero.
    pub fn reset_values(&mut self) {
        for slot in &mut self.slots {
            slot.value = 0.0;
        }
    }

    /// Sets unset (NaN) variables to zero.
    pub fn initialize_unset(&mut self) {
        for slot in &mut self.slots {
            if slot.value.is_nan() {
                slot.value = 0.0;
            }
        }
    }

    // === Constraints ===

    /// Adds a constraint and registers it with its variables.
    ///
    /// # Errors
    ///
    /// - [`LinRelaxError::ForeignVariable`] if a summand references a
    ///   variable of another specification.
    /// - [`LinRelaxError::InvalidPenalty`] unless `0 < penalty <= 1`.
    ///
    /// The specification is left unchanged on error.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId> {
        if let Some(foreign) = constraint
            .summands()
            .iter()
            .map(|s| s.variable())
            .find(|&v| !self.owns(v))
        {
            return Err(LinRelaxError::ForeignVariable(foreign));
        }
        validate_penalty(constraint.penalty())?;

        let id = ConstraintId(self.constraints.len());
        for summand in constraint.summands() {
            let variable = summand.variable();
            let slot = &mut self.slots[variable.index];
            if slot.active.is_empty() {
                self.attached.push(variable);
            }
            slot.active.insert(id);
        }
        self.constraints.push(Some(constraint));
        self.order.push(id);

        if let Some(mut solver) = self.solver.take() {
            solver.on_constraint_added(self, id);
            self.solver = Some(solver);
        }
        Ok(id)
    }

    /// Removes a constraint, deregistering it from its variables.
    ///
    /// # Errors
    ///
    /// [`LinRelaxError::UnknownConstraint`] if `id` is not part of this
    /// specification.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint> {
        let constraint = self
            .constraints
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(LinRelaxError::UnknownConstraint(id))?;
        self.order.retain(|&c| c != id);

        for summand in constraint.summands() {
            let variable = summand.variable();
            let slot = &mut self.slots[variable.index];
            slot.active.remove(&id);
            if slot.active.is_empty() {
                self.attached.retain(|&v| v != variable);
            }
        }

        if let Some(mut solver) = self.solver.take() {
            solver.on_constraint_removed(self, id, &constraint);
            self.solver = Some(solver);
        }
        Ok(constraint)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.0).and_then(Option::as_ref)
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.get_mut(id.0).and_then(Option::as_mut)
    }

    fn require_mut(&mut self, id: ConstraintId) -> Result<&mut Constraint> {
        self.constraint_mut(id)
            .ok_or(LinRelaxError::UnknownConstraint(id))
    }

    fn require(&self, id: ConstraintId) -> Result<&Constraint> {
        self.constraint(id).ok_or(LinRelaxError::UnknownConstraint(id))
    }

    /// Enables or disables a constraint on behalf of the caller.
    ///
    /// The solver is notified, so a conflict-resolving solver treats the
    /// flag as the caller's choice rather than one of its own suspensions.
    pub fn set_enabled(&mut self, id: ConstraintId, enabled: bool) -> Result<()> {
        self.require_mut(id)?.set_enabled(enabled);
        if let Some(mut solver) = self.solver.take() {
            solver.on_constraint_enabled(self, id, enabled);
            self.solver = Some(solver);
        }
        Ok(())
    }

    pub fn set_penalty(&mut self, id: ConstraintId, penalty: f64) -> Result<()> {
        self.require_mut(id)?.set_penalty(penalty)
    }

    pub fn set_right_side(&mut self, id: ConstraintId, right_side: impl Into<RightSide>) -> Result<()> {
        self.require_mut(id)?.set_right_side(right_side);
        Ok(())
    }

    /// Constraint ids in insertion order.
    pub fn constraint_ids(&self) -> &[ConstraintId] {
        &self.order
    }

    pub fn constraint_count(&self) -> usize {
        self.order.len()
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.constraint(id).map(|c| (id, c)))
    }

    /// Enabled constraints in insertion order.
    pub fn enabled_constraints(&self) -> Vec<ConstraintId> {
        self.constraints()
            .filter(|(_, c)| c.is_enabled())
            .map(|(id, _)| id)
            .collect()
    }

    /// All constraints sorted by descending penalty; ties keep insertion order.
    pub fn constraints_by_priority(&self) -> Vec<ConstraintId> {
        let mut ids = self.order.clone();
        self.sort_by_priority(&mut ids);
        ids
    }

    /// Stable sort of `ids` by descending penalty.
    pub fn sort_by_priority(&self, ids: &mut [ConstraintId]) {
        ids.sort_by(|a, b| {
            let pa = self.constraint(*a).map_or(0.0, Constraint::penalty);
            let pb = self.constraint(*b).map_or(0.0, Constraint::penalty);
            pb.total_cmp(&pa)
        });
    }

    // === Errors ===

    /// Residual of a constraint at the current values.
    pub fn error(&self, id: ConstraintId) -> Result<f64> {
        let constraint = self.require(id)?;
        Ok(constraint.error(&self.values()))
    }

    /// Whether the constraint holds within the specification's tolerance.
    pub fn is_satisfied(&self, id: ConstraintId) -> Result<bool> {
        self.is_satisfied_with(id, self.tolerance)
    }

    pub fn is_satisfied_with(&self, id: ConstraintId, tolerance: f64) -> Result<bool> {
        let constraint = self.require(id)?;
        Ok(constraint.is_satisfied(&self.values(), tolerance))
    }

    /// Largest absolute residual over enabled constraints.
    pub fn max_error(&self) -> f64 {
        self.fold_errors(|_| true, |acc, e| acc.max(e.abs()))
    }

    /// Largest absolute residual over enabled hard constraints.
    pub fn hard_error(&self) -> f64 {
        self.fold_errors(Constraint::is_hard, |acc, e| acc.max(e.abs()))
    }

    /// Sum of squared residuals over enabled constraints.
    pub fn total_squared_error(&self) -> f64 {
        self.fold_errors(|_| true, |acc, e| acc + e * e)
    }

    fn fold_errors(&self, filter: impl Fn(&Constraint) -> bool, fold: impl Fn(f64, f64) -> f64) -> f64 {
        let values = self.values();
        self.constraints()
            .filter(|(_, c)| c.is_enabled() && filter(c))
            .fold(0.0, |acc, (_, c)| fold(acc, c.error(&values)))
    }

    /// Enabled constraints violated beyond the tolerance.
    pub fn unsatisfied_constraints(&self) -> Vec<ConstraintId> {
        let values = self.values();
        self.constraints()
            .filter(|(_, c)| c.is_enabled() && !c.is_satisfied(&values, self.tolerance))
            .map(|(id, _)| id)
            .collect()
    }

    // === Solving ===

    /// Solves with the configured solver.
    ///
    /// Returns [`ResultStatus::Error`] when no solver is configured.
    pub fn solve(&mut self) -> ResultStatus {
        let Some(mut solver) = self.solver.take() else {
            warn!(event = "solve_skipped", "no solver configured");
            self.last_status = Some(ResultStatus::Error);
            return ResultStatus::Error;
        };
        let status = solver.solve(self);
        self.solver = Some(solver);
        self.last_status = Some(status);
        status
    }

    /// Status of the most recent [`solve`](Self::solve).
    pub fn last_status(&self) -> Option<ResultStatus> {
        self.last_status
    }
}

impl Default for LinearSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LinearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearSpec")
            .field("variables", &self.attached.len())
            .field("constraints", &self.order.len())
            .field("tolerance", &self.tolerance)
            .field("solver", &self.solver.as_ref().map(|s| s.solver_type_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests;
