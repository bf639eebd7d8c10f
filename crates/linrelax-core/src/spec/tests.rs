//! Tests for the specification arena.

use std::any::Any;

use super::*;
use crate::constraint::{Operator, Summand};

#[derive(Debug, Default)]
struct RecordingSolver {
    added: Vec<ConstraintId>,
    removed: Vec<ConstraintId>,
    toggled: Vec<(ConstraintId, bool)>,
    solves: usize,
}

impl Solver for RecordingSolver {
    fn solve(&mut self, spec: &mut LinearSpec) -> ResultStatus {
        self.solves += 1;
        spec.initialize_unset();
        ResultStatus::Suboptimal
    }

    fn solver_type_name(&self) -> &'static str {
        "Recording"
    }

    fn on_constraint_added(&mut self, _spec: &LinearSpec, id: ConstraintId) {
        self.added.push(id);
    }

    fn on_constraint_enabled(&mut self, spec: &LinearSpec, id: ConstraintId, enabled: bool) {
        assert_eq!(spec.constraint(id).map(Constraint::is_enabled), Some(enabled));
        self.toggled.push((id, enabled));
    }

    fn on_constraint_removed(&mut self, spec: &LinearSpec, id: ConstraintId, _removed: &Constraint) {
        assert!(spec.constraint(id).is_none());
        self.removed.push(id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_variables_start_unset_and_detached() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();

    assert!(spec.value(x).is_nan());
    assert!(!spec.is_attached(x));
    assert!(spec.variables().is_empty());
    assert_eq!(spec.variable_count(), 1);
    assert_eq!(spec.label(x), "x0");
}

#[test]
fn test_attach_and_detach_follow_constraints() {
    let mut spec = LinearSpec::new();
    let x = spec.add_named_variable("x");
    let y = spec.add_named_variable("y");

    let c1 = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x), Summand::new(1.0, y)], 1.0))
        .unwrap();
    let c2 = spec
        .add_constraint(Constraint::at_least([Summand::new(1.0, x)], 0.0))
        .unwrap();

    assert_eq!(spec.variables(), &[x, y]);
    assert_eq!(spec.active_constraints(x).collect::<Vec<_>>(), vec![c1, c2]);

    spec.remove_constraint(c1).unwrap();
    assert!(spec.is_attached(x));
    assert!(!spec.is_attached(y));
    assert_eq!(spec.variables(), &[x]);

    spec.remove_constraint(c2).unwrap();
    assert!(spec.variables().is_empty());
    assert_eq!(spec.label(x), "x");
}

#[test]
fn test_handles_stay_valid_after_removal() {
    let mut spec = LinearSpec::new();
    let x = spec.add_named_variable("x");
    let old = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 3.0))
        .unwrap();
    spec.set_value(x, 3.0);

    spec.remove_constraint(old).unwrap();
    assert!(spec.variables().is_empty());
    assert_eq!(spec.value(x), 3.0);

    let new = spec
        .add_constraint(Constraint::at_least([Summand::new(1.0, x)], 1.0))
        .unwrap();
    assert_ne!(new, old);
    assert!(spec.constraint(old).is_none());
    assert!(matches!(spec.error(old), Err(LinRelaxError::UnknownConstraint(c)) if c == old));
    assert_eq!(spec.variables(), &[x]);
    assert!(spec.is_satisfied(new).unwrap());
}

#[test]
fn test_foreign_variable_is_rejected() {
    let mut a = LinearSpec::new();
    let mut b = LinearSpec::new();
    let x = a.add_variable();
    b.add_variable();

    let result = b.add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0));

    assert!(matches!(result, Err(LinRelaxError::ForeignVariable(v)) if v == x));
    assert_eq!(b.constraint_count(), 0);
    assert!(b.variables().is_empty());
}

#[test]
#[should_panic(expected = "belongs to another specification")]
fn test_foreign_variable_value_panics() {
    let mut a = LinearSpec::new();
    let b = LinearSpec::new();
    let x = a.add_variable();

    let _ = b.value(x);
}

#[test]
fn test_invalid_penalty_is_rejected() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();

    let result = spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0).with_penalty(0.0));

    assert!(matches!(result, Err(LinRelaxError::InvalidPenalty(_))));
    assert!(!spec.is_attached(x));
}

#[test]
fn test_removing_twice_fails() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let id = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0))
        .unwrap();

    assert!(spec.remove_constraint(id).is_ok());
    assert!(matches!(
        spec.remove_constraint(id),
        Err(LinRelaxError::UnknownConstraint(c)) if c == id
    ));
    assert!(spec.set_enabled(id, false).is_err());
    assert!(spec.error(id).is_err());
}

#[test]
fn test_errors_at_current_values() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let y = spec.add_variable();
    let eq = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 4.0))
        .unwrap();
    let ge = spec
        .add_constraint(Constraint::at_least([Summand::new(1.0, y)], 10.0).with_penalty(0.5))
        .unwrap();

    spec.set_value(x, 1.0);
    spec.set_value(y, 7.0);

    assert_eq!(spec.error(eq).unwrap(), 3.0);
    assert_eq!(spec.max_error(), 3.0);
    assert_eq!(spec.hard_error(), 3.0);
    assert_eq!(spec.total_squared_error(), 18.0);
    assert_eq!(spec.unsatisfied_constraints(), vec![eq, ge]);

    spec.set_enabled(eq, false).unwrap();
    assert_eq!(spec.hard_error(), 0.0);
    assert_eq!(spec.unsatisfied_constraints(), vec![ge]);
    assert_eq!(spec.enabled_constraints(), vec![ge]);
}

#[test]
fn test_priority_sort_is_stable() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let soft_a = spec
        .add_constraint(Constraint::new([Summand::new(1.0, x)], Operator::Eq, 1.0).with_penalty(0.5))
        .unwrap();
    let hard_a = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0))
        .unwrap();
    let soft_b = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0).with_penalty(0.5))
        .unwrap();
    let mid = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0).with_penalty(0.8))
        .unwrap();
    let hard_b = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0))
        .unwrap();

    assert_eq!(
        spec.constraints_by_priority(),
        vec![hard_a, hard_b, mid, soft_a, soft_b]
    );
    assert_eq!(spec.constraint_ids(), &[soft_a, hard_a, soft_b, mid, hard_b]);
}

#[test]
fn test_solve_without_solver_reports_error() {
    let mut spec = LinearSpec::new();

    assert_eq!(spec.solve(), ResultStatus::Error);
    assert_eq!(spec.last_status(), Some(ResultStatus::Error));
}

#[test]
fn test_solver_is_notified_and_invoked() {
    let mut spec = LinearSpec::with_solver(Box::new(RecordingSolver::default()));
    let x = spec.add_variable();
    let id = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0))
        .unwrap();
    spec.set_enabled(id, false).unwrap();
    spec.remove_constraint(id).unwrap();

    assert_eq!(spec.solve(), ResultStatus::Suboptimal);
    assert_eq!(spec.value(x), 0.0);

    let solver = spec.solver_as::<RecordingSolver>().unwrap();
    assert_eq!(solver.added, vec![id]);
    assert_eq!(solver.removed, vec![id]);
    assert_eq!(solver.toggled, vec![(id, false)]);
    assert_eq!(solver.solves, 1);
}

#[test]
fn test_tolerance_rejects_invalid_values() {
    let mut spec = LinearSpec::new();
    assert_eq!(spec.tolerance(), DEFAULT_TOLERANCE);

    spec.set_tolerance(1e-6);
    assert_eq!(spec.tolerance(), 1e-6);

    spec.set_tolerance(-1.0);
    spec.set_tolerance(f64::NAN);
    assert_eq!(spec.tolerance(), 1e-6);
}

#[test]
fn test_value_buffer_round_trip_and_reset() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let y = spec.add_variable();
    spec.set_value(y, 3.0);

    spec.initialize_unset();
    assert_eq!(spec.values(), vec![0.0, 3.0]);

    spec.store_values(&[5.0, 6.0]);
    assert_eq!(spec.value(x), 5.0);

    spec.reset_values();
    assert_eq!(spec.values(), vec![0.0, 0.0]);
}
