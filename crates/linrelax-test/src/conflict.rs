//! Systems with deliberate conflicts.

use linrelax_core::{Constraint, ConstraintId, LinearSpec, Summand, Variable};

/// Hard `x = 5` and hard `x = 10`.
pub fn contradictory_hard_pair(spec: &mut LinearSpec) -> (Variable, ConstraintId, ConstraintId) {
    let x = spec.add_named_variable("x");
    let five = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 5.0))
        .expect("x belongs to spec");
    let ten = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0))
        .expect("x belongs to spec");
    (x, five, ten)
}

/// Hard `x >= 0`, soft `x = 10` at `high` and soft `x = 20` at `low`.
///
/// Returns the variable and the ids of the high and low constraints.
pub fn competing_soft_pair(spec: &mut LinearSpec, high: f64, low: f64) -> (Variable, ConstraintId, ConstraintId) {
    let x = spec.add_named_variable("x");
    spec.add_constraint(Constraint::at_least([Summand::new(1.0, x)], 0.0))
        .expect("x belongs to spec");
    let low_id = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 20.0).with_penalty(low))
        .expect("x belongs to spec");
    let high_id = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(high))
        .expect("x belongs to spec");
    (x, high_id, low_id)
}

/// Hard system where exactly one constraint conflicts with the rest.
#[derive(Debug, Clone)]
pub struct IsolatedConflict {
    pub variables: Vec<Variable>,
    pub constraints: Vec<ConstraintId>,
    pub conflicting: ConstraintId,
}

/// `count` hard constraints `xᵢ = 10·i`, except that the one at
/// `conflicting` instead demands the earlier variables sum to `-1`.
///
/// # Panics
///
/// Panics if `conflicting` is zero or not below `count`.
pub fn isolated_conflict(spec: &mut LinearSpec, count: usize, conflicting: usize) -> IsolatedConflict {
    assert!(conflicting > 0 && conflicting < count, "conflicting index out of range");

    let variables: Vec<Variable> = (0..count)
        .map(|i| spec.add_named_variable(format!("x{i}")))
        .collect();
    let mut constraints = Vec::with_capacity(count);
    for (i, &x) in variables.iter().enumerate() {
        let constraint = if i == conflicting {
            Constraint::equal(variables[..i].iter().map(|&v| Summand::new(1.0, v)), -1.0)
        } else {
            Constraint::equal([Summand::new(1.0, x)], 10.0 * i as f64)
        };
        constraints.push(spec.add_constraint(constraint).expect("variable belongs to spec"));
    }

    IsolatedConflict {
        variables,
        conflicting: constraints[conflicting],
        constraints,
    }
}
