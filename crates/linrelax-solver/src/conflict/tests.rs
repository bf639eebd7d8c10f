//! Tests for conflict resolution strategies.

use std::sync::{Arc, Mutex};

use linrelax_core::{Constraint, ConstraintId, LinearSpec, ResultStatus, RightSide, Summand, Variable};
use linrelax_test::conflict::{competing_soft_pair, contradictory_hard_pair, isolated_conflict};

use super::*;
use crate::relaxation::{GaussSeidel, Kaczmarz};
use crate::solver::ConflictResolvingSolver;

type Resolving = ConflictResolvingSolver<Box<dyn ConflictStrategy>, Kaczmarz>;

fn spec_with(kind: ConflictStrategyType) -> LinearSpec {
    LinearSpec::with_solver(Box::new(ConflictResolvingSolver::new(strategy_for(kind), Kaczmarz::new())))
}

fn resolving(spec: &LinearSpec) -> &Resolving {
    spec.solver_as::<Resolving>().expect("conflict resolving solver")
}

const ALL: [ConflictStrategyType; 3] = [
    ConflictStrategyType::Adding,
    ConflictStrategyType::Removing,
    ConflictStrategyType::BinarySearch,
];

#[test]
fn test_binary_search_isolates_single_conflict() {
    let mut spec = spec_with(ConflictStrategyType::BinarySearch);
    let system = isolated_conflict(&mut spec, 10, 7);

    assert_eq!(spec.solve(), ResultStatus::Optimal);

    let solver = resolving(&spec);
    assert_eq!(solver.last_suspended(), &[system.conflicting]);
    assert!(!spec.constraint(system.conflicting).unwrap().is_enabled());
    // [0,1) [1,3) [3,7) [7,10) [7,8) [8,9) [9,10)
    assert_eq!(solver.stats().relax_calls, 7);
    for (i, &x) in system.variables.iter().enumerate().filter(|(i, _)| *i != 7) {
        assert!((spec.value(x) - 10.0 * i as f64).abs() < 1e-9);
    }
}

#[test]
fn test_every_strategy_sacrifices_lower_priority() {
    for kind in ALL {
        let mut spec = spec_with(kind);
        let (x, high, low) = competing_soft_pair(&mut spec, 0.9, 0.5);

        assert_eq!(spec.solve(), ResultStatus::Optimal, "{kind:?}");
        assert_eq!(resolving(&spec).last_suspended(), &[low], "{kind:?}");
        assert!(spec.is_satisfied(high).unwrap());
        assert!((spec.value(x) - 10.0).abs() < 1e-9, "{kind:?}");
    }
}

#[test]
fn test_equal_penalties_sacrifice_later_insertion() {
    for kind in ALL {
        let mut spec = spec_with(kind);
        let x = spec.add_variable();
        let first = spec
            .add_constraint(Constraint::equal([Summand::new(1.0, x)], 1.0).with_penalty(0.5))
            .unwrap();
        let second = spec
            .add_constraint(Constraint::equal([Summand::new(1.0, x)], 2.0).with_penalty(0.5))
            .unwrap();

        assert_eq!(spec.solve(), ResultStatus::Optimal, "{kind:?}");
        assert_eq!(resolving(&spec).last_suspended(), &[second], "{kind:?}");
        assert!(spec.is_satisfied(first).unwrap());
    }
}

#[test]
fn test_hard_conflict_is_isolated_by_suspension() {
    for kind in ALL {
        let mut spec = spec_with(kind);
        let (x, five, ten) = contradictory_hard_pair(&mut spec);

        assert_eq!(spec.solve(), ResultStatus::Optimal, "{kind:?}");
        assert_eq!(resolving(&spec).last_suspended(), &[ten], "{kind:?}");
        assert!(spec.is_satisfied(five).unwrap());
        assert!((spec.value(x) - 5.0).abs() < 1e-9);
    }
}

#[test]
fn test_unsatisfiable_hard_constraint_is_infeasible() {
    for kind in [ConflictStrategyType::Adding, ConflictStrategyType::BinarySearch] {
        let mut spec = spec_with(kind);
        let x = spec.add_variable();
        let broken = spec
            .add_constraint(Constraint::equal([Summand::new(0.0, x)], 5.0))
            .unwrap();
        spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 3.0)).unwrap();

        assert_eq!(spec.solve(), ResultStatus::Infeasible, "{kind:?}");
        assert_eq!(resolving(&spec).last_suspended(), &[broken]);
        assert!((spec.value(x) - 3.0).abs() < 1e-9);
    }
}

#[test]
fn test_removing_suspends_unsatisfiable_hard_constraint() {
    let mut spec = spec_with(ConflictStrategyType::Removing);
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 3.0)).unwrap();
    let broken = spec
        .add_constraint(Constraint::equal([Summand::new(0.0, x)], 5.0))
        .unwrap();

    assert_eq!(spec.solve(), ResultStatus::Infeasible);
    assert_eq!(resolving(&spec).last_suspended(), &[broken]);
}

#[test]
fn test_resolve_again_keeps_values() {
    let mut spec = spec_with(ConflictStrategyType::BinarySearch);
    let (x, _, low) = competing_soft_pair(&mut spec, 0.9, 0.5);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    let before = spec.value(x);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    assert_eq!(spec.value(x), before);
    // Reconsidered and suspended again.
    assert_eq!(resolving(&spec).last_suspended(), &[low]);
    assert!(!spec.constraint(low).unwrap().is_enabled());
}

/// Hard `x <= width` with a shared width of 5, soft `x = 10` at 0.5.
fn narrow_window(spec: &mut LinearSpec) -> (Variable, Arc<Mutex<f64>>, ConstraintId) {
    let width = Arc::new(Mutex::new(5.0));
    let x = spec.add_named_variable("x");
    let provider = Arc::clone(&width);
    spec.add_constraint(Constraint::at_most(
        [Summand::new(1.0, x)],
        RightSide::computed(move || *provider.lock().unwrap()),
    ))
    .unwrap();
    let preferred = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(0.5))
        .unwrap();
    (x, width, preferred)
}

#[test]
fn test_suspension_is_lifted_once_conflict_disappears() {
    let mut spec = spec_with(ConflictStrategyType::BinarySearch);
    let (x, width, preferred) = narrow_window(&mut spec);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    assert_eq!(resolving(&spec).last_suspended(), &[preferred]);
    assert!(spec.value(x) <= 5.0 + 1e-9);

    *width.lock().unwrap() = 300.0;

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    assert!(resolving(&spec).last_suspended().is_empty());
    assert!(spec.constraint(preferred).unwrap().is_enabled());
    assert!((spec.value(x) - 10.0).abs() < 1e-9);
}

#[test]
fn test_removing_conflict_restores_suspended_constraint() {
    for kind in ALL {
        let mut spec = spec_with(kind);
        let (x, five, ten) = contradictory_hard_pair(&mut spec);

        assert_eq!(spec.solve(), ResultStatus::Optimal, "{kind:?}");
        assert_eq!(resolving(&spec).last_suspended(), &[ten], "{kind:?}");

        spec.remove_constraint(five).unwrap();

        assert_eq!(spec.solve(), ResultStatus::Optimal, "{kind:?}");
        assert!(resolving(&spec).last_suspended().is_empty(), "{kind:?}");
        assert!(spec.constraint(ten).unwrap().is_enabled(), "{kind:?}");
        assert!((spec.value(x) - 10.0).abs() < 1e-9, "{kind:?}");
    }
}

#[test]
fn test_caller_disabled_constraint_stays_disabled() {
    let mut spec = spec_with(ConflictStrategyType::BinarySearch);
    let (x, width, preferred) = narrow_window(&mut spec);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    spec.set_enabled(preferred, false).unwrap();
    assert!(resolving(&spec).last_suspended().is_empty());

    *width.lock().unwrap() = 300.0;

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    assert!(!spec.constraint(preferred).unwrap().is_enabled());
    assert!(resolving(&spec).last_suspended().is_empty());
    assert!(spec.value(x) <= 5.0 + 1e-9);
}

#[test]
fn test_strategies_run_with_pivot_relaxation() {
    let solver = ConflictResolvingSolver::new(BinarySearchStrategy, GaussSeidel::new());
    let mut spec = LinearSpec::with_solver(Box::new(solver));
    let (x, _, ten) = contradictory_hard_pair(&mut spec);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    assert!(!spec.constraint(ten).unwrap().is_enabled());
    assert!((spec.value(x) - 5.0).abs() < 1e-9);
}

#[test]
fn test_sub_solve_budget_is_configurable() {
    let solver = ConflictResolvingSolver::new(AddingStrategy, Kaczmarz::new()).with_max_iterations(3);
    let mut spec = LinearSpec::with_solver(Box::new(solver));
    contradictory_hard_pair(&mut spec);

    assert_eq!(spec.solve(), ResultStatus::Optimal);
    let stats = spec
        .solver_as::<ConflictResolvingSolver<AddingStrategy, Kaczmarz>>()
        .unwrap()
        .stats();
    assert_eq!(stats.relax_calls, 2);
    assert!(stats.sweeps <= 1 + 3);
    assert_eq!(stats.suspended, 1);
}
