//! Tests for the relaxation variants.

use linrelax_config::ForceDirectedConfig;
use linrelax_core::{Constraint, LinearSpec, ResultStatus, Summand};
use linrelax_test::conflict::{competing_soft_pair, contradictory_hard_pair};
use linrelax_test::layout::{pinwheel, three_equal_areas};

use super::*;
use crate::scope::SolveScope;

fn relax_all<R: Relaxation>(relaxation: &mut R, spec: &mut LinearSpec) -> RelaxOutcome {
    spec.initialize_unset();
    let ids = spec.enabled_constraints();
    relaxation.prepare(spec, &ids);
    let mut scope = SolveScope::for_spec(spec);
    let budget = relaxation.max_iterations();
    relaxation.relax(spec, &mut scope, budget)
}

fn assert_close(actual: f64, expected: f64, eps: f64) {
    assert!((actual - expected).abs() < eps, "expected {expected}, got {actual}");
}

#[test]
fn test_kaczmarz_projects_single_equality_in_one_sweep() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let y = spec.add_variable();
    let id = spec
        .add_constraint(Constraint::equal([Summand::new(1.0, x), Summand::new(2.0, y)], 10.0))
        .unwrap();

    let outcome = relax_all(&mut Kaczmarz::new().with_max_iterations(1), &mut spec);

    assert_eq!(outcome.sweeps, 1);
    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert!(spec.error(id).unwrap().abs() < 1e-12);
    assert_close(spec.value(x), 2.0, 1e-12);
    assert_close(spec.value(y), 4.0, 1e-12);
}

#[test]
fn test_kaczmarz_leaves_satisfied_inequality_alone() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::at_most([Summand::new(1.0, x)], 5.0)).unwrap();
    spec.set_value(x, 3.0);

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.sweeps, 0);
    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert_eq!(spec.value(x), 3.0);
}

#[test]
fn test_kaczmarz_hard_conflict_is_infeasible() {
    let mut spec = LinearSpec::new();
    let (_, five, ten) = contradictory_hard_pair(&mut spec);

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Infeasible);
    assert_eq!(outcome.sweeps, DEFAULT_MAX_ITERATIONS);
    // Residuals are taken before each projection, so both show the gap.
    assert_close(outcome.sweep_residual(five), 5.0, 1e-12);
    assert_close(outcome.sweep_residual(ten), 5.0, 1e-12);
}

#[test]
fn test_kaczmarz_soft_conflict_favours_higher_penalty() {
    let mut spec = LinearSpec::new();
    let (x, high, low) = competing_soft_pair(&mut spec, 0.9, 0.5);

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Suboptimal);
    assert!(outcome.hard_error < spec.tolerance());
    assert!(spec.error(high).unwrap().abs() < spec.error(low).unwrap().abs());
    assert!(spec.value(x) > 10.0 && spec.value(x) < 15.0);
}

#[test]
fn test_kaczmarz_cooling_shrinks_soft_steps() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(0.5))
        .unwrap();

    let mut kaczmarz = Kaczmarz::new().with_max_iterations(2).with_cooling_factor(0.5);
    relax_all(&mut kaczmarz, &mut spec);

    // 0 -> 5 at full scale, then a quarter of the remaining 5.
    assert_close(spec.value(x), 6.25, 1e-12);
}

#[test]
fn test_degenerate_constraints_do_not_poison_values() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(0.0, x)], 0.0)).unwrap();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 3.0)).unwrap();

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert_close(spec.value(x), 3.0, 1e-12);
}

#[test]
fn test_unsatisfiable_degenerate_constraint_is_infeasible() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(0.0, x)], 5.0)).unwrap();

    let outcome = relax_all(&mut Kaczmarz::new().with_max_iterations(10), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Infeasible);
    assert!(spec.value(x).is_finite());
}

#[test]
fn test_kaczmarz_solves_three_equal_areas() {
    let mut spec = LinearSpec::new();
    let areas = three_equal_areas(&mut spec);

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert_close(spec.value(areas.x1), 100.0, 1e-6);
    assert_close(spec.value(areas.x2), 200.0, 1e-6);
}

#[test]
fn test_kaczmarz_solves_pinwheel() {
    let mut spec = LinearSpec::new();
    let tabs = pinwheel(&mut spec);

    let outcome = relax_all(&mut Kaczmarz::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Optimal);
    for axis in [tabs.x, tabs.y] {
        let (a, b) = (spec.value(axis[1]), spec.value(axis[2]));
        assert!(0.0 < a && a < b && b < 300.0, "{a} {b}");
    }
}

#[test]
fn test_gauss_seidel_dominant_pivot_lands_exactly() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(2.0, x)], 8.0)).unwrap();

    let outcome = relax_all(&mut GaussSeidel::new().with_max_iterations(1), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert_close(spec.value(x), 4.0, 1e-12);
}

#[test]
fn test_gauss_seidel_weights_soft_updates_by_penalty() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(0.5))
        .unwrap();

    relax_all(&mut GaussSeidel::new().with_max_iterations(1), &mut spec);

    assert_close(spec.value(x), 5.0, 1e-12);
}

#[test]
fn test_gauss_seidel_moves_only_the_pivot() {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let y = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x), Summand::new(3.0, y)], 8.0))
        .unwrap();

    let mut gauss_seidel = GaussSeidel::new().with_max_iterations(1);
    relax_all(&mut gauss_seidel, &mut spec);

    // y is the pivot (weight 3/4); x only gets a duplicate entry later in
    // the sweep, after y already moved.
    assert_eq!(gauss_seidel.entries().len(), 2);
    assert_close(spec.value(y), 2.0, 1e-12);
    assert_close(spec.value(x), 0.5, 1e-12);
}

#[test]
fn test_gauss_seidel_solves_three_equal_areas() {
    let mut spec = LinearSpec::new();
    let areas = three_equal_areas(&mut spec);

    let outcome = relax_all(&mut GaussSeidel::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Optimal);
    assert_close(spec.value(areas.x1), 100.0, 1e-6);
    assert_close(spec.value(areas.x2), 200.0, 1e-6);
}

#[test]
fn test_force_directed_favours_stiffer_constraint() {
    let mut spec = LinearSpec::new();
    let (x, _, _) = competing_soft_pair(&mut spec, 0.9, 0.5);

    let outcome = relax_all(&mut ForceDirected::new(), &mut spec);

    assert_eq!(outcome.status, ResultStatus::Suboptimal);
    assert!(outcome.hard_error < spec.tolerance());
    assert_close(spec.value(x), 10.0, 0.1);
}

#[test]
fn test_force_directed_enforces_hard_constraints() {
    let mut spec = LinearSpec::new();
    let areas = three_equal_areas(&mut spec);

    let outcome = relax_all(&mut ForceDirected::new(), &mut spec);

    assert!(outcome.status.is_feasible(), "{}", outcome.status);
    assert!(spec.hard_error() < 1e-9);
    let (x1, x2) = (spec.value(areas.x1), spec.value(areas.x2));
    assert!(0.0 < x1 && x1 < x2 && x2 < 300.0, "{x1} {x2}");
}

#[test]
fn test_force_directed_config_keeps_one_hard_sweep() {
    let config = ForceDirectedConfig {
        hard_sweeps: Some(0),
        ..Default::default()
    };
    let mut force = ForceDirected::from_config(&config);
    assert_eq!(force.hard_sweeps(), 1);

    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 5.0)).unwrap();
    spec.add_constraint(Constraint::equal([Summand::new(1.0, x)], 10.0).with_penalty(0.5))
        .unwrap();
    let outcome = relax_all(&mut force, &mut spec);

    assert_eq!(outcome.status, ResultStatus::Suboptimal);
    assert!(outcome.hard_error < spec.tolerance());
    assert_close(spec.value(x), 5.0, 1e-9);
}

#[test]
fn test_stiffness_bands() {
    assert_eq!(force::stiffness(1.0), force::HARD_STIFFNESS);
    assert_eq!(force::stiffness(0.9), force::HIGH_STIFFNESS);
    assert_eq!(force::stiffness(0.5), 0.5);
}

#[test]
fn test_progress_monitor_classification() {
    let summary = |max, hard| ErrorSummary {
        max,
        hard,
        soft_squared: 0.0,
    };
    let mut monitor = ProgressMonitor::new(10);
    monitor.record(4, 100.0);
    monitor.record(5, 4.0);
    monitor.record(6, 3.0);

    assert_eq!(monitor.classify(summary(0.0, 0.0), 1e-10), ResultStatus::Optimal);
    assert_eq!(monitor.classify(summary(1.0, 0.0), 1e-10), ResultStatus::Suboptimal);
    assert_eq!(monitor.classify(summary(1.0, 1.0), 1e-10), ResultStatus::Suboptimal);
    assert_eq!(monitor.classify(summary(3.0, 3.0), 1e-10), ResultStatus::Infeasible);
}

#[test]
fn test_removed_constraint_leaves_prepared_list() {
    let mut spec = LinearSpec::new();
    let (_, five, ten) = contradictory_hard_pair(&mut spec);
    let mut kaczmarz = Kaczmarz::new();
    kaczmarz.prepare(&mut spec, &[five, ten]);

    spec.remove_constraint(ten).unwrap();
    assert!(kaczmarz.constraint_removed(&spec, ten));

    assert_eq!(kaczmarz.constraints(), &[five]);
}
