//! Tests for constraint evaluation.

use super::*;
use crate::LinearSpec;

fn two_vars() -> (LinearSpec, Variable, Variable) {
    let mut spec = LinearSpec::new();
    let x = spec.add_variable();
    let y = spec.add_variable();
    (spec, x, y)
}

#[test]
fn test_equality_error_is_signed() {
    let (_, x, y) = two_vars();
    let c = Constraint::equal([Summand::new(1.0, x), Summand::new(2.0, y)], 10.0);
    let values = [1.0, 2.0];

    assert_eq!(c.lhs(&values), 5.0);
    assert_eq!(c.error(&values), 5.0);
    assert_eq!(c.error(&[10.0, 2.0]), -4.0);
}

#[test]
fn test_inequality_errors_are_one_sided() {
    let (_, x, _) = two_vars();
    let ge = Constraint::at_least([Summand::new(1.0, x)], 3.0);
    let le = Constraint::at_most([Summand::new(1.0, x)], 3.0);

    assert_eq!(ge.error(&[1.0, 0.0]), 2.0);
    assert_eq!(ge.error(&[5.0, 0.0]), 0.0);
    assert_eq!(le.error(&[5.0, 0.0]), 2.0);
    assert_eq!(le.error(&[1.0, 0.0]), 0.0);
}

#[test]
fn test_deficit_direction() {
    let (_, x, _) = two_vars();
    let le = Constraint::at_most([Summand::new(1.0, x)], 3.0);

    assert_eq!(le.deficit(&[5.0, 0.0]), -2.0);
    assert_eq!(le.deficit(&[1.0, 0.0]), 0.0);
}

#[test]
fn test_is_satisfied_uses_tolerance() {
    let (_, x, _) = two_vars();
    let c = Constraint::equal([Summand::new(1.0, x)], 1.0);

    assert!(c.is_satisfied(&[1.0 + 1e-12, 0.0], 1e-10));
    assert!(!c.is_satisfied(&[1.0 + 1e-6, 0.0], 1e-10));
}

#[test]
fn test_duplicate_summands_are_merged() {
    let (_, x, y) = two_vars();
    let c = Constraint::equal(
        [Summand::new(1.0, x), Summand::new(3.0, y), Summand::new(2.0, x)],
        0.0,
    );

    assert_eq!(c.summands().len(), 2);
    assert_eq!(c.coefficient_of(x), 3.0);
    assert_eq!(c.summand_index(y), Some(1));
}

#[test]
fn test_norm_and_dominance() {
    let (_, x, y) = two_vars();
    let c = Constraint::equal([Summand::new(3.0, x), Summand::new(-1.0, y)], 0.0);

    assert_eq!(c.norm_squared(), 10.0);
    assert_eq!(c.abs_coefficient_sum(), 4.0);
    assert_eq!(c.dominance(0), 0.75);
    assert_eq!(c.dominant_summand(), Some(0));
}

#[test]
fn test_degenerate_constraint_satisfiability() {
    let (_, x, _) = two_vars();
    let impossible = Constraint::equal([Summand::new(0.0, x)], 5.0);
    let trivial = Constraint::at_most([Summand::new(0.0, x)], 5.0);
    let regular = Constraint::equal([Summand::new(2.0, x)], 5.0);

    assert!(impossible.is_degenerate());
    assert!(!impossible.is_satisfiable_alone(1e-10));
    assert!(trivial.is_satisfiable_alone(1e-10));
    assert!(regular.is_satisfiable_alone(1e-10));
}

#[test]
fn test_set_penalty_validation() {
    let (_, x, _) = two_vars();
    let mut c = Constraint::equal([Summand::new(1.0, x)], 0.0);

    assert!(c.is_hard());
    assert!(c.set_penalty(0.4).is_ok());
    assert!(!c.is_hard());
    assert!(matches!(
        c.set_penalty(0.0),
        Err(LinRelaxError::InvalidPenalty(_))
    ));
    assert!(c.set_penalty(1.5).is_err());
    assert!(c.set_penalty(f64::NAN).is_err());
    assert_eq!(c.penalty(), 0.4);
}

#[test]
fn test_computed_right_side() {
    let (_, x, _) = two_vars();
    let mut c = Constraint::equal([Summand::new(1.0, x)], 1.0);
    c.set_right_side(RightSide::computed(|| 42.0));

    assert!(c.right_side_source().is_computed());
    assert_eq!(c.right_side(), 42.0);
    assert_eq!(c.error(&[40.0, 0.0]), 2.0);
}

#[test]
fn test_clone_shares_variables() {
    let (_, x, y) = two_vars();
    let original = Constraint::at_least([Summand::new(1.0, x), Summand::new(1.0, y)], 2.0)
        .with_penalty(0.5)
        .with_name("sum");
    let copy = original.clone();

    assert_eq!(copy.summands(), original.summands());
    assert_eq!(copy.penalty(), 0.5);
    assert_eq!(copy.name(), Some("sum"));
}

#[test]
fn test_display() {
    let (_, x, y) = two_vars();
    let c = Constraint::at_least([Summand::new(1.0, y), Summand::new(-1.0, x)], 100.0)
        .with_penalty(0.5)
        .with_name("width");

    assert_eq!(c.to_string(), "width: 1*x1 + -1*x0 >= 100 (penalty 0.5)");
}

#[test]
fn test_pivot_out_of_range_is_ignored() {
    let (_, x, _) = two_vars();
    let mut c = Constraint::equal([Summand::new(1.0, x)], 0.0);

    c.set_pivot(Some(3));
    assert_eq!(c.pivot(), None);
    c.set_pivot(Some(0));
    assert_eq!(c.pivot_summand().map(|s| s.variable()), Some(x));
}
