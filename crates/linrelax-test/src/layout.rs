//! Layout-style systems built from horizontal and vertical tabs.
//!
//! A tab is a variable holding the position of a grid line; an area spans
//! from one tab to another on each axis.

use linrelax_core::{Constraint, ConstraintId, LinearSpec, Summand, Variable};

/// Penalty of preferred-size constraints.
pub const PREFERRED_PENALTY: f64 = 0.5;

/// Fixes `tab` at `position` with a hard equality.
pub fn fix(spec: &mut LinearSpec, tab: Variable, position: f64) -> ConstraintId {
    spec.add_constraint(Constraint::equal([Summand::new(1.0, tab)], position))
        .expect("tab belongs to spec")
}

/// Hard `high - low >= min`.
pub fn min_span(spec: &mut LinearSpec, low: Variable, high: Variable, min: f64) -> ConstraintId {
    spec.add_constraint(Constraint::at_least(
        [Summand::new(1.0, high), Summand::new(-1.0, low)],
        min,
    ))
    .expect("tabs belong to spec")
}

/// Soft `high - low = size`.
pub fn preferred_span(spec: &mut LinearSpec, low: Variable, high: Variable, size: f64) -> ConstraintId {
    spec.add_constraint(
        Constraint::equal([Summand::new(1.0, high), Summand::new(-1.0, low)], size)
            .with_penalty(PREFERRED_PENALTY),
    )
    .expect("tabs belong to spec")
}

/// Three horizontally adjacent areas.
#[derive(Debug, Clone, Copy)]
pub struct ThreeAreas {
    pub left: Variable,
    pub x1: Variable,
    pub x2: Variable,
    pub right: Variable,
    pub top: Variable,
    pub bottom: Variable,
    /// Soft constraints asking neighbouring widths to be equal.
    pub equal_widths: [ConstraintId; 2],
}

/// Boundary 0..300 by 0..50 split by two free tabs `x1`, `x2` into three
/// areas whose widths softly prefer to be equal.
pub fn three_equal_areas(spec: &mut LinearSpec) -> ThreeAreas {
    let left = spec.add_named_variable("left");
    let x1 = spec.add_named_variable("x1");
    let x2 = spec.add_named_variable("x2");
    let right = spec.add_named_variable("right");
    let top = spec.add_named_variable("top");
    let bottom = spec.add_named_variable("bottom");

    fix(spec, left, 0.0);
    fix(spec, right, 300.0);
    fix(spec, top, 0.0);
    fix(spec, bottom, 50.0);

    let tabs = [left, x1, x2, right];
    for pair in tabs.windows(2) {
        min_span(spec, pair[0], pair[1], 0.0);
    }
    min_span(spec, top, bottom, 0.0);

    // (b - a) - (c - b) = 0
    let mut widths = Vec::with_capacity(2);
    for (i, w) in tabs.windows(3).enumerate() {
        let constraint = Constraint::equal(
            [
                Summand::new(2.0, w[1]),
                Summand::new(-1.0, w[0]),
                Summand::new(-1.0, w[2]),
            ],
            0.0,
        )
        .with_penalty(PREFERRED_PENALTY)
        .with_name(format!("equal_width_{i}"));
        widths.push(spec.add_constraint(constraint).expect("tabs belong to spec"));
    }

    ThreeAreas {
        left,
        x1,
        x2,
        right,
        top,
        bottom,
        equal_widths: [widths[0], widths[1]],
    }
}

/// Tabs of a pinwheel layout; index 0 and 3 are the boundary.
#[derive(Debug, Clone, Copy)]
pub struct Pinwheel {
    pub x: [Variable; 4],
    pub y: [Variable; 4],
}

/// Five areas in a 300 by 300 boundary: four arms rotating around a
/// centre area.
///
/// ```text
/// +---------+----+
/// |    A    |    |
/// +----+----+ B  |
/// |    | E  |    |
/// | D  +----+----+
/// |    |    C    |
/// +----+---------+
/// ```
pub fn pinwheel(spec: &mut LinearSpec) -> Pinwheel {
    let x = [
        spec.add_named_variable("x0"),
        spec.add_named_variable("x1"),
        spec.add_named_variable("x2"),
        spec.add_named_variable("x3"),
    ];
    let y = [
        spec.add_named_variable("y0"),
        spec.add_named_variable("y1"),
        spec.add_named_variable("y2"),
        spec.add_named_variable("y3"),
    ];

    fix(spec, x[0], 0.0);
    fix(spec, x[3], 300.0);
    fix(spec, y[0], 0.0);
    fix(spec, y[3], 300.0);

    // (left, right, top, bottom, preferred width, preferred height)
    let areas = [
        (0, 2, 0, 1, 200.0, 100.0),
        (2, 3, 0, 2, 100.0, 200.0),
        (1, 3, 2, 3, 200.0, 100.0),
        (0, 1, 1, 3, 100.0, 200.0),
        (1, 2, 1, 2, 100.0, 100.0),
    ];
    for &(l, r, t, b, width, height) in &areas {
        min_span(spec, x[l], x[r], 10.0);
        min_span(spec, y[t], y[b], 10.0);
        preferred_span(spec, x[l], x[r], width);
        preferred_span(spec, y[t], y[b], height);
    }

    Pinwheel { x, y }
}
