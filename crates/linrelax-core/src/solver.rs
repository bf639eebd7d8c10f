//! The solver seam between a specification and the relaxation engines.

use std::any::Any;
use std::fmt::Debug;

use crate::constraint::{Constraint, ConstraintId};
use crate::spec::LinearSpec;
use crate::status::ResultStatus;

/// Engine that assigns values to the variables of a [`LinearSpec`].
///
/// Implementations mutate variable values in place and classify the
/// outcome. The specification notifies its solver about structural
/// edits so that cached state (pivot assignments) can be maintained
/// incrementally.
pub trait Solver: Send + Debug {
    /// Solves the specification, leaving every variable with a defined value.
    fn solve(&mut self, spec: &mut LinearSpec) -> ResultStatus;

    /// Short name used in log output.
    fn solver_type_name(&self) -> &'static str;

    /// Called after `id` has been added to `spec`.
    fn on_constraint_added(&mut self, _spec: &LinearSpec, _id: ConstraintId) {}

    /// Called after the caller enabled or disabled `id` through
    /// [`LinearSpec::set_enabled`].
    fn on_constraint_enabled(&mut self, _spec: &LinearSpec, _id: ConstraintId, _enabled: bool) {}

    /// Called after `id` has been removed from `spec`.
    fn on_constraint_removed(&mut self, _spec: &LinearSpec, _id: ConstraintId, _removed: &Constraint) {}

    /// Access to the concrete solver, e.g. to read statistics after a solve.
    fn as_any(&self) -> &dyn Any;
}
