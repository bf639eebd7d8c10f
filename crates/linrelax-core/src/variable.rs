//! Variable handles and their arena slots.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constraint::ConstraintId;

static NEXT_SPEC_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of the specification that owns an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SpecId(u64);

impl SpecId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SPEC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a scalar unknown stored in a [`LinearSpec`](crate::LinearSpec).
///
/// Handles are cheap to copy. The value, name and active constraint set
/// live in the owning specification; a handle used with any other
/// specification is rejected.
///
/// # Example
///
/// ```
/// use linrelax_core::LinearSpec;
///
/// let mut spec = LinearSpec::new();
/// let x = spec.add_named_variable("x");
///
/// assert_eq!(spec.name(x), Some("x"));
/// assert!(spec.value(x).is_nan());
/// assert!(!spec.is_attached(x));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub(crate) spec: SpecId,
    pub(crate) index: usize,
}

impl Variable {
    /// Position of this variable in its specification's arena.
    ///
    /// Stable for the lifetime of the specification; value buffers
    /// obtained from [`LinearSpec::values`](crate::LinearSpec::values)
    /// are indexed by it.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.index)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VariableSlot {
    pub(crate) value: f64,
    pub(crate) name: Option<String>,
    pub(crate) active: BTreeSet<ConstraintId>,
}

impl VariableSlot {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            value: f64::NAN,
            name,
            active: BTreeSet::new(),
        }
    }
}
