//! Solve-level scope.

use linrelax_core::LinearSpec;

use crate::stats::SolveStats;

/// State shared by every stage of one solve: tolerance and statistics.
#[derive(Debug)]
pub struct SolveScope {
    tolerance: f64,
    stats: SolveStats,
}

impl SolveScope {
    pub fn new(tolerance: f64) -> Self {
        let mut stats = SolveStats::default();
        stats.start();
        Self { tolerance, stats }
    }

    /// Scope using the specification's tolerance.
    pub fn for_spec(spec: &LinearSpec) -> Self {
        Self::new(spec.tolerance())
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SolveStats {
        &mut self.stats
    }

    pub fn into_stats(self) -> SolveStats {
        self.stats
    }
}
