//! Solve statistics.
//!
//! Stack-allocated counters for a single solve run.

use std::time::{Duration, Instant};

/// Solve-level statistics.
///
/// Tracks aggregate metrics across every relaxation sub-solve of a run.
///
/// # Example
///
/// ```
/// use linrelax_solver::stats::SolveStats;
///
/// let mut stats = SolveStats::default();
/// stats.start();
/// stats.record_relax_call();
/// stats.record_sweep();
/// stats.record_projection();
/// stats.record_projection();
///
/// assert_eq!(stats.relax_calls, 1);
/// assert_eq!(stats.sweeps, 1);
/// assert_eq!(stats.projections, 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SolveStats {
    start_time: Option<Instant>,
    /// Full passes over the constraint list.
    pub sweeps: u64,
    /// Individual constraint projections applied.
    pub projections: u64,
    /// Relaxation sub-solves started.
    pub relax_calls: u64,
    /// Pivot selections performed.
    pub pivot_selections: u64,
    /// Duplicate pivot entries synthesized.
    pub duplicates: u64,
    /// Constraints suspended by conflict resolution.
    pub suspended: u64,
}

impl SolveStats {
    /// Marks the start of solving.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns the elapsed time since solving started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
    }

    pub fn record_projection(&mut self) {
        self.projections += 1;
    }

    pub fn record_relax_call(&mut self) {
        self.relax_calls += 1;
    }

    /// Records a pivot selection and the duplicates it created.
    pub fn record_pivot_selection(&mut self, duplicates: usize) {
        self.pivot_selections += 1;
        self.duplicates += duplicates as u64;
    }

    pub fn record_suspension(&mut self) {
        self.suspended += 1;
    }

    /// Returns the projections per second rate.
    pub fn projections_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.projections as f64 / secs
        } else {
            0.0
        }
    }
}
