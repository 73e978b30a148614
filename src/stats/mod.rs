//! Collection Cycle Statistics
//!
//! A plain snapshot of what the last cycle did, useful for logging and for
//! the idle-tick heuristics that decide whether to request another cycle.

use std::time::Duration;

/// Counters for one completed collection cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleStats {
    pub marked: usize,
    pub relocated: usize,
    pub duration: Duration,
}

impl CycleStats {
    pub fn survival_rate(&self) -> f64 {
        if self.marked == 0 {
            0.0
        } else {
            self.relocated as f64 / self.marked as f64
        }
    }
}
