//! Summary of one synchronization pass.

use serde::Serialize;
use tether_tools::TimerEntry;

/// Entities sent to the backend, by kind and direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub variables_added: usize,
    pub variables_removed: usize,
    pub variables_updated: usize,
    pub params_added: usize,
    pub params_removed: usize,
    /// Bulk parameter-value refreshes (one per call, not per parameter).
    pub param_refreshes: usize,
    pub constraints_added: usize,
    pub constraints_removed: usize,
    pub sos_added: usize,
    pub sos_removed: usize,
    pub objective_sets: usize,
}

impl SyncCounts {
    /// Entity additions, removals and updates, plus objective installs.
    ///
    /// Parameter refreshes are not counted: they re-read values and change
    /// no structure.
    pub fn structural_changes(&self) -> usize {
        self.variables_added
            + self.variables_removed
            + self.variables_updated
            + self.params_added
            + self.params_removed
            + self.constraints_added
            + self.constraints_removed
            + self.sos_added
            + self.sos_removed
            + self.objective_sets
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub counts: SyncCounts,
    pub objective_reset: bool,
    pub duration_ms: f64,
    pub rss_bytes: Option<u64>,
    pub rss_delta_bytes: Option<i64>,
    /// Timer sections recorded so far (cumulative for a shared timer).
    pub timings: Vec<TimerEntry>,
}
