//! Thread-safe published localization estimate.
//!
//! The filter thread is the only writer; any number of host threads
//! read. Each publish replaces the whole snapshot under the write lock,
//! so readers never observe a half-updated cycle.

use std::sync::{Arc, RwLock};

use crate::filter::{Particle, PoseHypothesis};

/// Snapshot of the filter output after a completed update cycle.
#[derive(Debug, Clone, Default)]
pub struct PoseEstimate {
    /// Highest-weight hypothesis, if any cycle has completed.
    pub best: Option<PoseHypothesis>,
    /// All hypotheses, sorted by descending weight.
    pub hypotheses: Vec<PoseHypothesis>,
    /// Copy of the current particle generation, for visualization.
    pub particles: Vec<Particle>,
    /// True when the last measurement update degenerated; the estimate
    /// is then the motion prior only and should not be trusted.
    pub degenerate: bool,
    /// Timestamp of the observation that drove the last cycle (s).
    pub timestamp: f64,
    /// Completed update cycles since construction.
    pub cycles: u64,
}

/// Handle type for the shared estimate.
pub type EstimateHandle = Arc<RwLock<PoseEstimate>>;

/// Create an empty shared estimate.
pub fn create_estimate_handle() -> EstimateHandle {
    Arc::new(RwLock::new(PoseEstimate::default()))
}
