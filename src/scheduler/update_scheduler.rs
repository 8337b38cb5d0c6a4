//! Update scheduling: when observations become filter cycles.
//!
//! The scheduler is a pure state machine driven by popped observations;
//! it owns the filter and knows nothing about threads, which keeps the
//! full cycle logic testable without spawning anything. The filter
//! thread wraps it in a poll loop.
//!
//! Cycle shape: odometry motion past the configured thresholds starts a
//! cycle (motion update) and opens a measurement window; the first
//! range scan in the window weights the particles; the cycle closes
//! with a resample and a published estimate. If the next qualifying
//! odometry sample arrives before any scan, the cycle closes anyway on
//! uniform weights so the estimate keeps tracking odometry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::{Observation, OdometrySample, Pose2D, RangeScan};
use crate::filter::{extract_hypotheses, ParticleFilter};
use crate::map::OccupancyMap;
use crate::state::{CommandResponse, CommandResult, EstimateHandle, LocalizerCommand};

/// Configuration for update scheduling and queueing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum |Δx| or |Δy| against the reference pose before a cycle
    /// triggers (m). Typical: 0.2.
    pub min_translation: f64,
    /// Minimum |Δθ| against the reference pose before a cycle triggers
    /// (rad). Typical: 30°.
    pub min_rotation: f64,
    /// Observation queue capacity. Typical: 64.
    pub queue_capacity: usize,
    /// Filter thread poll interval in milliseconds; bounds shutdown
    /// latency when no observations arrive. Typical: 10.
    pub poll_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_translation: 0.2,
            min_rotation: 30.0_f64.to_radians(),
            queue_capacity: 64,
            poll_interval_ms: 10,
        }
    }
}

/// Drives the particle filter from a stream of observations.
pub struct UpdateScheduler {
    config: SchedulerConfig,
    filter: ParticleFilter,
    map: Arc<OccupancyMap>,
    estimate: EstimateHandle,
    /// Odometry pose the next motion delta is measured against; `None`
    /// until the first odometry sample bootstraps it.
    reference: Option<Pose2D>,
    /// True between a motion update and the close of its cycle.
    awaiting_scan: bool,
    last_timestamp: f64,
}

impl UpdateScheduler {
    /// Create a scheduler and publish the filter's seeded belief so
    /// readers see a sensible estimate before the first cycle.
    pub fn new(
        config: SchedulerConfig,
        filter: ParticleFilter,
        map: Arc<OccupancyMap>,
        estimate: EstimateHandle,
    ) -> Self {
        let mut scheduler = Self {
            config,
            filter,
            map,
            estimate,
            reference: None,
            awaiting_scan: false,
            last_timestamp: 0.0,
        };
        scheduler.publish();
        scheduler
    }

    /// Process one observation. Malformed observations are logged and
    /// dropped; the filter state is untouched.
    pub fn handle(&mut self, observation: Observation) {
        if !observation.is_valid() {
            log::warn!(
                "dropping malformed {} observation at t={}",
                observation.kind(),
                observation.timestamp()
            );
            return;
        }
        self.last_timestamp = observation.timestamp();
        match observation {
            Observation::Odometry(sample) => self.handle_odometry(sample),
            Observation::Range(scan) => self.handle_range(scan),
        }
    }

    /// Execute a host command between cycles.
    pub fn handle_command(&mut self, command: LocalizerCommand) -> CommandResult {
        match command {
            LocalizerCommand::SetPose { mean, covariance } => {
                if !mean.is_finite() || !covariance.is_finite() {
                    log::warn!("rejecting set_pose with non-finite mean or covariance");
                    return Err("set_pose mean and covariance must be finite".to_string());
                }
                log::info!(
                    "set_pose to ({:.3}, {:.3}, {:.3})",
                    mean.x,
                    mean.y,
                    mean.theta
                );
                self.filter.seed_gaussian(&mean, &covariance);
                self.reference = None;
                self.awaiting_scan = false;
                self.publish();
                Ok(CommandResponse::PoseSet)
            }
            LocalizerCommand::GlobalInit => {
                log::info!("global reinitialization over free space");
                self.filter.seed_uniform_free(&self.map);
                self.reference = None;
                self.awaiting_scan = false;
                self.publish();
                Ok(CommandResponse::GlobalInitDone)
            }
        }
    }

    fn handle_odometry(&mut self, sample: OdometrySample) {
        // A still-open measurement window means no scan arrived for the
        // last motion update; close that cycle before starting anew.
        if self.awaiting_scan {
            log::debug!("closing update cycle without a range scan");
            self.close_cycle();
        }

        let Some(reference) = self.reference else {
            // Bootstrap: the first sample only establishes the reference.
            log::info!(
                "odometry reference initialized at ({:.3}, {:.3}, {:.3})",
                sample.pose.x,
                sample.pose.y,
                sample.pose.theta
            );
            self.reference = Some(sample.pose);
            return;
        };

        let delta = reference.inverse().compose(&sample.pose);
        let triggered = delta.x.abs() > self.config.min_translation
            || delta.y.abs() > self.config.min_translation
            || delta.theta.abs() > self.config.min_rotation;
        if !triggered {
            // Below threshold: drop the sample but keep the reference,
            // so small motions accumulate instead of being lost.
            return;
        }

        self.filter.motion_update(&delta);
        self.reference = Some(sample.pose);
        self.awaiting_scan = true;
    }

    fn handle_range(&mut self, scan: RangeScan) {
        if !self.awaiting_scan {
            // No motion update pending; first-scan-wins already consumed
            // this window or no cycle is open.
            log::trace!("discarding range scan outside measurement window");
            return;
        }
        let degenerate = self.filter.sensor_update(&scan, &self.map);
        if degenerate {
            log::warn!("measurement update degenerated at t={}", scan.timestamp);
        }
        self.close_cycle();
    }

    fn close_cycle(&mut self) {
        self.filter.resample();
        self.awaiting_scan = false;
        self.publish();
    }

    fn publish(&mut self) {
        let hypotheses = extract_hypotheses(self.filter.current_set(), self.filter.histogram());
        match self.estimate.write() {
            Ok(mut estimate) => {
                estimate.best = hypotheses.first().cloned();
                estimate.hypotheses = hypotheses;
                estimate.particles = self.filter.current_set().particles().to_vec();
                estimate.degenerate = self.filter.state().degenerate;
                estimate.timestamp = self.last_timestamp;
                estimate.cycles = self.filter.state().cycles;
            }
            Err(poisoned) => {
                // A reader panicked while holding the lock; the filter
                // thread keeps publishing regardless.
                let mut estimate = poisoned.into_inner();
                estimate.cycles = self.filter.state().cycles;
            }
        }
    }
}
