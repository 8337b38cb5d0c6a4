//! Top-level localizer facade: wiring for the filter thread.
//!
//! `Localizer::launch` validates the configuration, builds the filter
//! and scheduler, and spawns the filter thread. The returned handle is
//! the host's whole interface: a cloneable observation sender, a
//! lock-protected estimate snapshot, and synchronous commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AmclConfig, ConfigError};
use crate::core::types::{Covariance2D, Pose2D};
use crate::filter::ParticleFilter;
use crate::map::OccupancyMap;
use crate::scheduler::{observation_channel, FilterThread, ObservationSender, UpdateScheduler};
use crate::state::{
    create_command_channel, create_estimate_handle, send_command_sync, CommandResult,
    CommandSender, EstimateHandle, LocalizerCommand, PoseEstimate,
};

/// Default timeout for synchronous commands.
const COMMAND_TIMEOUT_MS: u64 = 1000;

/// Running localization service.
pub struct Localizer {
    observations: ObservationSender,
    estimate: EstimateHandle,
    commands: CommandSender,
    running: Arc<AtomicBool>,
    thread: FilterThread,
}

impl Localizer {
    /// Validate the configuration, seed the filter, and spawn the
    /// filter thread.
    ///
    /// Fails fast on invalid configuration or an empty map; nothing is
    /// spawned in that case.
    pub fn launch(config: AmclConfig, map: Arc<OccupancyMap>) -> Result<Self, ConfigError> {
        let (width, height) = map.dimensions();
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyMap);
        }

        let filter = ParticleFilter::new(&config)?;
        let estimate = create_estimate_handle();
        let (observations, observation_rx) = observation_channel(config.scheduler.queue_capacity);
        let (commands, command_rx) = create_command_channel();
        let running = Arc::new(AtomicBool::new(true));

        let scheduler = UpdateScheduler::new(
            config.scheduler,
            filter,
            map,
            Arc::clone(&estimate),
        );
        let thread = FilterThread::spawn(
            scheduler,
            observation_rx,
            command_rx,
            Arc::clone(&running),
            Duration::from_millis(config.scheduler.poll_interval_ms),
        );

        Ok(Self {
            observations,
            estimate,
            commands,
            running,
            thread,
        })
    }

    /// Producer handle for pushing observations. Cloneable.
    pub fn observations(&self) -> ObservationSender {
        self.observations.clone()
    }

    /// Snapshot of the latest published estimate.
    pub fn estimate(&self) -> PoseEstimate {
        match self.estimate.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the pose belief with a Gaussian and reseed, blocking for
    /// acknowledgment.
    pub fn set_pose(&self, mean: Pose2D, covariance: Covariance2D) -> CommandResult {
        send_command_sync(
            &self.commands,
            LocalizerCommand::SetPose { mean, covariance },
            COMMAND_TIMEOUT_MS,
        )
    }

    /// Reseed uniformly over the map's free space, blocking for
    /// acknowledgment.
    pub fn global_init(&self) -> CommandResult {
        send_command_sync(
            &self.commands,
            LocalizerCommand::GlobalInit,
            COMMAND_TIMEOUT_MS,
        )
    }

    /// Signal shutdown and wait for the filter thread. Any cycle in
    /// progress completes first.
    pub fn shutdown(self) {
        self.running.store(false, Ordering::Relaxed);
        self.thread.join();
    }
}
