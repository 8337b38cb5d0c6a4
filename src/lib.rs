//! Adaptive Monte Carlo Localization for mobile robots.
//!
//! Estimates a robot's pose on a known occupancy-grid map from
//! odometry and range scans, using a KLD-adaptive particle filter.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   localizer                         │  ← Facade + wiring
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                scheduler/  state/                   │  ← Threading
//! │    (queue, update scheduling, commands, estimate)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    filter/                          │  ← Core algorithms
//! │  (motion model, sensor model, particle filter,      │
//! │   histogram, hypothesis extraction)                 │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     map/                            │  ← Map + raycasting
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                 (types, math)                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use disha_amcl::{
//!     AmclConfig, Localizer, Observation, OccupancyMap, OdometrySample, Pose2D,
//! };
//!
//! # fn main() -> Result<(), disha_amcl::ConfigError> {
//! let map = Arc::new(OccupancyMap::new_free(200, 200, 0.05, 0.0, 0.0));
//! let localizer = Localizer::launch(AmclConfig::default(), map)?;
//!
//! let sender = localizer.observations();
//! sender
//!     .push(Observation::Odometry(OdometrySample::new(
//!         0.0,
//!         Pose2D::identity(),
//!     )))
//!     .ok();
//!
//! let estimate = localizer.estimate();
//! if let Some(best) = estimate.best {
//!     println!("pose: {:?} (weight {:.2})", best.mean, best.weight);
//! }
//!
//! localizer.shutdown();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Occupancy map (depends on core)
// ============================================================================
pub mod map;

// ============================================================================
// Layer 3: Filter algorithms (depends on core, map)
// ============================================================================
pub mod filter;

// ============================================================================
// Layer 4: Scheduling, shared state, threading (depends on all below)
// ============================================================================
pub mod scheduler;
pub mod state;

// ============================================================================
// Configuration and facade
// ============================================================================
pub mod config;
pub mod localizer;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::math;
pub use crate::core::types::{Covariance2D, Observation, OdometrySample, Pose2D, RangeScan};

// Map
pub use crate::map::{CellState, OccupancyMap};

// Filter
pub use crate::filter::{
    extract_hypotheses, MotionModel, MotionModelConfig, Particle, ParticleFilter,
    ParticleFilterConfig, ParticleFilterState, PoseHistogram, PoseHypothesis, RangeSensorModel,
    SampleSet, SensorModelConfig,
};

// Scheduling and state
pub use crate::scheduler::{
    observation_channel, FilterThread, ObservationSender, PushError, SchedulerConfig,
    UpdateScheduler,
};
pub use crate::state::{
    CommandResponse, CommandResult, EstimateHandle, LocalizerCommand, PoseEstimate,
};

// Configuration and facade
pub use crate::config::{AmclConfig, ConfigError, InitialPoseConfig};
pub use crate::localizer::Localizer;
