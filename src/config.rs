//! Crate-level configuration: TOML loading and validation.
//!
//! Every tunable lives in a section struct owned by the module it
//! configures; this file composes them into `AmclConfig`, loads them
//! from TOML (each section optional, falling back to defaults), and
//! validates the whole set. Validation failures are fatal: the filter
//! refuses to construct rather than run with out-of-range parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Covariance2D, Pose2D};
use crate::filter::{MotionModelConfig, ParticleFilterConfig, SensorModelConfig};
use crate::scheduler::SchedulerConfig;

/// Configuration errors. All variants are fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML text did not parse.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// Sample bounds are inverted or zero.
    #[error("min_samples ({min}) must be at least 1 and not exceed max_samples ({max})")]
    SampleBounds {
        /// Configured lower bound.
        min: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// A parameter that must be strictly positive is not.
    #[error("{name} must be positive and finite (got {value})")]
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A parameter that must be non-negative is not.
    #[error("{name} must be non-negative and finite (got {value})")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// `range_bad` outside [0, 1).
    #[error("sensor.range_bad must be in [0, 1) (got {0})")]
    RangeBad(f64),

    /// `max_beams` of zero would evaluate no beams.
    #[error("sensor.max_beams must be at least 1")]
    MaxBeams,

    /// Queue capacity of zero cannot hold any observation.
    #[error("scheduler.queue_capacity must be at least 1")]
    QueueCapacity,

    /// The occupancy map has no cells.
    #[error("occupancy map has no cells")]
    EmptyMap,
}

/// Initial pose belief the filter is seeded from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPoseConfig {
    /// Mean x (m).
    pub x: f64,
    /// Mean y (m).
    pub y: f64,
    /// Mean heading (rad).
    pub theta: f64,
    /// Variance on x (m²).
    pub var_x: f64,
    /// Variance on y (m²).
    pub var_y: f64,
    /// Variance on heading (rad²).
    pub var_theta: f64,
}

impl Default for InitialPoseConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            var_x: 0.25,
            var_y: 0.25,
            var_theta: (std::f64::consts::PI / 12.0).powi(2),
        }
    }
}

impl InitialPoseConfig {
    /// Mean as a pose.
    pub fn mean(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta)
    }

    /// Diagonal covariance from the configured variances.
    pub fn covariance(&self) -> Covariance2D {
        Covariance2D::diagonal(self.var_x, self.var_y, self.var_theta)
    }
}

/// Full localization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AmclConfig {
    /// Particle filter core.
    pub filter: ParticleFilterConfig,
    /// Odometry motion model.
    pub motion: MotionModelConfig,
    /// Range sensor model.
    pub sensor: SensorModelConfig,
    /// Update scheduling and queueing.
    pub scheduler: SchedulerConfig,
    /// Initial pose belief.
    pub initial_pose: InitialPoseConfig,
}

impl AmclConfig {
    /// Parse and validate a TOML document. Missing sections and fields
    /// fall back to defaults; out-of-range values are fatal.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AmclConfig =
            basic_toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { name, value })
            }
        }
        fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Negative { name, value })
            }
        }

        if self.filter.min_samples == 0 || self.filter.min_samples > self.filter.max_samples {
            return Err(ConfigError::SampleBounds {
                min: self.filter.min_samples,
                max: self.filter.max_samples,
            });
        }
        positive("filter.pop_err", self.filter.pop_err)?;
        positive("filter.pop_z", self.filter.pop_z)?;
        positive("filter.bin_size_xy", self.filter.bin_size_xy)?;
        positive("filter.bin_size_theta", self.filter.bin_size_theta)?;

        for row in &self.motion.drift {
            for &value in row {
                non_negative("motion.drift", value)?;
            }
        }

        if self.sensor.max_beams == 0 {
            return Err(ConfigError::MaxBeams);
        }
        positive("sensor.range_variance", self.sensor.range_variance)?;
        if !self.sensor.range_bad.is_finite()
            || self.sensor.range_bad < 0.0
            || self.sensor.range_bad >= 1.0
        {
            return Err(ConfigError::RangeBad(self.sensor.range_bad));
        }
        positive("sensor.lut_resolution", self.sensor.lut_resolution)?;
        positive("sensor.lut_max_range", self.sensor.lut_max_range)?;

        if self.scheduler.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        non_negative("scheduler.min_translation", self.scheduler.min_translation)?;
        non_negative("scheduler.min_rotation", self.scheduler.min_rotation)?;
        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                name: "scheduler.poll_interval_ms",
                value: 0.0,
            });
        }

        non_negative("initial_pose.var_x", self.initial_pose.var_x)?;
        non_negative("initial_pose.var_y", self.initial_pose.var_y)?;
        non_negative("initial_pose.var_theta", self.initial_pose.var_theta)?;

        Ok(())
    }
}
