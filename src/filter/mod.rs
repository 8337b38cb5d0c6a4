//! Localization filter: motion model, sensor model, and the
//! KLD-adaptive particle filter with hypothesis extraction.

mod histogram;
mod hypothesis;
mod motion_model;
mod particle_filter;
mod sensor_model;

pub use histogram::PoseHistogram;
pub use hypothesis::{extract_hypotheses, PoseHypothesis};
pub use motion_model::{MotionModel, MotionModelConfig};
pub use particle_filter::{
    Particle, ParticleFilter, ParticleFilterConfig, ParticleFilterState, SampleSet,
};
pub use sensor_model::{RangeSensorModel, SensorModelConfig};
