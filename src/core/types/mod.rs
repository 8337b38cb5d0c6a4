//! Core value types shared across the crate.

mod covariance;
mod observation;
mod pose;

pub use covariance::Covariance2D;
pub use observation::{Observation, OdometrySample, RangeScan};
pub use pose::Pose2D;
