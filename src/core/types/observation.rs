//! Observation types fed to the localization filter.
//!
//! The producer side pushes a single closed stream of observations; the
//! filter thread dispatches on the variant. Malformed observations (any
//! non-finite field) are rejected at the consumer with a warning rather
//! than aborting the filter.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;

/// An absolute odometry pose sample in the odometry frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometrySample {
    /// Sample time in seconds.
    pub timestamp: f64,
    /// Accumulated odometry pose.
    pub pose: Pose2D,
}

impl OdometrySample {
    /// Create an odometry sample.
    pub fn new(timestamp: f64, pose: Pose2D) -> Self {
        Self { timestamp, pose }
    }

    /// True when the timestamp and every pose component are finite.
    pub fn is_valid(&self) -> bool {
        self.timestamp.is_finite() && self.pose.is_finite()
    }
}

/// A set of range readings taken at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeScan {
    /// Scan time in seconds.
    pub timestamp: f64,
    /// (range_m, bearing_rad) pairs, bearings relative to the sensor frame.
    pub readings: Vec<(f64, f64)>,
    /// Sensor maximum range in meters; readings at or beyond it are
    /// max-range returns.
    pub max_range: f64,
}

impl RangeScan {
    /// Create a range scan.
    pub fn new(timestamp: f64, readings: Vec<(f64, f64)>, max_range: f64) -> Self {
        Self {
            timestamp,
            readings,
            max_range,
        }
    }

    /// True when the timestamp, max range, and every reading are finite
    /// and ranges are non-negative.
    pub fn is_valid(&self) -> bool {
        self.timestamp.is_finite()
            && self.max_range.is_finite()
            && self.max_range > 0.0
            && self
                .readings
                .iter()
                .all(|(r, b)| r.is_finite() && *r >= 0.0 && b.is_finite())
    }
}

/// The closed set of observation kinds the filter consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    /// Odometry pose sample.
    Odometry(OdometrySample),
    /// Range sensor scan.
    Range(RangeScan),
}

impl Observation {
    /// Observation time in seconds.
    pub fn timestamp(&self) -> f64 {
        match self {
            Observation::Odometry(s) => s.timestamp,
            Observation::Range(s) => s.timestamp,
        }
    }

    /// Variant name for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Odometry(_) => "odometry",
            Observation::Range(_) => "range",
        }
    }

    /// True when every field of the observation is finite.
    pub fn is_valid(&self) -> bool {
        match self {
            Observation::Odometry(s) => s.is_valid(),
            Observation::Range(s) => s.is_valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odometry_validity() {
        let good = OdometrySample::new(1.0, Pose2D::new(0.1, 0.2, 0.3));
        assert!(good.is_valid());

        let bad = OdometrySample::new(f64::NAN, Pose2D::identity());
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_scan_validity() {
        let good = RangeScan::new(1.0, vec![(2.0, 0.0), (3.5, 0.1)], 8.0);
        assert!(good.is_valid());

        let nan_range = RangeScan::new(1.0, vec![(f64::NAN, 0.0)], 8.0);
        assert!(!nan_range.is_valid());

        let negative_range = RangeScan::new(1.0, vec![(-1.0, 0.0)], 8.0);
        assert!(!negative_range.is_valid());

        let zero_max = RangeScan::new(1.0, vec![(2.0, 0.0)], 0.0);
        assert!(!zero_max.is_valid());
    }

    #[test]
    fn test_observation_dispatch() {
        let obs = Observation::Odometry(OdometrySample::new(2.5, Pose2D::identity()));
        assert_eq!(obs.timestamp(), 2.5);
        assert_eq!(obs.kind(), "odometry");
        assert!(obs.is_valid());

        let obs = Observation::Range(RangeScan::new(3.0, vec![], 8.0));
        assert_eq!(obs.kind(), "range");
        assert!(obs.is_valid());
    }
}
