//! 2D pose in the map frame: position plus heading.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;

/// A 2D pose (x, y, θ) in meters and radians.
///
/// θ is always kept in (-π, π]; constructors and operations normalize it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters.
    pub x: f64,
    /// Y position in meters.
    pub y: f64,
    /// Heading in radians, counter-clockwise from +X.
    pub theta: f64,
}

impl Pose2D {
    /// Create a pose, normalizing the heading.
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// The identity pose at the origin facing +X.
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Compose `self` with a pose expressed in `self`'s frame.
    ///
    /// Applying a robot-frame delta to a map-frame pose yields the new
    /// map-frame pose.
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin, cos) = self.theta.sin_cos();
        Pose2D::new(
            self.x + cos * other.x - sin * other.y,
            self.y + sin * other.x + cos * other.y,
            self.theta + other.theta,
        )
    }

    /// Inverse pose: `self.inverse().compose(&self)` is the identity.
    ///
    /// `a.inverse().compose(&b)` gives b expressed in a's frame, which is
    /// how odometry deltas are extracted from consecutive absolute poses.
    pub fn inverse(&self) -> Pose2D {
        let (sin, cos) = self.theta.sin_cos();
        Pose2D::new(
            -cos * self.x - sin * self.y,
            sin * self.x - cos * self.y,
            -self.theta,
        )
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_new_normalizes_heading() {
        let pose = Pose2D::new(1.0, 2.0, 3.0 * PI);
        assert_relative_eq!(pose.theta, PI);
    }

    #[test]
    fn test_compose_identity() {
        let pose = Pose2D::new(1.0, 2.0, 0.5);
        let composed = pose.compose(&Pose2D::identity());
        assert_relative_eq!(composed.x, pose.x);
        assert_relative_eq!(composed.y, pose.y);
        assert_relative_eq!(composed.theta, pose.theta);
    }

    #[test]
    fn test_compose_rotated_frame() {
        // Robot at origin facing +Y; a forward step lands on +Y.
        let pose = Pose2D::new(0.0, 0.0, PI / 2.0);
        let step = Pose2D::new(1.0, 0.0, 0.0);
        let composed = pose.compose(&step);
        assert_relative_eq!(composed.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(composed.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(composed.theta, PI / 2.0);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let pose = Pose2D::new(3.0, -1.5, 2.3);
        let identity = pose.inverse().compose(&pose);
        assert_relative_eq!(identity.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(identity.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(identity.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_delta_extraction() {
        // a.inverse().compose(&b) recovers the step taken in a's frame.
        let a = Pose2D::new(1.0, 1.0, PI / 2.0);
        let step = Pose2D::new(0.5, 0.1, 0.2);
        let b = a.compose(&step);
        let delta = a.inverse().compose(&b);
        assert_relative_eq!(delta.x, step.x, epsilon = 1e-12);
        assert_relative_eq!(delta.y, step.y, epsilon = 1e-12);
        assert_relative_eq!(delta.theta, step.theta, epsilon = 1e-12);
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose2D::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Pose2D {
            x: f64::NAN,
            y: 0.0,
            theta: 0.0
        }
        .is_finite());
    }
}
