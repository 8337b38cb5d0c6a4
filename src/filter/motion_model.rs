//! Odometry motion model with drift-matrix noise.
//!
//! The predict step applies a robot-frame odometry delta to every
//! particle, perturbed by zero-mean Gaussian noise whose standard
//! deviations scale with the magnitude of the motion. A stationary
//! robot therefore stays put: zero delta means zero noise.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::Pose2D;

/// Configuration for the odometry motion model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionModelConfig {
    /// 3x3 drift coefficient matrix. Row i gives the standard-deviation
    /// contribution of (|Δx|, |Δy|, |Δθ|) to the noise on axis i, where
    /// axes are ordered (x, y, θ). Diagonal terms model proportional
    /// drift along each axis; off-diagonal terms couple axes (e.g. how
    /// much forward travel disturbs heading).
    pub drift: [[f64; 3]; 3],
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            // Typical values for a differential-drive base on hard floor.
            drift: [
                [0.10, 0.02, 0.02],
                [0.02, 0.10, 0.02],
                [0.05, 0.05, 0.20],
            ],
        }
    }
}

impl MotionModelConfig {
    /// Preset for well-calibrated odometry (smooth floors, good encoders).
    pub fn low_noise() -> Self {
        Self {
            drift: [
                [0.05, 0.01, 0.01],
                [0.01, 0.05, 0.01],
                [0.02, 0.02, 0.10],
            ],
        }
    }

    /// Preset for slippery surfaces or worn drive trains.
    pub fn high_noise() -> Self {
        Self {
            drift: [
                [0.20, 0.05, 0.05],
                [0.05, 0.20, 0.05],
                [0.10, 0.10, 0.40],
            ],
        }
    }
}

/// Samples noisy particle poses from odometry deltas.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    /// Create a motion model.
    pub fn new(config: MotionModelConfig) -> Self {
        Self { config }
    }

    /// Apply `delta` (a robot-frame step) to `pose` with sampled noise.
    ///
    /// Each particle gets an independent draw, which is what keeps the
    /// particle cloud spread in proportion to odometry uncertainty.
    pub fn sample<R: Rng>(&self, pose: &Pose2D, delta: &Pose2D, rng: &mut R) -> Pose2D {
        let magnitude = [delta.x.abs(), delta.y.abs(), delta.theta.abs()];
        let mut sigma = [0.0; 3];
        for (i, row) in self.config.drift.iter().enumerate() {
            sigma[i] = row[0] * magnitude[0] + row[1] * magnitude[1] + row[2] * magnitude[2];
        }

        let noisy = Pose2D::new(
            delta.x + sample_gaussian(rng, sigma[0]),
            delta.y + sample_gaussian(rng, sigma[1]),
            delta.theta + sample_gaussian(rng, sigma[2]),
        );
        pose.compose(&noisy)
    }
}

/// Draw from N(0, sigma²) via Box-Muller. sigma == 0 returns exactly 0.
pub(crate) fn sample_gaussian<R: Rng>(rng: &mut R, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    #[test]
    fn test_zero_delta_is_exact() {
        let model = MotionModel::new(MotionModelConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        let pose = Pose2D::new(1.0, 2.0, 0.5);
        let result = model.sample(&pose, &Pose2D::identity(), &mut rng);
        assert_relative_eq!(result.x, pose.x);
        assert_relative_eq!(result.y, pose.y);
        assert_relative_eq!(result.theta, pose.theta);
    }

    #[test]
    fn test_noise_free_model_composes() {
        let model = MotionModel::new(MotionModelConfig {
            drift: [[0.0; 3]; 3],
        });
        let mut rng = StdRng::seed_from_u64(7);
        let pose = Pose2D::new(0.0, 0.0, PI / 2.0);
        let delta = Pose2D::new(1.0, 0.0, 0.0);
        let result = model.sample(&pose, &delta, &mut rng);
        // Forward step while facing +Y lands on +Y.
        assert_relative_eq!(result.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noise_scales_with_motion() {
        let model = MotionModel::new(MotionModelConfig::default());
        let pose = Pose2D::identity();

        let spread = |delta: &Pose2D, seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let samples: Vec<Pose2D> = (0..500).map(|_| model.sample(&pose, delta, &mut rng)).collect();
            let mean_x = samples.iter().map(|p| p.x).sum::<f64>() / samples.len() as f64;
            samples.iter().map(|p| (p.x - mean_x).powi(2)).sum::<f64>() / samples.len() as f64
        };

        let small = spread(&Pose2D::new(0.1, 0.0, 0.0), 42);
        let large = spread(&Pose2D::new(2.0, 0.0, 0.0), 42);
        assert!(large > small * 10.0, "large motion should spread far more");
    }

    #[test]
    fn test_noise_presets_ordered_by_spread() {
        let pose = Pose2D::identity();
        let delta = Pose2D::new(1.0, 0.0, 0.0);

        let spread = |config: MotionModelConfig, seed: u64| {
            let model = MotionModel::new(config);
            let mut rng = StdRng::seed_from_u64(seed);
            let samples: Vec<Pose2D> =
                (0..500).map(|_| model.sample(&pose, &delta, &mut rng)).collect();
            let mean_x = samples.iter().map(|p| p.x).sum::<f64>() / samples.len() as f64;
            samples.iter().map(|p| (p.x - mean_x).powi(2)).sum::<f64>() / samples.len() as f64
        };

        let low = spread(MotionModelConfig::low_noise(), 42);
        let high = spread(MotionModelConfig::high_noise(), 42);
        assert!(high > low, "high-noise preset should spread more: {high} vs {low}");
    }

    #[test]
    fn test_sample_mean_tracks_delta() {
        let model = MotionModel::new(MotionModelConfig::low_noise());
        let mut rng = StdRng::seed_from_u64(99);
        let pose = Pose2D::identity();
        let delta = Pose2D::new(1.0, 0.0, 0.0);

        let n = 2000;
        let mut sum_x = 0.0;
        for _ in 0..n {
            sum_x += model.sample(&pose, &delta, &mut rng).x;
        }
        // Mean of the noisy forward steps stays near 1 m.
        assert_relative_eq!(sum_x / n as f64, 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_gaussian_zero_sigma() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_gaussian(&mut rng, 0.0), 0.0);
        assert_eq!(sample_gaussian(&mut rng, -1.0), 0.0);
    }
}
