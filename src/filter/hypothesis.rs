//! Pose hypothesis extraction from clustered particles.
//!
//! After each resample the histogram's connected bucket components
//! partition the particle cloud into clusters. Each cluster reduces to
//! a weighted mean pose (circular mean for the heading), a full 3x3
//! covariance with wrapped heading residuals, and the cluster's share
//! of the total weight. The list is rebuilt from scratch every cycle;
//! clusters carry no identity across cycles.

use std::collections::HashMap;

use crate::core::math::angle_diff;
use crate::core::types::{Covariance2D, Pose2D};
use crate::filter::histogram::PoseHistogram;
use crate::filter::particle_filter::SampleSet;

/// One localization hypothesis: a cluster of agreeing particles.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseHypothesis {
    /// Fraction of the total particle weight in this cluster.
    pub weight: f64,
    /// Weighted mean pose of the cluster.
    pub mean: Pose2D,
    /// Weighted 3x3 covariance of the cluster about its mean.
    pub covariance: Covariance2D,
}

struct ClusterAccum {
    weight: f64,
    sum_x: f64,
    sum_y: f64,
    sum_sin: f64,
    sum_cos: f64,
    members: Vec<usize>,
}

/// Reduce the particle set to hypotheses, sorted by descending weight.
///
/// Particles whose bucket is absent from the histogram are skipped;
/// after a resample every particle's bucket is present.
pub fn extract_hypotheses(set: &SampleSet, histogram: &PoseHistogram) -> Vec<PoseHypothesis> {
    let particles = set.particles();
    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<ClusterAccum> = Vec::new();

    for (i, particle) in particles.iter().enumerate() {
        let Some(cluster_id) = histogram.cluster_of(&particle.pose) else {
            continue;
        };
        let slot = *slots.entry(cluster_id).or_insert_with(|| {
            clusters.push(ClusterAccum {
                weight: 0.0,
                sum_x: 0.0,
                sum_y: 0.0,
                sum_sin: 0.0,
                sum_cos: 0.0,
                members: Vec::new(),
            });
            clusters.len() - 1
        });
        let accum = &mut clusters[slot];
        let w = particle.weight;
        accum.weight += w;
        accum.sum_x += w * particle.pose.x;
        accum.sum_y += w * particle.pose.y;
        accum.sum_sin += w * particle.pose.theta.sin();
        accum.sum_cos += w * particle.pose.theta.cos();
        accum.members.push(i);
    }

    let mut hypotheses: Vec<PoseHypothesis> = clusters
        .iter()
        .filter(|c| c.weight > 0.0)
        .map(|cluster| {
            let mean = Pose2D::new(
                cluster.sum_x / cluster.weight,
                cluster.sum_y / cluster.weight,
                cluster.sum_sin.atan2(cluster.sum_cos),
            );

            let mut cov = [0.0; 9];
            for &i in &cluster.members {
                let particle = &particles[i];
                let w = particle.weight / cluster.weight;
                let dx = particle.pose.x - mean.x;
                let dy = particle.pose.y - mean.y;
                let dt = angle_diff(particle.pose.theta, mean.theta);
                cov[0] += w * dx * dx;
                cov[1] += w * dx * dy;
                cov[2] += w * dx * dt;
                cov[4] += w * dy * dy;
                cov[5] += w * dy * dt;
                cov[8] += w * dt * dt;
            }
            cov[3] = cov[1];
            cov[6] = cov[2];
            cov[7] = cov[5];

            PoseHypothesis {
                weight: cluster.weight,
                mean,
                covariance: Covariance2D::from_array(cov),
            }
        })
        .collect();

    hypotheses.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    hypotheses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::particle_filter::Particle;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn build_set(particles: Vec<Particle>) -> (SampleSet, PoseHistogram) {
        let mut histogram = PoseHistogram::new(0.5, 10.0_f64.to_radians());
        for p in &particles {
            histogram.insert(&p.pose);
        }
        (SampleSet::from_particles(particles), histogram)
    }

    #[test]
    fn test_single_cluster_mean() {
        let (set, histogram) = build_set(vec![
            Particle {
                pose: Pose2D::new(1.0, 1.0, 0.1),
                weight: 0.5,
            },
            Particle {
                pose: Pose2D::new(1.2, 1.1, -0.1),
                weight: 0.5,
            },
        ]);
        let hyps = extract_hypotheses(&set, &histogram);
        assert_eq!(hyps.len(), 1);
        assert_relative_eq!(hyps[0].weight, 1.0);
        assert_relative_eq!(hyps[0].mean.x, 1.1, epsilon = 1e-12);
        assert_relative_eq!(hyps[0].mean.y, 1.05, epsilon = 1e-12);
        assert_relative_eq!(hyps[0].mean.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_clusters_sorted_by_weight() {
        let mut particles = Vec::new();
        // Heavy cluster near the origin, light one far away.
        for _ in 0..3 {
            particles.push(Particle {
                pose: Pose2D::new(0.1, 0.1, 0.0),
                weight: 0.3,
            });
        }
        particles.push(Particle {
            pose: Pose2D::new(8.0, 8.0, 1.0),
            weight: 0.1,
        });
        let (set, histogram) = build_set(particles);

        let hyps = extract_hypotheses(&set, &histogram);
        assert_eq!(hyps.len(), 2);
        assert!(hyps[0].weight > hyps[1].weight);
        assert_relative_eq!(hyps[0].weight, 0.9, epsilon = 1e-12);
        assert_relative_eq!(hyps[1].mean.x, 8.0);
    }

    #[test]
    fn test_circular_mean_across_wrap() {
        // Headings straddling ±π must average to π, not 0.
        let (set, histogram) = build_set(vec![
            Particle {
                pose: Pose2D::new(0.1, 0.1, PI - 0.1),
                weight: 0.5,
            },
            Particle {
                pose: Pose2D::new(0.1, 0.1, -PI + 0.1),
                weight: 0.5,
            },
        ]);
        let hyps = extract_hypotheses(&set, &histogram);
        assert_eq!(hyps.len(), 1);
        assert_relative_eq!(hyps[0].mean.theta.abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn test_covariance_wrapped_heading() {
        let (set, histogram) = build_set(vec![
            Particle {
                pose: Pose2D::new(0.1, 0.1, PI - 0.1),
                weight: 0.5,
            },
            Particle {
                pose: Pose2D::new(0.1, 0.1, -PI + 0.1),
                weight: 0.5,
            },
        ]);
        let hyps = extract_hypotheses(&set, &histogram);
        // Residuals are ±0.1 through the wrap, not ±(π - 0.1).
        assert_relative_eq!(hyps[0].covariance.var_theta(), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_covariance_is_symmetric() {
        let (set, histogram) = build_set(vec![
            Particle {
                pose: Pose2D::new(0.0, 0.0, 0.0),
                weight: 0.25,
            },
            Particle {
                pose: Pose2D::new(0.3, 0.1, 0.05),
                weight: 0.25,
            },
            Particle {
                pose: Pose2D::new(0.1, 0.3, -0.05),
                weight: 0.25,
            },
            Particle {
                pose: Pose2D::new(0.2, 0.2, 0.1),
                weight: 0.25,
            },
        ]);
        let hyps = extract_hypotheses(&set, &histogram);
        let c = &hyps[0].covariance.data;
        assert_eq!(c[1], c[3]);
        assert_eq!(c[2], c[6]);
        assert_eq!(c[5], c[7]);
        assert!(c[0] >= 0.0 && c[4] >= 0.0 && c[8] >= 0.0);
    }

    #[test]
    fn test_empty_set() {
        let (set, histogram) = build_set(Vec::new());
        assert!(extract_hypotheses(&set, &histogram).is_empty());
    }
}
