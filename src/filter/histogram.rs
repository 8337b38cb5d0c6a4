//! Coarse pose-space histogram for adaptive sizing and clustering.
//!
//! Poses are bucketed on a fixed (x, y, θ) lattice. The occupied-bucket
//! count drives the KLD sample target during resampling, and buckets
//! that touch (within one bin step on each axis, with θ wrapping) are
//! merged into connected components that become the pose hypotheses.

use std::collections::HashMap;

use crate::core::types::Pose2D;
use std::f64::consts::PI;

/// Sparse 3D histogram over (x, y, θ) with union-find bucket merging.
#[derive(Debug, Clone)]
pub struct PoseHistogram {
    bin_size_xy: f64,
    bin_size_theta: f64,
    theta_bins: i64,
    buckets: HashMap<(i64, i64, i64), usize>,
    parent: Vec<usize>,
}

impl PoseHistogram {
    /// Create an empty histogram with the given bin sizes (m, rad).
    pub fn new(bin_size_xy: f64, bin_size_theta: f64) -> Self {
        let theta_bins = ((2.0 * PI / bin_size_theta).ceil() as i64).max(1);
        Self {
            bin_size_xy,
            bin_size_theta,
            theta_bins,
            buckets: HashMap::new(),
            parent: Vec::new(),
        }
    }

    fn key(&self, pose: &Pose2D) -> (i64, i64, i64) {
        let ix = (pose.x / self.bin_size_xy).floor() as i64;
        let iy = (pose.y / self.bin_size_xy).floor() as i64;
        // θ is already in (-π, π]; shift to [0, 2π) before bucketing so
        // indices are contiguous and wrap cleanly.
        let it = (((pose.theta + PI) / self.bin_size_theta).floor() as i64)
            .rem_euclid(self.theta_bins);
        (ix, iy, it)
    }

    /// Register a pose, creating its bucket if needed and merging it
    /// with any occupied neighbor bucket.
    pub fn insert(&mut self, pose: &Pose2D) {
        let key = self.key(pose);
        if self.buckets.contains_key(&key) {
            return;
        }
        let id = self.parent.len();
        self.parent.push(id);
        self.buckets.insert(key, id);

        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dt in -1..=1i64 {
                    if dx == 0 && dy == 0 && dt == 0 {
                        continue;
                    }
                    let neighbor = (
                        key.0 + dx,
                        key.1 + dy,
                        (key.2 + dt).rem_euclid(self.theta_bins),
                    );
                    if let Some(&other) = self.buckets.get(&neighbor) {
                        self.union(id, other);
                    }
                }
            }
        }
    }

    /// Number of occupied buckets (the KLD support count `k`).
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Cluster id for a pose, or `None` if its bucket was never inserted.
    pub fn cluster_of(&self, pose: &Pose2D) -> Option<usize> {
        self.buckets.get(&self.key(pose)).map(|&id| self.root(id))
    }

    /// Drop all buckets.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.parent.clear();
    }

    fn root(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Lower id wins the root so cluster ids are stable across
            // insertion order permutations of the same bucket set.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
