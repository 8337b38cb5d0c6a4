//! KLD-adaptive particle filter core.
//!
//! The filter owns two fixed-capacity sample buffers and alternates
//! between them: every resample reads the current generation and writes
//! the next, then flips. Buffers are allocated once at construction at
//! `max_samples` capacity so the measurement/resample hot path never
//! allocates.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{AmclConfig, ConfigError};
use crate::core::types::{Covariance2D, Pose2D, RangeScan};
use crate::filter::histogram::PoseHistogram;
use crate::filter::motion_model::{sample_gaussian, MotionModel};
use crate::filter::sensor_model::RangeSensorModel;
use crate::map::{CellState, OccupancyMap};

/// Total weight below which the posterior is considered degenerate:
/// no particle explains the scan and normalizing would divide by
/// (near) zero.
const MIN_TOTAL_WEIGHT: f64 = 1e-300;

/// A single pose hypothesis sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Hypothesized pose in the map frame.
    pub pose: Pose2D,
    /// Unnormalized importance weight.
    pub weight: f64,
}

/// One generation of particles.
///
/// Capacity is fixed at construction; `push` past capacity is a logic
/// error upstream (the resample loop is bounded by `max_samples`).
#[derive(Debug, Clone)]
pub struct SampleSet {
    particles: Vec<Particle>,
}

impl SampleSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    /// Particles in this generation.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when the set holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.particles.iter().map(|p| p.weight).sum()
    }
}

/// Configuration for the particle filter core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFilterConfig {
    /// Lower bound on the resampled population. Typical: 100.
    pub min_samples: usize,
    /// Upper bound on the resampled population and the capacity of both
    /// sample buffers. Typical: 5000.
    pub max_samples: usize,
    /// KLD error bound ε. Smaller values keep more particles. Typical: 0.01.
    pub pop_err: f64,
    /// Upper standard normal quantile for the KLD bound. Typical: 3.0
    /// (99.87% confidence).
    pub pop_z: f64,
    /// Histogram bin size in x and y (m). Typical: 0.5.
    pub bin_size_xy: f64,
    /// Histogram bin size in θ (rad). Typical: 10°.
    pub bin_size_theta: f64,
    /// RNG seed; 0 seeds from the system clock.
    pub seed: u64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            min_samples: 100,
            max_samples: 5000,
            pop_err: 0.01,
            pop_z: 3.0,
            bin_size_xy: 0.5,
            bin_size_theta: 10.0_f64.to_radians(),
            seed: 0,
        }
    }
}

/// Filter diagnostics exposed alongside the estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleFilterState {
    /// Completed update cycles.
    pub cycles: u64,
    /// True when the last measurement update found no particle with
    /// non-negligible likelihood; the published estimate should not be
    /// trusted until the filter recovers.
    pub degenerate: bool,
    /// Population of the live generation after the last reseed or
    /// resample.
    pub sample_count: usize,
}

/// KLD-adaptive Monte Carlo localization filter.
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    motion_model: MotionModel,
    sensor_model: RangeSensorModel,
    sets: [SampleSet; 2],
    current: usize,
    histogram: PoseHistogram,
    cumulative: Vec<f64>,
    rng: StdRng,
    state: ParticleFilterState,
}

impl ParticleFilter {
    /// Build the filter from a validated configuration and seed the
    /// initial particle cloud from the configured Gaussian.
    ///
    /// Fails if the configuration is invalid; the filter refuses to
    /// start rather than run with out-of-range parameters.
    pub fn new(config: &AmclConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = if config.filter.seed == 0 {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5eed)
        } else {
            config.filter.seed
        };
        log::debug!("particle filter rng seed: {}", seed);

        let capacity = config.filter.max_samples;
        let mut filter = Self {
            config: config.filter,
            motion_model: MotionModel::new(config.motion),
            sensor_model: RangeSensorModel::new(config.sensor),
            sets: [
                SampleSet::with_capacity(capacity),
                SampleSet::with_capacity(capacity),
            ],
            current: 0,
            histogram: PoseHistogram::new(config.filter.bin_size_xy, config.filter.bin_size_theta),
            cumulative: Vec::with_capacity(capacity),
            rng: StdRng::seed_from_u64(seed),
            state: ParticleFilterState::default(),
        };
        filter.seed_gaussian(&config.initial_pose.mean(), &config.initial_pose.covariance());
        Ok(filter)
    }

    /// The live particle generation.
    pub fn current_set(&self) -> &SampleSet {
        &self.sets[self.current]
    }

    /// The pose histogram for the live generation.
    pub fn histogram(&self) -> &PoseHistogram {
        &self.histogram
    }

    /// Filter diagnostics.
    pub fn state(&self) -> &ParticleFilterState {
        &self.state
    }

    /// Replace the particle cloud with `max_samples` draws from a
    /// Gaussian (diagonal covariance) around `mean`.
    pub fn seed_gaussian(&mut self, mean: &Pose2D, covariance: &Covariance2D) {
        let n = self.config.max_samples;
        let sx = covariance.var_x().max(0.0).sqrt();
        let sy = covariance.var_y().max(0.0).sqrt();
        let st = covariance.var_theta().max(0.0).sqrt();
        let weight = 1.0 / n as f64;

        self.histogram.clear();
        let rng = &mut self.rng;
        let histogram = &mut self.histogram;
        let set = &mut self.sets[self.current];
        set.particles.clear();
        for _ in 0..n {
            let pose = Pose2D::new(
                mean.x + sample_gaussian(rng, sx),
                mean.y + sample_gaussian(rng, sy),
                mean.theta + sample_gaussian(rng, st),
            );
            histogram.insert(&pose);
            set.particles.push(Particle { pose, weight });
        }
        self.state.degenerate = false;
        self.state.sample_count = n;
    }

    /// Replace the particle cloud with `max_samples` poses drawn
    /// uniformly over the map's free cells, headings uniform in (-π, π].
    pub fn seed_uniform_free(&mut self, map: &OccupancyMap) {
        use std::f64::consts::PI;

        let n = self.config.max_samples;
        let weight = 1.0 / n as f64;
        let (width, height) = map.dimensions();
        let (origin_x, origin_y) = map.origin();
        let span_x = width as f64 * map.resolution();
        let span_y = height as f64 * map.resolution();
        let has_free = map.free_cell_count() > 0;
        if !has_free {
            log::warn!("global reinitialization on a map with no free cells");
        }

        self.histogram.clear();
        let rng = &mut self.rng;
        let histogram = &mut self.histogram;
        let set = &mut self.sets[self.current];
        set.particles.clear();
        while set.particles.len() < n {
            let x = origin_x + rng.gen::<f64>() * span_x;
            let y = origin_y + rng.gen::<f64>() * span_y;
            if has_free {
                match map.world_to_cell(x, y) {
                    Some((cx, cy)) if map.get_state(cx, cy) == CellState::Free => {}
                    _ => continue,
                }
            }
            let pose = Pose2D::new(x, y, rng.gen::<f64>() * 2.0 * PI - PI);
            histogram.insert(&pose);
            set.particles.push(Particle { pose, weight });
        }
        self.state.degenerate = false;
        self.state.sample_count = n;
    }

    #[cfg(test)]
    pub(crate) fn replace_particles(&mut self, particles: Vec<Particle>) {
        self.state.sample_count = particles.len();
        self.sets[self.current] = SampleSet { particles };
    }

    /// Predict step: apply a robot-frame odometry delta with sampled
    /// noise to every particle and reset weights to uniform.
    pub fn motion_update(&mut self, delta: &Pose2D) {
        let set = &mut self.sets[self.current];
        if set.particles.is_empty() {
            return;
        }
        let weight = 1.0 / set.particles.len() as f64;
        let motion = &self.motion_model;
        let rng = &mut self.rng;
        for particle in &mut set.particles {
            particle.pose = motion.sample(&particle.pose, delta, rng);
            particle.weight = weight;
        }
    }

    /// Measurement step: scale every weight by the scan likelihood.
    ///
    /// Returns true when the posterior degenerated (total weight
    /// effectively zero); weights are then reset to uniform so the
    /// filter keeps running on the motion prior.
    pub fn sensor_update(&mut self, scan: &RangeScan, map: &OccupancyMap) -> bool {
        let sensor = &self.sensor_model;
        let set = &mut self.sets[self.current];
        let mut total = 0.0;
        for particle in &mut set.particles {
            particle.weight *= sensor.likelihood(scan, &particle.pose, map);
            total += particle.weight;
        }

        if total <= MIN_TOTAL_WEIGHT {
            log::warn!(
                "degenerate particle weights (total {:e}), falling back to uniform",
                total
            );
            let uniform = 1.0 / set.particles.len().max(1) as f64;
            for particle in &mut set.particles {
                particle.weight = uniform;
            }
            self.state.degenerate = true;
        } else {
            self.state.degenerate = false;
        }
        self.state.degenerate
    }

    /// Resample the next generation with a KLD-adaptive draw, then flip
    /// generations.
    ///
    /// Each sample inverts the cumulative weight distribution with an
    /// independent uniform (binary search), so a particle's survival
    /// probability is its normalized weight for any stop count. Drawing
    /// stops once the population reaches the KLD target for the number
    /// of occupied histogram buckets, clamped to
    /// [min_samples, max_samples]. The new generation leaves with
    /// uniform, normalized weights.
    pub fn resample(&mut self) {
        let source_len = self.sets[self.current].len();
        if source_len == 0 {
            return;
        }

        let total = self.sets[self.current].total_weight();
        self.cumulative.clear();
        if total <= MIN_TOTAL_WEIGHT {
            for i in 0..source_len {
                self.cumulative.push((i + 1) as f64 / source_len as f64);
            }
        } else {
            let mut acc = 0.0;
            for particle in &self.sets[self.current].particles {
                acc += particle.weight / total;
                self.cumulative.push(acc);
            }
        }

        let min_samples = self.config.min_samples;
        let max_samples = self.config.max_samples;
        let pop_err = self.config.pop_err;
        let pop_z = self.config.pop_z;

        self.histogram.clear();
        let (head, tail) = self.sets.split_at_mut(1);
        let (source, next) = if self.current == 0 {
            (&head[0], &mut tail[0])
        } else {
            (&tail[0], &mut head[0])
        };
        next.particles.clear();

        loop {
            let position = self.rng.gen::<f64>();
            let index = self
                .cumulative
                .partition_point(|&c| c < position)
                .min(source_len - 1);
            let pose = source.particles[index].pose;
            self.histogram.insert(&pose);
            next.particles.push(Particle { pose, weight: 0.0 });

            let buckets = self.histogram.bucket_count();
            let target = if buckets <= 1 {
                min_samples
            } else {
                kld_sample_target(buckets, pop_err, pop_z)
            };
            if next.particles.len() >= target.max(min_samples).min(max_samples) {
                break;
            }
        }

        let weight = 1.0 / next.particles.len() as f64;
        for particle in &mut next.particles {
            particle.weight = weight;
        }

        self.state.sample_count = next.particles.len();
        self.current = 1 - self.current;
        self.state.cycles += 1;
    }
}

/// KLD bound on the sample count needed to keep the discretized
/// posterior error below ε with the configured confidence, given
/// `buckets` occupied histogram bins.
fn kld_sample_target(buckets: usize, pop_err: f64, pop_z: f64) -> usize {
    debug_assert!(buckets > 1);
    let k = (buckets - 1) as f64;
    let a = 2.0 / (9.0 * k);
    let b = 1.0 - a + a.sqrt() * pop_z;
    let n = k / (2.0 * pop_err) * b * b * b;
    if !n.is_finite() || n < 1.0 {
        1
    } else {
        n.ceil() as usize
    }
}
