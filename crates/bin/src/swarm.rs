//! Jittering particle swarm fed to the quadtree each frame.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial::Point;

use crate::config::SwarmConfig;

/// A moving point.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
}

impl Point for Particle {
    #[inline]
    fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    fn y(&self) -> f64 {
        self.position.y
    }
}

/// All particles plus the RNG driving them.
pub struct Swarm {
    particles: Vec<Particle>,
    rng: StdRng,
    /// Particles from this index on belong to the stacked cluster.
    cluster_start: usize,
    jitter: f64,
    cluster_jitter: f64,
    damping: f64,
}

impl Swarm {
    /// Spawn `config.particles` particles uniformly over the world, then
    /// stack `config.cluster` more on the origin.
    pub fn spawn(config: &SwarmConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let half = config.world_size / 2.0;
        let mut particles = Vec::with_capacity(config.particles + config.cluster);

        for _ in 0..config.particles {
            let position = if half > 0.0 {
                DVec2::new(rng.random_range(-half..half), rng.random_range(-half..half))
            } else {
                DVec2::ZERO
            };
            particles.push(Particle {
                position,
                velocity: DVec2::ZERO,
            });
        }
        particles.extend((0..config.cluster).map(|_| Particle {
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
        }));

        Self {
            particles,
            rng,
            cluster_start: config.particles,
            jitter: config.jitter,
            cluster_jitter: config.cluster_jitter,
            damping: config.damping,
        }
    }

    /// Advance every particle one frame. The cluster gets the smaller
    /// `cluster_jitter` kick, so it stays coincident for a while before
    /// drifting apart.
    pub fn step(&mut self) {
        for (index, particle) in self.particles.iter_mut().enumerate() {
            let jitter = if index >= self.cluster_start {
                self.cluster_jitter
            } else {
                self.jitter
            };
            let kick = if jitter > 0.0 {
                DVec2::new(
                    self.rng.random_range(-jitter..jitter),
                    self.rng.random_range(-jitter..jitter),
                )
            } else {
                DVec2::ZERO
            };
            particle.velocity = particle.velocity * self.damping + kick;
            particle.position += particle.velocity;
        }
    }

    /// Blow up a random particle, the way an unstable integrator would.
    /// Returns its index.
    pub fn diverge_one(&mut self) -> Option<usize> {
        if self.particles.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.particles.len());
        let particle = &mut self.particles[index];
        particle.position = DVec2::new(f64::NAN, particle.position.y);
        particle.velocity = DVec2::ZERO;
        Some(index)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}
