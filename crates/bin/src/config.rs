//! Driver configuration.

use serde::{Deserialize, Serialize};
use spatial::{PoolConfig, TreeConfig, TreeSettings};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub tree: TreeSettings,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub sim: SwarmConfig,
}

impl SimConfig {
    /// Load configuration from `path`, writing the defaults there if the file is missing.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.tree.validate()?;
        Ok(config)
    }

    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            tree: self.tree.clone(),
            pool: self.pool.clone(),
        }
    }
}

/// Swarm and frame loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwarmConfig {
    /// Particles spawned at start.
    #[serde(default = "default_particles")]
    pub particles: usize,
    /// Frames to simulate.
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Side of the square spawn area, centred on the origin.
    #[serde(default = "default_world_size")]
    pub world_size: f64,
    /// Maximum per-frame velocity change.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Velocity damping factor (0.0 - 1.0).
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Particles stacked on one spot to exercise the coincidence path.
    #[serde(default = "default_cluster")]
    pub cluster: usize,
    /// Maximum per-frame velocity change for the stacked particles.
    #[serde(default = "default_cluster_jitter")]
    pub cluster_jitter: f64,
    /// Every this many frames one particle diverges to NaN (0 = never).
    #[serde(default = "default_diverge_every")]
    pub diverge_every: u32,
    /// Frames between progress reports.
    #[serde(default = "default_report_every")]
    pub report_every: u32,
    /// RNG seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            particles: default_particles(),
            frames: default_frames(),
            world_size: default_world_size(),
            jitter: default_jitter(),
            damping: default_damping(),
            cluster: default_cluster(),
            cluster_jitter: default_cluster_jitter(),
            diverge_every: default_diverge_every(),
            report_every: default_report_every(),
            seed: default_seed(),
        }
    }
}

fn default_particles() -> usize {
    5000
}
fn default_frames() -> u32 {
    300
}
fn default_world_size() -> f64 {
    2000.0
}
fn default_jitter() -> f64 {
    1.5
}
fn default_damping() -> f64 {
    0.95
}
fn default_cluster() -> usize {
    32
}
fn default_cluster_jitter() -> f64 {
    0.0005
}
fn default_diverge_every() -> u32 {
    100
}
fn default_report_every() -> u32 {
    50
}
fn default_seed() -> u64 {
    0x5eed
}
