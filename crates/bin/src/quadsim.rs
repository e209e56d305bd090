//! Quadsim - rebuilds a quadtree over a jittering particle swarm every frame.
//!
//! Usage: `quadsim [config.toml]` (defaults to `quadsim.toml`).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use spatial::TreeBuilder;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod swarm;

use config::SimConfig;
use swarm::Swarm;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spatial=error")),
        )
        .init();

    info!("Quadsim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quadsim.toml"));
    let config = SimConfig::load(&path)?;
    info!("Loaded configuration from {}", path.display());
    info!("  Particles: {} (+{} stacked)", config.sim.particles, config.sim.cluster);
    info!("  Frames: {}", config.sim.frames);
    info!("  Coincidence tolerance: {}", config.tree.coincidence_tolerance);

    run(&config);
    Ok(())
}

fn run(config: &SimConfig) {
    let mut swarm = Swarm::spawn(&config.sim);
    let mut builder = TreeBuilder::new(config.tree_config());
    builder.pool_mut().reserve(2 * swarm.particles().len());

    let mut tree = builder.build(swarm.particles());
    let mut build_time = Duration::ZERO;

    for frame in 1..=config.sim.frames {
        swarm.step();
        if config.sim.diverge_every > 0 && frame % config.sim.diverge_every == 0 {
            if let Some(index) = swarm.diverge_one() {
                warn!(frame, index, "Particle diverged");
            }
        }

        let started = Instant::now();
        tree = builder.rebuild(tree, swarm.particles());
        build_time += started.elapsed();

        if config.sim.report_every > 0 && frame % config.sim.report_every == 0 {
            let stats = builder.pool().stats();
            info!(
                frame,
                nodes = tree.node_count(),
                depth = tree.depth(),
                rejected = tree.rejected().len(),
                side = tree.bounds().width(),
                reused = stats.reused,
                allocated = stats.allocated,
                "Frame"
            );
        }
        debug!(frame, tree = ?tree, "Rebuilt");
    }

    let stats = builder.pool().stats();
    let frames = config.sim.frames.max(1);
    info!(
        frames = config.sim.frames,
        avg_build_us = build_time.as_micros() as u64 / frames as u64,
        reused = stats.reused,
        allocated = stats.allocated,
        dropped = stats.dropped,
        "Done"
    );
    builder.dispose(tree);
}
