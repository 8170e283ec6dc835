//! Headless demo: a moon, a train circling it and a player standing on it.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Quat, Vec3};
use gravwell::{
    init_logging, AttractingBody, BodyId, CachePolicy, EntityId, IntentManager, ManualClock,
    MovementIntent, MovingEntity, PhysicsConfig, PhysicsManager, RotationBlend, TriangleMesh,
};
use log::info;

/// Gravity-well physics demo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u32,
    /// JSON physics configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Use the round-robin raycast schedule instead of a fixed TTL
    #[arg(long)]
    scheduled: bool,
}

const TRAIN: EntityId = EntityId(1);
const PLAYER: EntityId = EntityId(2);
const ROCK: EntityId = EntityId(3);

fn load_config(args: &Args) -> Result<PhysicsConfig> {
    let mut config = match &args.config {
        Some(path) => PhysicsConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PhysicsConfig::default(),
    };
    if args.scheduled {
        config.cache = CachePolicy::scheduled();
    }
    Ok(config)
}

fn build_scene() -> Result<(Vec<AttractingBody>, Vec<MovingEntity>, IntentManager)> {
    let mesh = TriangleMesh::uv_sphere(1.0, 48, 24).context("building moon mesh")?;
    let moon = AttractingBody::with_mesh(BodyId(1), Vec3::ZERO, 100.0, 10.0, Arc::new(mesh));

    let entities = vec![
        MovingEntity::new(TRAIN, Vec3::new(0.0, 14.0, 0.0), 5.0),
        MovingEntity::new(PLAYER, Vec3::new(0.0, 12.5, 4.0), 1.0),
        MovingEntity::new(ROCK, Vec3::new(0.0, 60.0, 0.0), 2.0),
    ];

    let mut intents = IntentManager::new();
    intents.set_base(TRAIN, MovementIntent::new(Vec3::X, 8.0, Quat::IDENTITY));
    intents.set_base(PLAYER, MovementIntent::IDLE);
    Ok((vec![moon], entities, intents))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let delta = config.tick_rate_hz.recip();
    let (bodies, mut entities, intents) = build_scene()?;
    let clock = ManualClock::default();
    let mut physics = PhysicsManager::new(config, bodies)
        .context("creating physics manager")?
        .with_clock(Box::new(clock.clone()));

    for tick in 1..=args.ticks {
        let corrected = physics.step(&entities, intents.base_intents());
        for entity in &mut entities {
            if let Some(intent) = corrected.get(&entity.id) {
                intent.apply_to(entity, delta, RotationBlend::Slerp(0.2));
            }
        }
        clock.advance(Duration::from_secs_f32(delta));

        if tick % 60 == 0 {
            for entity in &entities {
                info!(
                    "tick {tick}: {} at {:.2?} (altitude {:.2}) moving {:?}",
                    entity.id,
                    entity.position,
                    entity.position.length() - 10.0,
                    physics.locomotion(entity.id)
                );
            }
        }
    }

    let stats = physics.raycast_stats();
    info!(
        "raycasts: {} true, {} cached, {} fallback, hit rate {:.1}%, mean {:?}",
        stats.true_raycasts,
        stats.cache_hits,
        stats.fallbacks,
        stats.hit_rate() * 100.0,
        stats.average_raycast_time()
    );
    Ok(())
}
