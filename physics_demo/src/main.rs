//! Headless Physics Demo
//!
//! Runs an asteroid-field style scene without a window:
//! - Static arena floor and a mesh ramp
//! - Ships and rocks with random velocities bouncing around
//! - A trigger zone reporting who flies through it
//! - A turret raycasting every frame
//! - Late spawns queued from a worker thread
//!
//! Usage: `physics_demo [config.toml|config.ron]`

use std::thread;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_physics::debug::DebugDrawList;
use rust_physics::physics::CommandQueue;
use rust_physics::prelude::*;

// Simulation settings
const FRAME_DT: f32 = 1.0 / 60.0;
const NUM_FRAMES: u32 = 600;
const ARENA_HALF_SIZE: f32 = 40.0;

// Entity counts
const NUM_SHIPS: usize = 24;
const NUM_ROCKS: usize = 8;
const NUM_LATE_SPAWNS: usize = 6;

// Movement speeds
const SHIP_SPEED: f32 = 8.0;
const ROCK_SPEED: f32 = 3.0;

/// Errors that abort the demo
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),
}

/// Running totals printed at the end
#[derive(Debug, Default)]
struct DemoStats {
    contacts_entered: usize,
    triggers_entered: usize,
    triggers_exited: usize,
    turret_hits: usize,
}

fn load_config() -> Result<PhysicsConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading physics config from {path}");
            Ok(PhysicsConfig::load_from_file(&path)?)
        }
        None => Ok(PhysicsConfig::default()),
    }
}

fn random_velocity(rng: &mut StdRng, speed: f32) -> Vec3 {
    Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(0.0..0.5), rng.gen_range(-1.0..1.0)) * speed
}

fn random_position(rng: &mut StdRng) -> Vec3 {
    let reach = ARENA_HALF_SIZE * 0.8;
    Vec3::new(rng.gen_range(-reach..reach), rng.gen_range(2.0..12.0), rng.gen_range(-reach..reach))
}

fn build_arena(world: &mut dyn PhysicsWorld) -> Result<ComponentId, DemoError> {
    let floor = PhysicsComponent::new(
        CollisionShape::cuboid(Vec3::new(ARENA_HALF_SIZE, 1.0, ARENA_HALF_SIZE)),
        Interactivity::STATIC,
    )
    .with_transform(Transform::from_position(Vec3::new(0.0, -1.0, 0.0)))
    .with_owner(OwnerRef(0));
    world.register_component(floor)?;

    // Two-triangle ramp rising towards +x
    let vertices = [
        Vec3::new(-5.0, 0.0, -5.0),
        Vec3::new(5.0, 4.0, -5.0),
        Vec3::new(5.0, 4.0, 5.0),
        Vec3::new(-5.0, 0.0, 5.0),
    ];
    let ramp = PhysicsComponent::new(CollisionShape::mesh_from_model(&vertices, &[0, 1, 2, 0, 2, 3]), Interactivity::STATIC)
        .with_transform(Transform::from_position(Vec3::new(15.0, 0.0, 0.0)))
        .with_owner(OwnerRef(1));
    world.register_component(ramp)?;

    let gate = PhysicsComponent::new(CollisionShape::sphere(6.0), Interactivity::TRIGGER)
        .with_transform(Transform::from_position(Vec3::new(0.0, 4.0, 0.0)))
        .with_owner(OwnerRef(2));
    let gate_id = gate.id;
    world.register_component(gate)?;
    Ok(gate_id)
}

fn spawn_fleet(world: &mut dyn PhysicsWorld, rng: &mut StdRng) -> Result<(), DemoError> {
    for i in 0..NUM_SHIPS {
        let ship = PhysicsComponent::dynamic_sphere(random_position(rng), 0.8)
            .with_velocity(random_velocity(rng, SHIP_SPEED))
            .with_restitution(0.6)
            .with_owner(OwnerRef(100 + i as u64));
        world.register_component(ship)?;
    }

    for i in 0..NUM_ROCKS {
        let half = rng.gen_range(0.8..2.0);
        let rock = PhysicsComponent::new(CollisionShape::cuboid(Vec3::new(half, half * 0.7, half)), Interactivity::DYNAMIC)
            .with_transform(Transform::from_position(random_position(rng)))
            .with_velocity(random_velocity(rng, ROCK_SPEED))
            .with_angular_velocity(Vec3::new(0.0, rng.gen_range(-2.0..2.0), 0.0))
            .with_mass(half * 4.0)
            .with_restitution(0.2)
            .with_owner(OwnerRef(200 + i as u64));
        world.register_component(rock)?;
    }
    Ok(())
}

/// Queue extra ships from another thread; they appear at the next frame boundary
fn queue_late_spawns(queue: CommandQueue, seed: u64) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(seed);
        for i in 0..NUM_LATE_SPAWNS {
            let ship = PhysicsComponent::dynamic_sphere(random_position(&mut rng), 0.6)
                .with_velocity(random_velocity(&mut rng, SHIP_SPEED))
                .with_owner(OwnerRef(300 + i as u64));
            queue.register(ship);
        }
    })
}

fn record_events(world: &mut dyn PhysicsWorld, gate: ComponentId, stats: &mut DemoStats) {
    for event in world.drain_events() {
        match (event.kind, event.phase) {
            (EventKind::Contact, EventPhase::Entered) => stats.contacts_entered += 1,
            (EventKind::Trigger, EventPhase::Entered) if event.a == gate || event.b == gate => {
                stats.triggers_entered += 1;
                debug!("{} entered the gate", if event.a == gate { event.b } else { event.a });
            }
            (EventKind::Trigger, EventPhase::Exited) => stats.triggers_exited += 1,
            _ => {}
        }
    }
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut world = create_world(&config);
    let mut rng = StdRng::seed_from_u64(7);

    let gate = build_arena(world.as_mut())?;
    spawn_fleet(world.as_mut(), &mut rng)?;
    let spawner = queue_late_spawns(world.command_queue(), 11);

    let turret = Vec3::new(-ARENA_HALF_SIZE, 3.0, 0.0);
    let mut stats = DemoStats::default();

    for frame in 0..NUM_FRAMES {
        let report = world.update(FRAME_DT);
        for failure in &report.command_failures {
            warn!("Frame {frame}: queued {} failed: {}", failure.command, failure.error);
        }
        record_events(world.as_mut(), gate, &mut stats);

        // Turret sweeps across the arena, ignoring the gate volume
        let angle = frame as f32 * 0.02;
        let aim = Vec3::new(angle.cos(), -0.05, angle.sin());
        let hit = world.raycast_ignoring(turret, aim, ARENA_HALF_SIZE * 2.0, Interactivity::ALL, &[gate])?;
        if hit.hit {
            stats.turret_hits += 1;
        }

        if frame % 60 == 0 {
            info!(
                "Frame {frame}: {} components, {} candidate pairs, {} contacts, {} triggers",
                world.registry().len(),
                report.stats.candidate_pairs,
                report.stats.contacts,
                report.stats.triggers
            );
        }
    }

    if spawner.join().is_err() {
        warn!("Spawner thread panicked");
    }

    world.set_debug_enabled(true);
    world.raycast(turret, Vec3::x(), ARENA_HALF_SIZE * 2.0, Interactivity::DYNAMIC | Interactivity::STATIC)?;
    let mut draw_list = DebugDrawList::new();
    world.draw(&mut draw_list);
    info!(
        "Debug frame: {} lines, {} spheres, {} boxes, {} points",
        draw_list.count("line"),
        draw_list.count("sphere"),
        draw_list.count("box"),
        draw_list.count("point")
    );

    info!("Final stats: {stats:?}");
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("=== Headless Physics Demo ===");
    println!("Simulating {NUM_FRAMES} frames at {:.0} Hz", 1.0 / FRAME_DT);
    println!();

    if let Err(error) = run() {
        eprintln!("Demo failed: {error}");
        std::process::exit(1);
    }
}
