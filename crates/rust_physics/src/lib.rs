//! # Rust Physics
//!
//! Gameplay-level rigid physics for a 3D game: components with collision
//! shapes, a spatial index for broad-phase culling, a fixed-step simulation
//! with impulse-based contact resolution, raycasts and debug drawing.
//!
//! ## Features
//!
//! - **Spatial Index**: loose octree or uniform grid, chosen by configuration
//! - **Narrow Phase**: exact sphere / box / mesh tests or cheap AABB tests
//! - **Simulation**: semi-implicit Euler, impulses, positional correction
//! - **Events**: entered / stay / exited notifications for contacts and triggers
//! - **Raycasts**: nearest or all hits with interactivity filters
//! - **Debug Drawing**: shapes, bounds, index nodes, contacts and rays
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_physics::prelude::*;
//!
//! let mut world = create_world(&PhysicsConfig::default().with_gravity(Vec3::zeros()));
//! world
//!     .register_component(PhysicsComponent::static_sphere(Vec3::zeros(), 1.0))
//!     .unwrap();
//!
//! world.update(1.0 / 60.0);
//!
//! let hit = world
//!     .raycast(Vec3::new(0.0, 0.0, -10.0), Vec3::z(), 100.0, Interactivity::ALL)
//!     .unwrap();
//! assert!(hit.hit);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for physics users
pub mod prelude {
    pub use crate::{
        config::{BroadPhaseKind, Config, ConfigError, NarrowPhaseKind, PhysicsConfig},
        debug::{DebugDrawList, DebugRenderer, DebugShape},
        foundation::math::{Quat, Transform, Vec3, Vec4},
        physics::{
            create_world, CollisionShape, ComponentHandle, ComponentId, EventKind, EventPhase, Interactivity,
            OwnerRef, PhysicsComponent, PhysicsError, PhysicsEvent, PhysicsResult, PhysicsWorld, RayHit,
        },
        spatial::AABB,
    };
}
