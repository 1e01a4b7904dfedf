//! Debug visualization
//!
//! Read-only consumers of physics state that emit debug draw primitives.

pub mod draw;
pub mod collision_debug;

pub use draw::{DebugDrawList, DebugRenderer, DebugShape};
pub use collision_debug::{CollisionDebugColors, CollisionDebugVisualizer};
