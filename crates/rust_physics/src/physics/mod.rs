//! Physics module for collision detection, response and queries
//!
//! Components live in a [`ComponentRegistry`] backed by a spatial index.
//! The [`SimulationStepper`] moves them and resolves contacts, the raycast
//! engine answers line-of-sight queries, and [`PhysicsWorld`] ties it all
//! together behind one facade.

pub mod collision;
pub mod component;
pub mod error;
pub mod interactivity;
pub mod narrow_phase;
pub mod raycast;
pub mod registry;
pub mod stepper;
pub mod world;

#[cfg(test)]
mod tests;

pub use collision::{BoundingSphere, CollisionShape, OrientedBox, Ray, Triangle};
pub use component::{ComponentHandle, ComponentId, OwnerRef, PhysicsComponent};
pub use error::{PhysicsError, PhysicsResult};
pub use interactivity::Interactivity;
pub use narrow_phase::{AabbNarrowPhase, Contact, ExactNarrowPhase, NarrowPhase, RayIntersection};
pub use raycast::{RayHit, RayPath};
pub use registry::{CommandFailure, CommandQueue, ComponentRegistry, PendingCommand};
pub use stepper::{CollisionPair, ContactRecord, EventKind, EventPhase, PhysicsEvent, SimulationStepper, StepStats};
pub use world::{create_world, AabbPhysicsWorld, ExactPhysicsWorld, PhysicsWorld, StandardPhysicsWorld, UpdateReport};
