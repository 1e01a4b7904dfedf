//! Collision geometry
//!
//! Shapes are stored in model space on each component and transformed to
//! world space only while a test runs, keeping shape geometry decoupled from
//! the component's transform.
//!
//! # Module Organization
//!
//! - [`primitives`] - Basic geometric primitives (rays, spheres, boxes, triangles)
//! - [`mesh`] - Mesh-based collision geometry
//! - [`shape`] - Component-level collision shapes
//!
//! # Key Types
//!
//! - [`CollisionShape`] - Model-space shape attached to a component
//! - [`WorldSpaceShape`] - Temporary world-space shape for collision testing
//! - [`Ray`], [`BoundingSphere`], [`OrientedBox`], [`Triangle`] - Primitive geometric types

pub mod primitives;
pub mod mesh;
pub mod shape;

pub use primitives::{BoundingSphere, OrientedBox, Ray, Triangle};
pub use mesh::{CollisionMeshTemplate, WorldSpaceCollisionMesh};
pub use shape::{CollisionShape, WorldSpaceShape};
