//! Spatial partitioning data structures
//!
//! Provides efficient spatial indexing for the broad phase and
//! ray casting in 3D space.

mod aabb;
mod grid;
mod octree;
pub mod spatial_query;

pub use aabb::AABB;
pub use grid::{GridConfig, UniformGrid};
pub use octree::{Octree, OctreeConfig, OctreeEntry, OctreeNode};
pub use spatial_query::{create_spatial_index, GridSpatialQuery, OctreeSpatialQuery, SpatialIndex};
