//! High-level collision shape abstractions
//!
//! Shapes are stored in model space on the component and transformed to
//! world space on demand during collision and ray tests.

use crate::foundation::math::{Transform, Vec3};
use crate::spatial::AABB;
use super::mesh::{CollisionMeshTemplate, WorldSpaceCollisionMesh};
use super::primitives::{BoundingSphere, OrientedBox, Ray};

/// Collision shape types (stored in MODEL SPACE)
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Sphere around the transform position; radius scales with the largest scale axis
    Sphere {
        /// Model-space radius
        radius: f32,
    },
    /// Box oriented with the transform; half extents scale per axis
    Cuboid {
        /// Model-space half size on each axis
        half_extents: Vec3,
    },
    /// A triangle mesh collision shape template (model space, transformed on-demand)
    Mesh(CollisionMeshTemplate),
}

impl CollisionShape {
    /// Creates a spherical collision shape with given radius
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Creates a box collision shape with given half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    /// Creates a mesh collision shape from MODEL SPACE vertices and indices
    pub fn mesh_from_model(vertices: &[Vec3], indices: &[u32]) -> Self {
        Self::Mesh(CollisionMeshTemplate::from_vertices(vertices, indices))
    }

    /// Get the bounding radius in model space
    pub fn local_bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Cuboid { half_extents } => half_extents.magnitude(),
            Self::Mesh(template) => template.local_bounding_radius,
        }
    }

    /// True when every dimension is finite and strictly positive
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Sphere { radius } => radius.is_finite() && *radius > 0.0,
            Self::Cuboid { half_extents } => half_extents.iter().all(|h| h.is_finite() && *h > 0.0),
            Self::Mesh(template) => template.is_valid(),
        }
    }

    /// Short name used in logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Cuboid { .. } => "cuboid",
            Self::Mesh(_) => "mesh",
        }
    }

    /// Transform this shape to world space
    /// Returns a temporary WorldSpaceShape for collision testing
    pub fn to_world_space(&self, transform: &Transform) -> WorldSpaceShape {
        match self {
            Self::Sphere { radius } => {
                WorldSpaceShape::Sphere(BoundingSphere::new(transform.position, radius * transform.max_scale()))
            }
            Self::Cuboid { half_extents } => {
                let axes = [
                    transform.rotate_vector(Vec3::x()),
                    transform.rotate_vector(Vec3::y()),
                    transform.rotate_vector(Vec3::z()),
                ];
                let scaled = half_extents.component_mul(&transform.scale.abs());
                WorldSpaceShape::Cuboid(OrientedBox::new(transform.position, axes, scaled))
            }
            Self::Mesh(template) => WorldSpaceShape::Mesh(template.to_world_space(transform)),
        }
    }
}

/// World-space collision shape (temporary, for testing only)
#[derive(Debug, Clone)]
pub enum WorldSpaceShape {
    /// World-space sphere
    Sphere(BoundingSphere),
    /// World-space oriented box
    Cuboid(OrientedBox),
    /// World-space mesh
    Mesh(WorldSpaceCollisionMesh),
}

impl WorldSpaceShape {
    /// Get center position
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Sphere(sphere) => sphere.center,
            Self::Cuboid(cuboid) => cuboid.center,
            Self::Mesh(mesh) => mesh.center,
        }
    }

    /// Axis-aligned world bounds
    pub fn aabb(&self) -> AABB {
        match self {
            Self::Sphere(sphere) => sphere.aabb(),
            Self::Cuboid(cuboid) => cuboid.aabb(),
            Self::Mesh(mesh) => mesh.aabb,
        }
    }

    /// Get bounding sphere
    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            Self::Sphere(sphere) => *sphere,
            Self::Cuboid(cuboid) => BoundingSphere::new(cuboid.center, cuboid.half_extents.magnitude()),
            Self::Mesh(mesh) => mesh.bounding_sphere(),
        }
    }

    /// Test ray intersection with this collision shape
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        match self {
            Self::Sphere(sphere) => sphere.intersect_ray(ray),
            Self::Cuboid(cuboid) => cuboid.intersect_ray(ray),
            Self::Mesh(mesh) => mesh.intersect_ray(ray),
        }
    }
}
