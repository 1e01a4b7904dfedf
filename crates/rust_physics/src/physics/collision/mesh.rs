//! Collision mesh representations
//!
//! Provides mesh-based collision shapes with model-space templates
//! and world-space transformations for testing.

use crate::foundation::math::{Transform, Vec3};
use crate::spatial::AABB;
use super::primitives::{BoundingSphere, Ray, Triangle};

/// A collision mesh template stored in MODEL SPACE (local coordinates)
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMeshTemplate {
    /// Triangles in MODEL SPACE (local coordinates, never modified)
    pub local_triangles: Vec<Triangle>,
    /// Local bounding sphere radius (model space, around the local origin)
    pub local_bounding_radius: f32,
}

impl CollisionMeshTemplate {
    /// Creates a new collision mesh template from MODEL SPACE vertices and indices
    ///
    /// Index triples referencing missing vertices are dropped.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32]) -> Self {
        let triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .filter_map(|chunk| {
                let v0 = vertices.get(chunk[0] as usize)?;
                let v1 = vertices.get(chunk[1] as usize)?;
                let v2 = vertices.get(chunk[2] as usize)?;
                Some(Triangle::new(*v0, *v1, *v2))
            })
            .collect();

        // Furthest vertex from the local origin
        let max_distance_sq = triangles
            .iter()
            .flat_map(|tri| [tri.v0, tri.v1, tri.v2])
            .map(|v| v.magnitude_squared())
            .fold(0.0f32, f32::max);

        Self {
            local_triangles: triangles,
            local_bounding_radius: max_distance_sq.sqrt(),
        }
    }

    /// True when the mesh has at least one triangle and only finite vertices
    pub fn is_valid(&self) -> bool {
        !self.local_triangles.is_empty()
            && self.local_bounding_radius.is_finite()
            && self.local_bounding_radius > 0.0
            && self
                .local_triangles
                .iter()
                .flat_map(|t| [t.v0, t.v1, t.v2])
                .all(|v| v.iter().all(|c| c.is_finite()))
    }

    /// Transform this template to world space
    pub fn to_world_space(&self, transform: &Transform) -> WorldSpaceCollisionMesh {
        let triangles: Vec<Triangle> = self
            .local_triangles
            .iter()
            .map(|tri| {
                Triangle::new(
                    transform.transform_point(tri.v0),
                    transform.transform_point(tri.v1),
                    transform.transform_point(tri.v2),
                )
            })
            .collect();

        let aabb = AABB::from_points(triangles.iter().flat_map(|t| [&t.v0, &t.v1, &t.v2]));

        WorldSpaceCollisionMesh {
            triangles,
            center: transform.position,
            bounding_radius: self.local_bounding_radius * transform.max_scale(),
            aabb,
        }
    }
}

/// World-space collision mesh (temporary, created on-demand for collision tests)
#[derive(Debug, Clone)]
pub struct WorldSpaceCollisionMesh {
    /// Triangles in world space
    pub triangles: Vec<Triangle>,
    /// Center position in world space
    pub center: Vec3,
    /// Bounding sphere radius in world space
    pub bounding_radius: f32,
    /// Tight world-space bounds of the triangles
    pub aabb: AABB,
}

impl WorldSpaceCollisionMesh {
    /// Bounding sphere around the mesh origin
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.bounding_radius)
    }

    /// Test ray intersection against all triangles in the mesh
    /// Returns closest hit (t, hit_point, normal) if any triangle is hit
    ///
    /// The normal faces the ray origin regardless of winding.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        if self.aabb.intersect_ray(ray.origin, ray.direction).is_none() {
            return None;
        }

        let (t, triangle) = self
            .triangles
            .iter()
            .filter_map(|tri| tri.intersect_ray(ray).map(|(t, _, _)| (t, tri)))
            .min_by(|a, b| a.0.total_cmp(&b.0))?;

        let mut normal = triangle.normal();
        if normal.dot(&ray.direction) > 0.0 {
            normal = -normal;
        }
        Some((t, ray.point_at(t), normal))
    }

    /// Test sphere intersection against the mesh
    ///
    /// Returns `(closest_point, normal, depth)` for the triangle closest to the
    /// sphere center; the normal points from the mesh surface towards the center.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<(Vec3, Vec3, f32)> {
        if !self.bounding_sphere().intersects(sphere) {
            return None;
        }

        let (closest, triangle, dist_sq) = self
            .triangles
            .iter()
            .filter(|tri| !tri.is_degenerate())
            .map(|tri| {
                let closest = tri.closest_point(sphere.center);
                (closest, tri, (closest - sphere.center).magnitude_squared())
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))?;

        if dist_sq > sphere.radius * sphere.radius {
            return None;
        }

        let distance = dist_sq.sqrt();
        let normal = if distance > 1e-6 {
            (sphere.center - closest) / distance
        } else {
            // Center lies on the surface: push out along the face normal
            let n = triangle.normal();
            if n.dot(&(sphere.center - self.center)) < 0.0 { -n } else { n }
        };
        Some((closest, normal, sphere.radius - distance))
    }

    /// Test mesh-mesh intersection
    pub fn intersects_mesh(&self, other: &WorldSpaceCollisionMesh) -> bool {
        if !self.bounding_sphere().intersects(&other.bounding_sphere()) || !self.aabb.intersects(&other.aabb) {
            return false;
        }

        self.triangles.iter().any(|tri_a| {
            other
                .triangles
                .iter()
                .any(|tri_b| tri_a.intersects_triangle(tri_b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> CollisionMeshTemplate {
        let vertices = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        CollisionMeshTemplate::from_vertices(&vertices, &[0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_template_drops_bad_indices() {
        let vertices = [Vec3::x(), Vec3::y(), Vec3::z()];
        let template = CollisionMeshTemplate::from_vertices(&vertices, &[0, 1, 2, 0, 1, 7, 2]);
        assert_eq!(template.local_triangles.len(), 1);
        assert_relative_eq!(template.local_bounding_radius, 1.0);

        let empty = CollisionMeshTemplate::from_vertices(&vertices, &[]);
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_world_space_ray_and_sphere() {
        let transform = Transform::from_position(Vec3::new(0.0, 2.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0));
        let mesh = quad().to_world_space(&transform);
        assert_relative_eq!(mesh.bounding_radius, 2.0 * 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(mesh.aabb.max, Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);

        let ray = Ray::new(Vec3::new(0.8, 10.0, 0.2), -Vec3::y());
        let (t, point, normal) = mesh.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-5);
        assert_relative_eq!(point.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-5);

        let sphere = BoundingSphere::new(Vec3::new(0.0, 2.5, 0.0), 1.0);
        let (_, normal, depth) = mesh.intersect_sphere(&sphere).unwrap();
        assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(depth, 0.5, epsilon = 1e-5);

        let far = BoundingSphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0);
        assert!(mesh.intersect_sphere(&far).is_none());
    }

    #[test]
    fn test_coplanar_meshes() {
        let floor = quad().to_world_space(&Transform::identity());
        let shifted = quad().to_world_space(&Transform::from_position(Vec3::new(1.5, 0.0, 0.0)));
        assert!(floor.intersects_mesh(&shifted));

        // Same plane, overlapping bounds, but the sliver stays past the corner
        let vertices = [Vec3::new(0.9, 0.0, 1.5), Vec3::new(1.5, 0.0, 0.9), Vec3::new(1.5, 0.0, 1.5)];
        let sliver = CollisionMeshTemplate::from_vertices(&vertices, &[0, 1, 2]).to_world_space(&Transform::identity());
        assert!(floor.aabb.intersects(&sliver.aabb));
        assert!(!floor.intersects_mesh(&sliver));
        assert!(!sliver.intersects_mesh(&floor));
    }
}
