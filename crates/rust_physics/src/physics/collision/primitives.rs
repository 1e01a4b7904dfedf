//! Primitive collision shapes and intersection algorithms
//!
//! Provides basic geometric primitives (rays, spheres, oriented boxes,
//! triangles) with efficient intersection testing algorithms.

use crate::foundation::math::Vec3;
use crate::spatial::AABB;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray; `direction` must be non-zero
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Axis-aligned bounds of the sphere
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(self.center, Vec3::new(self.radius, self.radius, self.radius))
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Get the penetration depth if intersecting (0.0 if not intersecting)
    pub fn penetration_depth(&self, other: &BoundingSphere) -> f32 {
        let distance = (self.center - other.center).magnitude();
        let radius_sum = self.radius + other.radius;
        if distance < radius_sum {
            radius_sum - distance
        } else {
            0.0
        }
    }

    /// Test ray intersection with this sphere
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        // Vector from ray origin to sphere center
        let oc = ray.origin - self.center;

        // Solve: |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        // Use the closest positive intersection
        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return None;
        };

        let hit_point = ray.point_at(t);
        let normal = (hit_point - self.center).normalize();

        Some((t, hit_point, normal))
    }
}

/// An oriented box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Box center
    pub center: Vec3,
    /// Orthonormal local axes in world space
    pub axes: [Vec3; 3],
    /// Half size along each local axis
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Create a box from its center, local axes and half extents
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self { center, axes, half_extents }
    }

    /// Axis-aligned box with no rotation
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, [Vec3::x(), Vec3::y(), Vec3::z()], half_extents)
    }

    /// Half the length of the box's projection onto `axis`
    pub fn projected_radius(&self, axis: &Vec3) -> f32 {
        (0..3)
            .map(|i| self.half_extents[i] * self.axes[i].dot(axis).abs())
            .sum()
    }

    /// Axis-aligned bounds of the box
    pub fn aabb(&self) -> AABB {
        let extents = Vec3::new(
            self.projected_radius(&Vec3::x()),
            self.projected_radius(&Vec3::y()),
            self.projected_radius(&Vec3::z()),
        );
        AABB::from_center_extents(self.center, extents)
    }

    /// Express a world point in box-local coordinates
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        Vec3::new(d.dot(&self.axes[0]), d.dot(&self.axes[1]), d.dot(&self.axes[2]))
    }

    /// Convert box-local coordinates back to world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.center + self.axes[0] * local.x + self.axes[1] * local.y + self.axes[2] * local.z
    }

    /// Closest point on or inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point);
        let clamped = Vec3::new(
            local.x.clamp(-self.half_extents.x, self.half_extents.x),
            local.y.clamp(-self.half_extents.y, self.half_extents.y),
            local.z.clamp(-self.half_extents.z, self.half_extents.z),
        );
        self.to_world(clamped)
    }

    /// Slab test in box-local space
    /// Returns (distance, hit_point, normal) at the closest positive intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        let origin = self.to_local(ray.origin);
        let dir = Vec3::new(
            ray.direction.dot(&self.axes[0]),
            ray.direction.dot(&self.axes[1]),
            ray.direction.dot(&self.axes[2]),
        );

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_axis = 0;
        let mut exit_axis = 0;
        let mut enter_sign = 0.0;
        let mut exit_sign = 0.0;

        for axis in 0..3 {
            let h = self.half_extents[axis];
            if dir[axis].abs() < 1e-8 {
                if origin[axis] < -h || origin[axis] > h {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[axis];
            let t1 = (-h - origin[axis]) * inv;
            let t2 = (h - origin[axis]) * inv;
            let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            // Entry face faces against the ray, exit face along it
            let sign = dir[axis].signum();
            if near > t_enter {
                t_enter = near;
                enter_axis = axis;
                enter_sign = -sign;
            }
            if far < t_exit {
                t_exit = far;
                exit_axis = axis;
                exit_sign = sign;
            }
            if t_enter > t_exit {
                return None;
            }
        }

        let (t, axis, sign) = if t_enter > 0.0 {
            (t_enter, enter_axis, enter_sign)
        } else if t_exit > 0.0 {
            (t_exit, exit_axis, exit_sign)
        } else {
            return None;
        };
        Some((t, ray.point_at(t), self.axes[axis] * sign))
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Triangle vertices
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// True when the triangle has a non-zero area
    pub fn is_degenerate(&self) -> bool {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).magnitude_squared() <= f32::EPSILON * f32::EPSILON
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    ///
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller & Trumbore
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t > 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);

        // Vertex region outside v0
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        // Vertex region outside v1
        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        // Vertex region outside v2
        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        // Edge regions
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v_val = d1 / (d1 - d3);
            return self.v0 + edge1 * v_val;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v_val = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v_val + edge2 * w
    }

    /// Signed distance from a point to the triangle plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal().dot(&(point - self.v0))
    }

    /// Test if this triangle intersects another triangle
    ///
    /// Separating Axis Theorem over 11 axes: both face normals and the nine
    /// edge-edge cross products.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        const EPSILON: f32 = 0.000001;

        fn project(tri: &Triangle, axis: Vec3) -> (f32, f32) {
            let p0 = axis.dot(&tri.v0);
            let p1 = axis.dot(&tri.v1);
            let p2 = axis.dot(&tri.v2);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        // Returns false if `axis` separates the triangles
        fn overlaps_on(a: &Triangle, b: &Triangle, axis: Vec3) -> bool {
            if axis.magnitude_squared() < EPSILON {
                return true;
            }
            let (min1, max1) = project(a, axis);
            let (min2, max2) = project(b, axis);
            max1 >= min2 && max2 >= min1
        }

        let edges1 = [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2];
        let edges2 = [other.v1 - other.v0, other.v2 - other.v1, other.v0 - other.v2];

        let n1 = edges1[0].cross(&edges1[1]);
        let n2 = edges2[0].cross(&edges2[1]);
        if !overlaps_on(self, other, n1) || !overlaps_on(self, other, n2) {
            return false;
        }

        // Coplanar: every edge cross is parallel to the normal, so test the in-plane edge normals
        let parallel = n1.cross(&n2).magnitude_squared() <= EPSILON * n1.magnitude_squared() * n2.magnitude_squared();
        if parallel {
            return edges1.iter().chain(edges2.iter()).all(|e| overlaps_on(self, other, n1.cross(e)));
        }

        edges1
            .iter()
            .all(|e1| edges2.iter().all(|e2| overlaps_on(self, other, e1.cross(e2))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_ray_hits_front_face() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let (t, point, normal) = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
        assert_relative_eq!(point, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(normal, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_ray_from_inside_reports_exit() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        let (t, _, normal) = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 2.0, epsilon = 1e-5);
        assert_relative_eq!(normal, Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_box_ray_normal_and_rotation() {
        let cube = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::new(1.0, 2.0, 1.0));
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::x());
        let (t, point, normal) = cube.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-5);
        assert_relative_eq!(point, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(normal, -Vec3::x(), epsilon = 1e-5);

        // Origin inside: exit face
        let inside = Ray::new(Vec3::zeros(), Vec3::y());
        let (t, _, normal) = cube.intersect_ray(&inside).unwrap();
        assert_relative_eq!(t, 2.0, epsilon = 1e-5);
        assert_relative_eq!(normal, Vec3::y(), epsilon = 1e-5);

        // 45 degrees about z: the corner sits at sqrt(2) along x
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let rotated = OrientedBox::new(
            Vec3::zeros(),
            [Vec3::new(s, s, 0.0), Vec3::new(-s, s, 0.0), Vec3::z()],
            Vec3::new(1.0, 1.0, 1.0),
        );
        let (t, _, _) = rotated.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 5.0 - 2.0f32.sqrt(), epsilon = 1e-4);
        assert_relative_eq!(rotated.aabb().max.x, 2.0f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_box_ray_misses_when_pointing_away() {
        let cube = OrientedBox::axis_aligned(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), -Vec3::x());
        assert!(cube.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_triangle_ray_and_closest_point() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::z());
        let (t, _, _) = tri.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 3.0, epsilon = 1e-5);

        let closest = tri.closest_point(Vec3::new(0.0, -5.0, 2.0));
        assert_relative_eq!(closest, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_triangle_sat() {
        let a = Triangle::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let crossing = Triangle::new(Vec3::new(0.0, 0.5, -1.0), Vec3::new(0.0, 0.5, 1.0), Vec3::new(0.0, -1.0, 0.0));
        let far = Triangle::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 0.0));
        assert!(a.intersects_triangle(&crossing));
        assert!(!a.intersects_triangle(&far));
    }

    #[test]
    fn test_coplanar_triangles() {
        let a = Triangle::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let overlapping = Triangle::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(2.0, 0.5, 0.0), Vec3::new(1.0, 2.0, 0.0));
        // Bounds overlap but the hypotenuse separates them
        let beside = Triangle::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.6, 1.0, 0.0), Vec3::new(1.0, 0.6, 0.0));
        let above = Triangle::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 1.0));
        assert!(a.intersects_triangle(&overlapping));
        assert!(overlapping.intersects_triangle(&a));
        assert!(!a.intersects_triangle(&beside));
        assert!(!beside.intersects_triangle(&a));
        assert!(!a.intersects_triangle(&above));
    }
}
