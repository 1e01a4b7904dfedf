//! Narrow-phase collision strategies
//!
//! Turns broad-phase candidate pairs into contacts and answers exact
//! ray-vs-shape tests. [`ExactNarrowPhase`] works on the true shapes,
//! [`AabbNarrowPhase`] only on their world bounds.

use crate::foundation::math::{utils, Vec3};
use crate::physics::collision::{BoundingSphere, OrientedBox, Ray, Triangle, WorldSpaceCollisionMesh, WorldSpaceShape};
use crate::spatial::AABB;

/// Squared cross-product length below which two directions count as parallel
const PARALLEL_EPSILON: f32 = 1e-6;

/// Contact between two shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first shape towards the second
    pub normal: Vec3,
    /// Penetration depth (>= 0)
    pub depth: f32,
    /// Approximate world-space contact point
    pub point: Vec3,
}

impl Contact {
    /// Same contact seen from the other shape
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Exact ray hit against a single shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersection {
    /// Distance along the (normalized) ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
}

impl From<(f32, Vec3, Vec3)> for RayIntersection {
    fn from((distance, point, normal): (f32, Vec3, Vec3)) -> Self {
        Self { distance, point, normal }
    }
}

/// Shape-level collision strategy used by a physics world
pub trait NarrowPhase: Send + Sync + Default + 'static {
    /// Contact between two world-space shapes, or None when separated
    fn contact(&self, a: &WorldSpaceShape, b: &WorldSpaceShape) -> Option<Contact>;

    /// Closest positive ray intersection with a world-space shape
    fn intersect_ray(&self, shape: &WorldSpaceShape, ray: &Ray) -> Option<RayIntersection>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Exact sphere / box / mesh tests
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNarrowPhase;

impl NarrowPhase for ExactNarrowPhase {
    fn contact(&self, a: &WorldSpaceShape, b: &WorldSpaceShape) -> Option<Contact> {
        use WorldSpaceShape::{Cuboid, Mesh, Sphere};

        match (a, b) {
            (Sphere(sa), Sphere(sb)) => sphere_sphere(sa, sb),
            (Sphere(s), Cuboid(c)) => sphere_box(s, c),
            (Cuboid(c), Sphere(s)) => sphere_box(s, c).map(Contact::flipped),
            (Cuboid(ca), Cuboid(cb)) => box_box(ca, cb),
            (Sphere(s), Mesh(m)) => sphere_mesh(s, m),
            (Mesh(m), Sphere(s)) => sphere_mesh(s, m).map(Contact::flipped),
            (Cuboid(c), Mesh(m)) => box_mesh(c, m),
            (Mesh(m), Cuboid(c)) => box_mesh(c, m).map(Contact::flipped),
            // Mesh vs mesh: triangle SAT decides, bounding spheres give the contact
            (Mesh(ma), Mesh(mb)) => {
                if ma.intersects_mesh(mb) {
                    sphere_sphere(&ma.bounding_sphere(), &mb.bounding_sphere())
                } else {
                    None
                }
            }
        }
    }

    fn intersect_ray(&self, shape: &WorldSpaceShape, ray: &Ray) -> Option<RayIntersection> {
        shape.intersect_ray(ray).map(RayIntersection::from)
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Bounding boxes only; contacts along the axis of least overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct AabbNarrowPhase;

impl NarrowPhase for AabbNarrowPhase {
    fn contact(&self, a: &WorldSpaceShape, b: &WorldSpaceShape) -> Option<Contact> {
        aabb_aabb(&a.aabb(), &b.aabb())
    }

    fn intersect_ray(&self, shape: &WorldSpaceShape, ray: &Ray) -> Option<RayIntersection> {
        let aabb = shape.aabb();
        OrientedBox::axis_aligned(aabb.center(), aabb.extents())
            .intersect_ray(ray)
            .map(RayIntersection::from)
    }

    fn name(&self) -> &'static str {
        "aabb"
    }
}

fn b_sphere(cuboid: &OrientedBox) -> BoundingSphere {
    BoundingSphere::new(cuboid.center, cuboid.half_extents.magnitude())
}

fn sphere_sphere(a: &BoundingSphere, b: &BoundingSphere) -> Option<Contact> {
    let delta = b.center - a.center;
    let distance = delta.magnitude();
    let radius_sum = a.radius + b.radius;
    if distance > radius_sum {
        return None;
    }

    // Coincident centers: any direction separates them
    let normal = utils::try_normalize(delta).unwrap_or_else(Vec3::x);
    let depth = radius_sum - distance;
    Some(Contact {
        normal,
        depth,
        point: a.center + normal * (a.radius - depth * 0.5),
    })
}

/// Normal points from the sphere towards the box
fn sphere_box(sphere: &BoundingSphere, cuboid: &OrientedBox) -> Option<Contact> {
    let closest = cuboid.closest_point(sphere.center);
    let delta = closest - sphere.center;
    let distance_sq = delta.magnitude_squared();
    if distance_sq > sphere.radius * sphere.radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    if distance > 1e-6 {
        return Some(Contact {
            normal: delta / distance,
            depth: sphere.radius - distance,
            point: closest,
        });
    }

    // Center inside the box: leave through the nearest face
    let local = cuboid.to_local(sphere.center);
    let (axis, face_distance) = (0..3)
        .map(|i| (i, cuboid.half_extents[i] - local[i].abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    let outward = cuboid.axes[axis] * if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    Some(Contact {
        normal: -outward,
        depth: sphere.radius + face_distance,
        point: sphere.center + outward * face_distance,
    })
}

/// Normal points from the sphere towards the mesh
fn sphere_mesh(sphere: &BoundingSphere, mesh: &WorldSpaceCollisionMesh) -> Option<Contact> {
    mesh.intersect_sphere(sphere).map(|(point, normal, depth)| Contact {
        normal: -normal,
        depth,
        point,
    })
}

/// Separating axis test over the 15 candidate axes of two oriented boxes
fn box_box(a: &OrientedBox, b: &OrientedBox) -> Option<Contact> {
    let t = b.center - a.center;

    let mut axes: Vec<Vec3> = Vec::with_capacity(15);
    axes.extend_from_slice(&a.axes);
    axes.extend_from_slice(&b.axes);
    for ea in &a.axes {
        for eb in &b.axes {
            // Near-parallel edges give no usable axis
            let cross = ea.cross(eb);
            if cross.magnitude_squared() < PARALLEL_EPSILON {
                continue;
            }
            if let Some(axis) = utils::try_normalize(cross) {
                axes.push(axis);
            }
        }
    }

    let mut best: Option<(f32, Vec3)> = None;
    for axis in axes {
        let distance = t.dot(&axis);
        let overlap = a.projected_radius(&axis) + b.projected_radius(&axis) - distance.abs();
        if overlap < 0.0 {
            return None;
        }
        // Strict comparison keeps face axes on ties
        if best.map_or(true, |(d, _)| overlap < d) {
            let oriented = if distance < 0.0 { -axis } else { axis };
            best = Some((overlap, oriented));
        }
    }

    let (depth, normal) = best?;
    let point = (a.closest_point(b.center) + b.closest_point(a.center)) * 0.5;
    Some(Contact { normal, depth, point })
}

/// Box against every triangle; the deepest triangle gives the contact (normal box -> mesh)
fn box_mesh(cuboid: &OrientedBox, mesh: &WorldSpaceCollisionMesh) -> Option<Contact> {
    if !b_sphere(cuboid).intersects(&mesh.bounding_sphere()) || !cuboid.aabb().intersects(&mesh.aabb) {
        return None;
    }

    mesh.triangles
        .iter()
        .filter(|tri| !tri.is_degenerate())
        .filter_map(|tri| box_triangle(cuboid, tri))
        .max_by(|a, b| a.depth.total_cmp(&b.depth))
}

/// Separating axis test over the 13 candidate axes of a box and a triangle
fn box_triangle(cuboid: &OrientedBox, triangle: &Triangle) -> Option<Contact> {
    let vertices = [triangle.v0, triangle.v1, triangle.v2];
    let edges = [triangle.v1 - triangle.v0, triangle.v2 - triangle.v1, triangle.v0 - triangle.v2];

    let mut axes: Vec<Vec3> = Vec::with_capacity(13);
    axes.extend_from_slice(&cuboid.axes);
    axes.extend(utils::try_normalize(edges[0].cross(&edges[1])));
    for axis in &cuboid.axes {
        for edge in &edges {
            let cross = axis.cross(edge);
            if cross.magnitude_squared() < PARALLEL_EPSILON * edge.magnitude_squared() {
                continue;
            }
            axes.extend(utils::try_normalize(cross));
        }
    }

    let mut best: Option<(f32, Vec3)> = None;
    for axis in axes {
        let center = axis.dot(&cuboid.center);
        let radius = cuboid.projected_radius(&axis);
        let (low, high) = vertices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), v| {
            let p = axis.dot(v);
            (low.min(p), high.max(p))
        });

        // Distance the box must travel along -axis or +axis to clear the triangle
        let push_back = center + radius - low;
        let push_forward = high - (center - radius);
        if push_back < 0.0 || push_forward < 0.0 {
            return None;
        }
        let (overlap, normal) = if push_back <= push_forward { (push_back, axis) } else { (push_forward, -axis) };
        // Strict comparison keeps box face axes on ties
        if best.map_or(true, |(d, _)| overlap < d) {
            best = Some((overlap, normal));
        }
    }

    let (depth, normal) = best?;
    let on_triangle = triangle.closest_point(cuboid.center);
    let point = (on_triangle + cuboid.closest_point(on_triangle)) * 0.5;
    Some(Contact { normal, depth, point })
}

fn aabb_aabb(a: &AABB, b: &AABB) -> Option<Contact> {
    let overlap = a.overlap(b);
    if overlap.iter().any(|o| *o < 0.0) {
        return None;
    }

    let axis = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        0
    } else if overlap.y <= overlap.z {
        1
    } else {
        2
    };
    let mut normal = Vec3::zeros();
    normal[axis] = if b.center()[axis] >= a.center()[axis] { 1.0 } else { -1.0 };

    let region = AABB::new(a.min.sup(&b.min), a.max.inf(&b.max));
    Some(Contact {
        normal,
        depth: overlap[axis],
        point: region.center(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Transform};
    use crate::physics::collision::CollisionShape;
    use approx::assert_relative_eq;

    fn sphere_at(x: f32, radius: f32) -> WorldSpaceShape {
        CollisionShape::sphere(radius).to_world_space(&Transform::from_position(Vec3::new(x, 0.0, 0.0)))
    }

    fn cube_at(position: Vec3, half: f32) -> WorldSpaceShape {
        CollisionShape::cuboid(Vec3::new(half, half, half)).to_world_space(&Transform::from_position(position))
    }

    #[test]
    fn test_sphere_sphere_contact() {
        let contact = ExactNarrowPhase.contact(&sphere_at(0.0, 1.0), &sphere_at(1.5, 1.0)).unwrap();
        assert_relative_eq!(contact.normal, Vec3::x(), epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.5, epsilon = 1e-6);
        assert_relative_eq!(contact.point, Vec3::new(0.75, 0.0, 0.0), epsilon = 1e-6);

        assert!(ExactNarrowPhase.contact(&sphere_at(0.0, 1.0), &sphere_at(2.5, 1.0)).is_none());
    }

    #[test]
    fn test_sphere_box_contact_both_orders() {
        let sphere = sphere_at(0.0, 1.0);
        let cube = cube_at(Vec3::new(1.5, 0.0, 0.0), 1.0);

        let contact = ExactNarrowPhase.contact(&sphere, &cube).unwrap();
        assert_relative_eq!(contact.normal, Vec3::x(), epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.5, epsilon = 1e-6);

        let reversed = ExactNarrowPhase.contact(&cube, &sphere).unwrap();
        assert_relative_eq!(reversed.normal, -Vec3::x(), epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_center_inside_box() {
        let sphere = sphere_at(0.8, 0.5);
        let cube = cube_at(Vec3::zeros(), 1.0);
        let contact = ExactNarrowPhase.contact(&sphere, &cube).unwrap();
        // Nearest face is +x, so the box pushes the sphere towards +x
        assert_relative_eq!(contact.normal, -Vec3::x(), epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.7, epsilon = 1e-5);
    }

    #[test]
    fn test_box_box_sat() {
        let a = cube_at(Vec3::zeros(), 1.0);
        let b = cube_at(Vec3::new(0.0, 1.8, 0.0), 1.0);
        let contact = ExactNarrowPhase.contact(&a, &b).unwrap();
        assert_relative_eq!(contact.normal, Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(contact.depth, 0.2, epsilon = 1e-5);

        // Rotated 45 degrees: corner reaches sqrt(2), so 2.5 apart is separated
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let rotated = CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0))
            .to_world_space(&Transform::from_position_rotation(Vec3::new(2.5, 0.0, 0.0), rotation));
        assert!(ExactNarrowPhase.contact(&a, &rotated).is_none());

        let touching = CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0))
            .to_world_space(&Transform::from_position_rotation(Vec3::new(2.3, 0.0, 0.0), rotation));
        let contact = ExactNarrowPhase.contact(&a, &touching).unwrap();
        assert!(contact.normal.x > 0.0);
    }

    #[test]
    fn test_sphere_mesh_contact() {
        let vertices = [
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(-2.0, 0.0, 2.0),
        ];
        let floor = CollisionShape::mesh_from_model(&vertices, &[0, 1, 2, 0, 2, 3])
            .to_world_space(&Transform::identity());
        let ball = CollisionShape::sphere(1.0).to_world_space(&Transform::from_position(Vec3::new(0.3, 0.75, 0.2)));

        let contact = ExactNarrowPhase.contact(&ball, &floor).unwrap();
        assert_relative_eq!(contact.normal, -Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(contact.depth, 0.25, epsilon = 1e-5);

        let reversed = ExactNarrowPhase.contact(&floor, &ball).unwrap();
        assert_relative_eq!(reversed.normal, Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_box_rests_on_mesh_faces() {
        let vertices = [
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, -2.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(-2.0, 0.0, 2.0),
        ];
        let floor = CollisionShape::mesh_from_model(&vertices, &[0, 1, 2, 0, 2, 3])
            .to_world_space(&Transform::identity());
        let slab = |position: Vec3| {
            CollisionShape::cuboid(Vec3::new(1.0, 0.5, 1.0)).to_world_space(&Transform::from_position(position))
        };

        let contact = ExactNarrowPhase.contact(&slab(Vec3::new(0.0, 0.4, 0.0)), &floor).unwrap();
        assert_relative_eq!(contact.normal, -Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-5);
        assert_relative_eq!(contact.point.y, 0.0, epsilon = 1e-5);

        let reversed = ExactNarrowPhase.contact(&floor, &slab(Vec3::new(0.0, 0.4, 0.0))).unwrap();
        assert_relative_eq!(reversed.normal, Vec3::y(), epsilon = 1e-5);

        // Face clear of the surface, though its corners' sphere would reach
        assert!(ExactNarrowPhase.contact(&slab(Vec3::new(0.0, 0.6, 0.0)), &floor).is_none());
        // Beside the mesh edge
        assert!(ExactNarrowPhase.contact(&slab(Vec3::new(3.5, 0.4, 0.0)), &floor).is_none());

        // Tilted cube: only the lowest edge dips below the surface
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let tilted = CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0))
            .to_world_space(&Transform::from_position_rotation(Vec3::new(0.0, 1.3, 0.0), rotation));
        let contact = ExactNarrowPhase.contact(&tilted, &floor).unwrap();
        assert_relative_eq!(contact.normal, -Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(contact.depth, std::f32::consts::SQRT_2 - 1.3, epsilon = 1e-4);
    }

    #[test]
    fn test_aabb_phase_uses_least_overlap_axis() {
        let a = cube_at(Vec3::zeros(), 1.0);
        let b = cube_at(Vec3::new(0.5, 1.9, 0.0), 1.0);
        let contact = AabbNarrowPhase.contact(&a, &b).unwrap();
        assert_eq!(contact.normal, Vec3::y());
        assert_relative_eq!(contact.depth, 0.1, epsilon = 1e-5);

        // Spheres are treated as their boxes: corners overlap although the spheres do not
        let s1 = sphere_at(0.0, 1.0);
        let s2 = CollisionShape::sphere(1.0).to_world_space(&Transform::from_position(Vec3::new(1.8, 1.8, 0.0)));
        assert!(ExactNarrowPhase.contact(&s1, &s2).is_none());
        assert!(AabbNarrowPhase.contact(&s1, &s2).is_some());
    }

    #[test]
    fn test_ray_strategies() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::z());
        let sphere = sphere_at(0.0, 1.0);

        let exact = ExactNarrowPhase.intersect_ray(&sphere, &ray).unwrap();
        assert_relative_eq!(exact.distance, 9.0, epsilon = 1e-5);

        let coarse = AabbNarrowPhase.intersect_ray(&sphere, &ray).unwrap();
        assert_relative_eq!(coarse.distance, 9.0, epsilon = 1e-5);
        assert_relative_eq!(coarse.normal, -Vec3::z(), epsilon = 1e-6);

        // Grazing the box corner hits the AABB but not the sphere
        let grazing = Ray::new(Vec3::new(0.9, 0.9, -10.0), Vec3::z());
        assert!(ExactNarrowPhase.intersect_ray(&sphere, &grazing).is_none());
        assert!(AabbNarrowPhase.intersect_ray(&sphere, &grazing).is_some());
    }
}
