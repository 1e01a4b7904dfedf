//! Collision-specific debug visualization
//!
//! Turns the registry, the last step's contacts and the most recent ray into
//! debug primitives: shape wireframes, bounding boxes, spatial index cells,
//! contact normals and the ray path.

use std::collections::HashSet;

use crate::debug::draw::DebugRenderer;
use crate::foundation::math::{Quat, Vec4};
use crate::physics::collision::WorldSpaceShape;
use crate::physics::component::{ComponentId, PhysicsComponent};
use crate::physics::raycast::RayPath;
use crate::physics::registry::ComponentRegistry;
use crate::physics::stepper::{ContactRecord, EventKind};
use crate::spatial::AABB;

/// Color scheme for collision visualization
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionDebugColors {
    /// Static components
    pub shape_static: Vec4,
    /// Dynamic components
    pub shape_dynamic: Vec4,
    /// Kinematic components
    pub shape_kinematic: Vec4,
    /// Trigger volumes
    pub shape_trigger: Vec4,
    /// Any component touching something this frame
    pub shape_colliding: Vec4,
    /// Component bounding boxes
    pub aabb: Vec4,
    /// Spatial index nodes / cells
    pub spatial_index: Vec4,
    /// Contact points and normals
    pub contact: Vec4,
    /// Ray segment
    pub ray: Vec4,
    /// Ray hit point
    pub ray_hit: Vec4,
}

impl Default for CollisionDebugColors {
    fn default() -> Self {
        Self {
            shape_static: Vec4::new(0.6, 0.6, 0.6, 0.5),
            shape_dynamic: Vec4::new(0.0, 1.0, 0.0, 0.5),
            shape_kinematic: Vec4::new(0.0, 0.6, 1.0, 0.5),
            shape_trigger: Vec4::new(1.0, 0.8, 0.0, 0.3),
            shape_colliding: Vec4::new(1.0, 0.0, 0.0, 0.6),
            aabb: Vec4::new(0.5, 0.8, 1.0, 0.15),
            spatial_index: Vec4::new(0.0, 1.0, 1.0, 0.1),
            contact: Vec4::new(1.0, 0.0, 1.0, 1.0),
            ray: Vec4::new(1.0, 1.0, 1.0, 1.0),
            ray_hit: Vec4::new(1.0, 0.3, 0.0, 1.0),
        }
    }
}

/// Collision-specific debug visualizer
///
/// Stateless apart from its colors and toggles; drawing never mutates the world.
#[derive(Clone, Debug)]
pub struct CollisionDebugVisualizer {
    colors: CollisionDebugColors,

    /// Show component shape wireframes
    pub show_shapes: bool,

    /// Show component AABBs
    pub show_aabbs: bool,

    /// Show spatial index node / cell boxes
    pub show_spatial_index: bool,

    /// Show contact points and normals from the last step
    pub show_contacts: bool,

    /// Show the most recent ray
    pub show_ray: bool,

    /// Length of drawn contact normals
    pub normal_length: f32,
}

impl CollisionDebugVisualizer {
    /// Create a new collision debug visualizer
    pub fn new() -> Self {
        Self {
            colors: CollisionDebugColors::default(),
            show_shapes: true,
            show_aabbs: false,
            show_spatial_index: false,
            show_contacts: true,
            show_ray: true,
            normal_length: 0.5,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: CollisionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Current color scheme
    pub fn colors(&self) -> &CollisionDebugColors {
        &self.colors
    }

    /// Emit everything enabled by the toggles
    pub fn draw(
        &self,
        registry: &ComponentRegistry,
        contacts: &[ContactRecord],
        ray_path: Option<&RayPath>,
        renderer: &mut dyn DebugRenderer,
    ) {
        let touching: HashSet<ComponentId> = contacts
            .iter()
            .filter(|record| record.kind == EventKind::Contact)
            .flat_map(|record| [record.a, record.b])
            .collect();

        for (handle, component) in registry.iter() {
            if self.show_shapes && component.is_valid() {
                let color = self.shape_color(component, touching.contains(&component.id));
                self.draw_collision_shape(component, color, renderer);
            }
            if self.show_aabbs {
                if let Some(aabb) = registry.index().get_aabb(handle) {
                    self.draw_aabb(&aabb, self.colors.aabb, renderer);
                }
            }
        }

        if self.show_spatial_index {
            for bounds in registry.index().debug_bounds() {
                self.draw_aabb(&bounds, self.colors.spatial_index, renderer);
            }
        }

        if self.show_contacts {
            for record in contacts {
                self.draw_contact(record, renderer);
            }
        }

        if self.show_ray {
            if let Some(path) = ray_path {
                self.draw_ray_path(path, renderer);
            }
        }
    }

    fn shape_color(&self, component: &PhysicsComponent, is_colliding: bool) -> Vec4 {
        let interactivity = component.interactivity;
        if is_colliding {
            self.colors.shape_colliding
        } else if interactivity.is_trigger() {
            self.colors.shape_trigger
        } else if interactivity.is_static() {
            self.colors.shape_static
        } else if interactivity.is_kinematic() {
            self.colors.shape_kinematic
        } else {
            self.colors.shape_dynamic
        }
    }

    /// Wireframe of a component's world-space shape
    pub fn draw_collision_shape(&self, component: &PhysicsComponent, color: Vec4, renderer: &mut dyn DebugRenderer) {
        match component.world_shape() {
            WorldSpaceShape::Sphere(sphere) => renderer.draw_sphere(sphere.center, sphere.radius, color),
            WorldSpaceShape::Cuboid(cuboid) => {
                renderer.draw_box(cuboid.center, cuboid.half_extents, component.transform.rotation, color);
            }
            WorldSpaceShape::Mesh(mesh) => {
                for tri in &mesh.triangles {
                    renderer.draw_line(tri.v0, tri.v1, color);
                    renderer.draw_line(tri.v1, tri.v2, color);
                    renderer.draw_line(tri.v2, tri.v0, color);
                }
            }
        }
    }

    fn draw_aabb(&self, aabb: &AABB, color: Vec4, renderer: &mut dyn DebugRenderer) {
        renderer.draw_box(aabb.center(), aabb.extents(), Quat::identity(), color);
    }

    fn draw_contact(&self, record: &ContactRecord, renderer: &mut dyn DebugRenderer) {
        let contact = &record.contact;
        renderer.draw_point(contact.point, self.colors.contact, 0.05);
        renderer.draw_line(
            contact.point,
            contact.point + contact.normal * self.normal_length,
            self.colors.contact,
        );
    }

    fn draw_ray_path(&self, path: &RayPath, renderer: &mut dyn DebugRenderer) {
        renderer.draw_line(path.origin, path.end, self.colors.ray);
        if let Some(hit) = path.hit {
            renderer.draw_point(hit, self.colors.ray_hit, 0.1);
        }
    }
}

impl Default for CollisionDebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::foundation::math::Vec3;
    use crate::debug::draw::{DebugDrawList, DebugShape};
    use crate::physics::collision::CollisionShape;
    use crate::physics::interactivity::Interactivity;
    use crate::physics::narrow_phase::Contact;
    use crate::spatial::create_spatial_index;

    fn create_test_registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new(create_spatial_index(&PhysicsConfig::default()));
        registry.register(PhysicsComponent::static_sphere(Vec3::zeros(), 1.0)).unwrap();
        registry
            .register(PhysicsComponent::new(CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0)), Interactivity::DYNAMIC))
            .unwrap();
        let vertices = [Vec3::zeros(), Vec3::x(), Vec3::y()];
        registry
            .register(PhysicsComponent::new(CollisionShape::mesh_from_model(&vertices, &[0, 1, 2]), Interactivity::STATIC))
            .unwrap();
        registry
    }

    #[test]
    fn test_shapes_and_aabbs() {
        let registry = create_test_registry();
        let mut viz = CollisionDebugVisualizer::new();
        viz.show_aabbs = true;

        let mut list = DebugDrawList::new();
        viz.draw(&registry, &[], None, &mut list);
        assert_eq!(list.count("sphere"), 1);
        // Cuboid wireframe plus three AABBs
        assert_eq!(list.count("box"), 4);
        assert_eq!(list.count("line"), 3);
    }

    #[test]
    fn test_contacts_and_ray() {
        let registry = create_test_registry();
        let ids: Vec<ComponentId> = registry.iter().map(|(_, c)| c.id).collect();
        let viz = CollisionDebugVisualizer::new();
        let record = ContactRecord {
            a: ids[0],
            b: ids[1],
            kind: EventKind::Contact,
            contact: Contact {
                normal: Vec3::x(),
                depth: 0.1,
                point: Vec3::zeros(),
            },
        };
        let path = RayPath {
            origin: Vec3::new(0.0, 0.0, -10.0),
            end: Vec3::new(0.0, 0.0, -1.0),
            hit: Some(Vec3::new(0.0, 0.0, -1.0)),
        };

        let mut list = DebugDrawList::new();
        viz.draw(&registry, &[record], Some(&path), &mut list);
        assert_eq!(list.count("point"), 2);
        // Triangle edges, contact normal and the ray segment
        assert_eq!(list.count("line"), 5);

        let colliding = list
            .shapes()
            .iter()
            .filter(|s| s.color() == viz.colors().shape_colliding)
            .count();
        assert_eq!(colliding, 2);
        assert!(list.shapes().iter().any(|s| matches!(s, DebugShape::Box { .. })));
    }
}
