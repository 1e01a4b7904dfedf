//! Physics components and their identities

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision::{CollisionShape, WorldSpaceShape};
use crate::physics::interactivity::Interactivity;

slotmap::new_key_type! {
    /// Generation-checked registry slot of a registered component
    pub struct ComponentHandle;
}

/// Stable identity of a physics component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

impl ComponentId {
    /// Allocate a fresh process-unique id
    pub fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Opaque back-reference to the game entity owning a component
///
/// Physics only echoes it back in hits and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef(pub u64);

/// One physics-enabled entity
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsComponent {
    /// Identity used for registration and lookups
    pub id: ComponentId,
    /// World transform (externally owned, re-synced through `update_component`)
    pub transform: Transform,
    /// Model-space collision shape
    pub shape: CollisionShape,
    /// Mass in kg; zero or infinite means immovable
    pub mass: f32,
    /// Linear velocity (units / s)
    pub velocity: Vec3,
    /// Angular velocity (rad / s, world axes)
    pub angular_velocity: Vec3,
    /// Bounciness in 0..=1
    pub restitution: f32,
    /// Simulation and filter categories
    pub interactivity: Interactivity,
    /// Owning game entity
    pub owner: Option<OwnerRef>,
}

impl PhysicsComponent {
    /// New component at the origin with unit mass and a fresh id
    pub fn new(shape: CollisionShape, interactivity: Interactivity) -> Self {
        Self {
            id: ComponentId::next(),
            transform: Transform::identity(),
            shape,
            mass: 1.0,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            restitution: 0.0,
            interactivity,
            owner: None,
        }
    }

    /// Static sphere shorthand
    pub fn static_sphere(position: Vec3, radius: f32) -> Self {
        Self::new(CollisionShape::sphere(radius), Interactivity::STATIC)
            .with_transform(Transform::from_position(position))
    }

    /// Dynamic sphere shorthand
    pub fn dynamic_sphere(position: Vec3, radius: f32) -> Self {
        Self::new(CollisionShape::sphere(radius), Interactivity::DYNAMIC)
            .with_transform(Transform::from_position(position))
    }

    /// Builder: override the id (e.g. to mirror an entity id)
    pub fn with_id(mut self, id: ComponentId) -> Self {
        self.id = id;
        self
    }

    /// Builder: set the transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: set the mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Builder: set the linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set the angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Builder: set restitution (clamped to 0..=1)
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = if restitution.is_finite() { restitution.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    /// Builder: attach the owning entity
    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Inverse mass used by the solver; zero for anything that must not be pushed
    pub fn inverse_mass(&self) -> f32 {
        if !self.interactivity.receives_impulses() || !self.mass.is_finite() || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// True when the stepper advances this component; zero or infinite mass pins a dynamic body
    pub fn integrates(&self) -> bool {
        let interactivity = self.interactivity;
        interactivity.integrates()
            && (interactivity.is_kinematic() || (self.mass.is_finite() && self.mass > 0.0))
    }

    /// Transform, shape and velocities are all usable by the simulation
    pub fn is_valid(&self) -> bool {
        self.transform.is_finite()
            && self.shape.is_valid()
            && self.velocity.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
    }

    /// World-space version of the shape
    pub fn world_shape(&self) -> WorldSpaceShape {
        self.shape.to_world_space(&self.transform)
    }
}
