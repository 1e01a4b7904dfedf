//! Component registry
//!
//! Owns every registered [`PhysicsComponent`] in a generation-checked arena
//! and keeps the spatial index in lockstep with it: a component is in both
//! or in neither.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use slotmap::SlotMap;

use crate::foundation::logging::{debug, warn};
use crate::foundation::math::Vec3;
use crate::physics::component::{ComponentHandle, ComponentId, PhysicsComponent};
use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::spatial::{SpatialIndex, AABB};

/// Registered components plus the spatial index over their bounds
pub struct ComponentRegistry {
    components: SlotMap<ComponentHandle, PhysicsComponent>,
    by_id: HashMap<ComponentId, ComponentHandle>,
    index: Box<dyn SpatialIndex>,
}

impl ComponentRegistry {
    /// Empty registry over the given spatial index
    pub fn new(mut index: Box<dyn SpatialIndex>) -> Self {
        index.clear();
        Self {
            components: SlotMap::with_key(),
            by_id: HashMap::new(),
            index,
        }
    }

    /// World bounds used for indexing; invalid components get a point box
    pub fn bounds_for(component: &PhysicsComponent) -> AABB {
        if component.is_valid() {
            let aabb = component.world_shape().aabb();
            if aabb.is_finite() {
                return aabb;
            }
        }
        let p = component.transform.position;
        let anchor = if p.iter().all(|v| v.is_finite()) { p } else { Vec3::zeros() };
        AABB::new(anchor, anchor)
    }

    /// Insert a component; fails without side effects if its id is taken
    pub fn register(&mut self, component: PhysicsComponent) -> PhysicsResult<ComponentHandle> {
        let id = component.id;
        if self.by_id.contains_key(&id) {
            return Err(PhysicsError::DuplicateRegistration(id));
        }
        if !component.is_valid() {
            warn!("Registering invalid {id} ({}); it is skipped until fixed", component.shape.kind_name());
        }

        let aabb = Self::bounds_for(&component);
        let handle = self.components.insert(component);
        self.by_id.insert(id, handle);
        self.index.insert(handle, aabb);
        debug!("Registered {id} as {handle:?}");
        Ok(handle)
    }

    /// Remove a component from the arena and the index, returning it
    pub fn deregister(&mut self, id: ComponentId) -> PhysicsResult<PhysicsComponent> {
        let handle = self.by_id.remove(&id).ok_or(PhysicsError::UnknownComponent(id))?;
        self.index.remove(handle);
        let component = self
            .components
            .remove(handle)
            .ok_or(PhysicsError::UnknownComponent(id))?;
        debug!("Deregistered {id}");
        Ok(component)
    }

    /// Re-sync the externally owned transform and shape of a registered component
    pub fn update(&mut self, component: &PhysicsComponent) -> PhysicsResult<()> {
        let handle = self.handle_of(component.id).ok_or(PhysicsError::UnknownComponent(component.id))?;
        let stored = self
            .components
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownComponent(component.id))?;
        stored.transform = component.transform;
        stored.shape = component.shape.clone();
        self.refresh_bounds(handle);
        Ok(())
    }

    /// Gameplay-driven velocity change
    pub fn set_velocity(&mut self, id: ComponentId, linear: Vec3, angular: Vec3) -> PhysicsResult<()> {
        let handle = self.handle_of(id).ok_or(PhysicsError::UnknownComponent(id))?;
        let stored = self.components.get_mut(handle).ok_or(PhysicsError::UnknownComponent(id))?;
        stored.velocity = linear;
        stored.angular_velocity = angular;
        Ok(())
    }

    /// Recompute a component's bounds and move its index entry
    pub fn refresh_bounds(&mut self, handle: ComponentHandle) {
        if let Some(component) = self.components.get(handle) {
            let aabb = Self::bounds_for(component);
            self.index.update(handle, aabb);
        }
    }

    /// Registered component by id
    pub fn component(&self, id: ComponentId) -> Option<&PhysicsComponent> {
        self.handle_of(id).and_then(|h| self.components.get(h))
    }

    /// Registered component by handle; stale handles resolve to None
    pub fn component_by_handle(&self, handle: ComponentHandle) -> Option<&PhysicsComponent> {
        self.components.get(handle)
    }

    pub(crate) fn component_mut_by_handle(&mut self, handle: ComponentHandle) -> Option<&mut PhysicsComponent> {
        self.components.get_mut(handle)
    }

    /// Handle assigned to a registered id
    pub fn handle_of(&self, id: ComponentId) -> Option<ComponentHandle> {
        self.by_id.get(&id).copied()
    }

    /// True when `id` is registered
    pub fn contains(&self, id: ComponentId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All registered components in arena order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentHandle, &PhysicsComponent)> {
        self.components.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (ComponentHandle, &mut PhysicsComponent)> {
        self.components.iter_mut()
    }

    /// Spatial index over the registered bounds
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    /// Apply a queued command; yields the id it deregistered, if any
    pub fn apply(&mut self, command: PendingCommand) -> Result<Option<ComponentId>, CommandFailure> {
        let (label, result) = match command {
            PendingCommand::Register(component) => ("register", self.register(component).map(|_| None)),
            PendingCommand::Deregister(id) => ("deregister", self.deregister(id).map(|removed| Some(removed.id))),
            PendingCommand::Update(component) => ("update", self.update(&component).map(|()| None)),
        };
        result.map_err(|error| CommandFailure { command: label, error })
    }
}

/// Registration-class mutation buffered for the next frame boundary
#[derive(Debug, Clone)]
pub enum PendingCommand {
    /// Register a new component
    Register(PhysicsComponent),
    /// Deregister by id
    Deregister(ComponentId),
    /// Re-sync transform and shape
    Update(PhysicsComponent),
}

/// A queued command that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Which kind of command failed
    pub command: &'static str,
    /// Why it failed
    pub error: PhysicsError,
}

/// Cloneable, thread-safe handle for queuing registry commands
///
/// Commands are applied in submission order at the start of the next
/// `update` (or on an explicit flush).
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: Arc<Mutex<Vec<PendingCommand>>>,
}

impl CommandQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a registration
    pub fn register(&self, component: PhysicsComponent) {
        self.push(PendingCommand::Register(component));
    }

    /// Queue a deregistration
    pub fn deregister(&self, id: ComponentId) {
        self.push(PendingCommand::Deregister(id));
    }

    /// Queue a transform / shape re-sync
    pub fn update(&self, component: PhysicsComponent) {
        self.push(PendingCommand::Update(component));
    }

    /// Queue any command
    pub fn push(&self, command: PendingCommand) {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).push(command);
    }

    /// Number of commands waiting
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every waiting command in submission order
    pub fn drain(&self) -> Vec<PendingCommand> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply every waiting command to `registry`; failures are logged and returned.
    /// `on_deregistered` sees the id of every component a queued deregistration removed.
    pub fn apply_to<F>(&self, registry: &mut ComponentRegistry, mut on_deregistered: F) -> Vec<CommandFailure>
    where
        F: FnMut(ComponentId),
    {
        let mut failures = Vec::new();
        for command in self.drain() {
            match registry.apply(command) {
                Ok(Some(removed)) => on_deregistered(removed),
                Ok(None) => {}
                Err(failure) => {
                    warn!("Deferred {} failed: {}", failure.command, failure.error);
                    failures.push(failure);
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::spatial::create_spatial_index;

    fn create_test_registry() -> ComponentRegistry {
        ComponentRegistry::new(create_spatial_index(&PhysicsConfig::default()))
    }

    #[test]
    fn test_register_indexes_component() {
        let mut registry = create_test_registry();
        let component = PhysicsComponent::static_sphere(Vec3::new(3.0, 0.0, 0.0), 1.0);
        let id = component.id;

        let handle = registry.register(component).unwrap();
        assert_eq!(registry.handle_of(id), Some(handle));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index().len(), 1);
        let aabb = registry.index().get_aabb(handle).unwrap();
        assert_eq!(aabb.center(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_duplicate_registration_leaves_state_unchanged() {
        let mut registry = create_test_registry();
        let component = PhysicsComponent::static_sphere(Vec3::zeros(), 1.0);
        let id = component.id;
        registry.register(component.clone()).unwrap();

        let moved = component.with_transform(crate::foundation::math::Transform::from_position(Vec3::new(9.0, 0.0, 0.0)));
        assert_eq!(registry.register(moved), Err(PhysicsError::DuplicateRegistration(id)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.component(id).unwrap().transform.position, Vec3::zeros());
    }

    #[test]
    fn test_deregister_removes_everywhere_and_invalidates_handle() {
        let mut registry = create_test_registry();
        let component = PhysicsComponent::static_sphere(Vec3::zeros(), 1.0);
        let id = component.id;
        let handle = registry.register(component).unwrap();

        let removed = registry.deregister(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.index().is_empty());
        assert!(registry.component_by_handle(handle).is_none());
        assert_eq!(registry.deregister(id).unwrap_err(), PhysicsError::UnknownComponent(id));

        // A new component reusing the slot must not resolve through the old handle
        let new_handle = registry.register(PhysicsComponent::static_sphere(Vec3::zeros(), 1.0)).unwrap();
        assert_ne!(new_handle, handle);
        assert!(registry.component_by_handle(handle).is_none());
    }

    #[test]
    fn test_update_moves_index_entry() {
        let mut registry = create_test_registry();
        let mut component = PhysicsComponent::static_sphere(Vec3::zeros(), 1.0);
        let handle = registry.register(component.clone()).unwrap();

        component.transform.position = Vec3::new(0.0, 10.0, 0.0);
        registry.update(&component).unwrap();
        registry.update(&component).unwrap();
        assert_eq!(registry.index().get_aabb(handle).unwrap().center(), Vec3::new(0.0, 10.0, 0.0));

        let stranger = PhysicsComponent::static_sphere(Vec3::zeros(), 1.0);
        assert_eq!(registry.update(&stranger), Err(PhysicsError::UnknownComponent(stranger.id)));
    }

    #[test]
    fn test_invalid_component_gets_point_bounds() {
        let mut registry = create_test_registry();
        let mut component = PhysicsComponent::dynamic_sphere(Vec3::new(1.0, 2.0, 3.0), f32::NAN);
        let handle = registry.register(component.clone()).unwrap();
        let aabb = registry.index().get_aabb(handle).unwrap();
        assert_eq!(aabb.min, aabb.max);
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));

        component.transform.position = Vec3::new(f32::INFINITY, 0.0, 0.0);
        registry.update(&component).unwrap();
        assert_eq!(registry.index().get_aabb(handle).unwrap().min, Vec3::zeros());
    }

    #[test]
    fn test_command_queue_applies_in_order_and_reports_failures() {
        let mut registry = create_test_registry();
        let queue = CommandQueue::new();
        let component = PhysicsComponent::static_sphere(Vec3::zeros(), 1.0);
        let id = component.id;

        let producer = queue.clone();
        std::thread::spawn(move || {
            producer.register(component.clone());
            producer.register(component);
            producer.deregister(id);
            producer.deregister(id);
        })
        .join()
        .unwrap();
        assert_eq!(queue.len(), 4);

        let mut removed = Vec::new();
        let failures = queue.apply_to(&mut registry, |id| removed.push(id));
        assert!(queue.is_empty());
        assert_eq!(removed, vec![id]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].command, "register");
        assert_eq!(failures[0].error, PhysicsError::DuplicateRegistration(id));
        assert_eq!(failures[1].error, PhysicsError::UnknownComponent(id));
        assert!(registry.is_empty());
    }
}
