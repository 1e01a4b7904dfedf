//! Physics world facade
//!
//! [`PhysicsWorld`] is the only surface gameplay and rendering code depend
//! on. [`StandardPhysicsWorld`] composes the registry, the spatial index,
//! the stepper, a narrow-phase strategy and the debug visualizer;
//! [`create_world`] picks the strategy from configuration.

use std::sync::{Mutex, PoisonError};

use crate::config::{NarrowPhaseKind, PhysicsConfig};
use crate::debug::{CollisionDebugVisualizer, DebugRenderer};
use crate::foundation::logging::{debug, info};
use crate::foundation::math::{utils, Vec3};
use crate::physics::component::{ComponentHandle, ComponentId, PhysicsComponent};
use crate::physics::error::PhysicsResult;
use crate::physics::interactivity::Interactivity;
use crate::physics::narrow_phase::{AabbNarrowPhase, ExactNarrowPhase, NarrowPhase};
use crate::physics::raycast::{cast_ray, cast_ray_all, RayHit, RayPath};
use crate::physics::registry::{CommandFailure, CommandQueue, ComponentRegistry};
use crate::physics::stepper::{ContactRecord, PhysicsEvent, SimulationStepper, StepStats};
use crate::spatial::create_spatial_index;

/// Outcome of one `update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Stepper counters
    pub stats: StepStats,
    /// Queued commands that failed at the frame boundary
    pub command_failures: Vec<CommandFailure>,
}

/// Physics subsystem facade
pub trait PhysicsWorld: Send {
    /// Apply queued commands, then advance the simulation by `dt` seconds
    fn update(&mut self, dt: f32) -> UpdateReport;

    /// Emit debug primitives for the current state; no-op while debug is off
    fn draw(&self, renderer: &mut dyn DebugRenderer);

    /// Nearest hit along a ray among components matching `filter`
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Interactivity,
    ) -> PhysicsResult<RayHit> {
        self.raycast_ignoring(origin, direction, max_distance, filter, &[])
    }

    /// Nearest hit, skipping the components in `ignore`
    fn raycast_ignoring(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Interactivity,
        ignore: &[ComponentId],
    ) -> PhysicsResult<RayHit>;

    /// Every hit along a ray, nearest first
    fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Interactivity,
        ignore: &[ComponentId],
    ) -> PhysicsResult<Vec<RayHit>>;

    /// Add a component to the world
    fn register_component(&mut self, component: PhysicsComponent) -> PhysicsResult<ComponentHandle>;

    /// Remove a component from the world and hand it back
    fn deregister_component(&mut self, id: ComponentId) -> PhysicsResult<PhysicsComponent>;

    /// Re-sync a component's transform and shape after external changes
    fn update_component(&mut self, component: &PhysicsComponent) -> PhysicsResult<()>;

    /// Overwrite a component's velocities
    fn set_velocity(&mut self, id: ComponentId, linear: Vec3, angular: Vec3) -> PhysicsResult<()>;

    /// Registered component by id
    fn component(&self, id: ComponentId) -> Option<&PhysicsComponent>;

    /// Read access to the registry
    fn registry(&self) -> &ComponentRegistry;

    /// Whether debug drawing is on
    fn debug_enabled(&self) -> bool;

    /// Turn debug drawing on or off
    fn set_debug_enabled(&mut self, enabled: bool);

    /// Handle for queuing registry commands from any thread
    fn command_queue(&self) -> CommandQueue;

    /// Apply queued commands now instead of at the next update
    fn flush_commands(&mut self) -> Vec<CommandFailure>;

    /// Take the events produced since the last drain
    fn drain_events(&mut self) -> Vec<PhysicsEvent>;

    /// Contacts and trigger overlaps of the last update
    fn last_contacts(&self) -> &[ContactRecord];

    /// Configuration the world was built with
    fn config(&self) -> &PhysicsConfig;
}

/// World parameterized by its narrow-phase strategy
pub struct StandardPhysicsWorld<N: NarrowPhase> {
    config: PhysicsConfig,
    registry: ComponentRegistry,
    stepper: SimulationStepper,
    narrow: N,
    commands: CommandQueue,
    debug_enabled: bool,
    visualizer: CollisionDebugVisualizer,
    last_ray: Mutex<Option<RayPath>>,
}

/// World using exact shape tests
pub type ExactPhysicsWorld = StandardPhysicsWorld<ExactNarrowPhase>;

/// World using bounding boxes only
pub type AabbPhysicsWorld = StandardPhysicsWorld<AabbNarrowPhase>;

impl<N: NarrowPhase> StandardPhysicsWorld<N> {
    /// Build an empty world from `config`
    pub fn new(config: &PhysicsConfig) -> Self {
        let config = config.clone().sanitized();
        let narrow = N::default();
        info!(
            "Creating physics world ({} narrow phase, {:?} broad phase)",
            narrow.name(),
            config.broad_phase
        );
        Self {
            registry: ComponentRegistry::new(create_spatial_index(&config)),
            stepper: SimulationStepper::new(&config),
            narrow,
            commands: CommandQueue::new(),
            debug_enabled: config.debug_enabled,
            visualizer: CollisionDebugVisualizer::new(),
            last_ray: Mutex::new(None),
            config,
        }
    }

    /// Debug visualizer toggles and colors
    pub fn visualizer_mut(&mut self) -> &mut CollisionDebugVisualizer {
        &mut self.visualizer
    }

    /// Narrow-phase strategy in use
    pub fn narrow_phase(&self) -> &N {
        &self.narrow
    }

    /// Most recent ray recorded while debug was on
    pub fn last_ray(&self) -> Option<RayPath> {
        *self.last_ray.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, hit: &RayHit) {
        if !self.debug_enabled {
            return;
        }
        let Some(direction) = utils::try_normalize(direction) else {
            return;
        };
        let reach = self.config.world_bounds().extents().magnitude() * 2.0;
        let end = if hit.hit {
            hit.point
        } else {
            origin + direction * max_distance.max(0.0).min(reach)
        };
        let path = RayPath {
            origin,
            end,
            hit: hit.hit.then_some(hit.point),
        };
        *self.last_ray.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }
}

impl<N: NarrowPhase> PhysicsWorld for StandardPhysicsWorld<N> {
    fn update(&mut self, dt: f32) -> UpdateReport {
        let command_failures = self.flush_commands();
        let stats = self.stepper.step(&mut self.registry, &self.narrow, dt);
        UpdateReport { stats, command_failures }
    }

    fn draw(&self, renderer: &mut dyn DebugRenderer) {
        if !self.debug_enabled {
            return;
        }
        let ray = self.last_ray();
        self.visualizer
            .draw(&self.registry, self.stepper.last_contacts(), ray.as_ref(), renderer);
    }

    fn raycast_ignoring(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Interactivity,
        ignore: &[ComponentId],
    ) -> PhysicsResult<RayHit> {
        let hit = cast_ray(&self.registry, &self.narrow, origin, direction, max_distance, filter, ignore)?;
        self.record_ray(origin, direction, max_distance, &hit);
        Ok(hit)
    }

    fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: Interactivity,
        ignore: &[ComponentId],
    ) -> PhysicsResult<Vec<RayHit>> {
        let hits = cast_ray_all(&self.registry, &self.narrow, origin, direction, max_distance, filter, ignore)?;
        let nearest = hits.first().copied().unwrap_or_else(RayHit::miss);
        self.record_ray(origin, direction, max_distance, &nearest);
        Ok(hits)
    }

    fn register_component(&mut self, component: PhysicsComponent) -> PhysicsResult<ComponentHandle> {
        self.registry.register(component)
    }

    fn deregister_component(&mut self, id: ComponentId) -> PhysicsResult<PhysicsComponent> {
        let component = self.registry.deregister(id)?;
        self.stepper.forget(id);
        Ok(component)
    }

    fn update_component(&mut self, component: &PhysicsComponent) -> PhysicsResult<()> {
        self.registry.update(component)
    }

    fn set_velocity(&mut self, id: ComponentId, linear: Vec3, angular: Vec3) -> PhysicsResult<()> {
        self.registry.set_velocity(id, linear, angular)
    }

    fn component(&self, id: ComponentId) -> Option<&PhysicsComponent> {
        self.registry.component(id)
    }

    fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    fn set_debug_enabled(&mut self, enabled: bool) {
        if self.debug_enabled != enabled {
            debug!("Physics debug drawing {}", if enabled { "enabled" } else { "disabled" });
        }
        self.debug_enabled = enabled;
    }

    fn command_queue(&self) -> CommandQueue {
        self.commands.clone()
    }

    fn flush_commands(&mut self) -> Vec<CommandFailure> {
        let stepper = &mut self.stepper;
        self.commands.apply_to(&mut self.registry, |id| stepper.forget(id))
    }

    fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        self.stepper.drain_events()
    }

    fn last_contacts(&self) -> &[ContactRecord] {
        self.stepper.last_contacts()
    }

    fn config(&self) -> &PhysicsConfig {
        &self.config
    }
}

/// Build the world selected by `config.narrow_phase` and `config.broad_phase`
pub fn create_world(config: &PhysicsConfig) -> Box<dyn PhysicsWorld + Send> {
    match config.narrow_phase {
        NarrowPhaseKind::Exact => Box::new(ExactPhysicsWorld::new(config)),
        NarrowPhaseKind::Aabb => Box::new(AabbPhysicsWorld::new(config)),
    }
}
