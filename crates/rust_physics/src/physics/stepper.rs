//! Simulation stepper
//!
//! One call to [`SimulationStepper::step`] advances the world by a frame:
//! integrate movers, find candidate pairs through the spatial index, run the
//! narrow phase, resolve contacts and diff the pair set against the previous
//! frame to produce events.

use std::collections::{BTreeMap, HashMap};

use crate::config::PhysicsConfig;
use crate::foundation::logging::{trace, warn};
use crate::foundation::math::{Quat, Vec3};
use crate::physics::component::{ComponentHandle, ComponentId};
use crate::physics::narrow_phase::{Contact, NarrowPhase};
use crate::physics::registry::ComponentRegistry;

/// Pair of component ids, smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller id
    pub a: ComponentId,
    /// Larger id
    pub b: ComponentId,
}

impl CollisionPair {
    /// Create a new pair (always stores the smaller id first)
    pub fn new(a: ComponentId, b: ComponentId) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// True when `id` is one of the two participants
    pub fn involves(&self, id: ComponentId) -> bool {
        self.a == id || self.b == id
    }
}

/// What kind of interaction an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Two solid components touching
    Contact,
    /// A trigger overlapping something
    Trigger,
}

/// Where in its lifetime an interaction is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// First frame of the interaction
    Entered,
    /// Interaction continues from the previous frame
    Stay,
    /// Interaction ended this frame
    Exited,
}

/// Collision or trigger notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsEvent {
    /// Contact or trigger
    pub kind: EventKind,
    /// Entered, stay or exited
    pub phase: EventPhase,
    /// First participant (smaller id)
    pub a: ComponentId,
    /// Second participant
    pub b: ComponentId,
    /// Contact data with the normal pointing from `a` to `b`; None on exit
    pub contact: Option<Contact>,
}

/// Contact kept from the last step for debug drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// First participant (smaller id)
    pub a: ComponentId,
    /// Second participant
    pub b: ComponentId,
    /// Contact or trigger overlap
    pub kind: EventKind,
    /// Contact data at detection time
    pub contact: Contact,
}

/// Per-step counters (logged at trace level)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Components whose position was integrated
    pub integrated: usize,
    /// Components skipped because of invalid state
    pub skipped: usize,
    /// Broad-phase pairs considered
    pub candidate_pairs: usize,
    /// Solid contacts resolved
    pub contacts: usize,
    /// Trigger overlaps reported
    pub triggers: usize,
}

/// Solver view of one body
#[derive(Debug, Clone, Copy)]
struct BodyState {
    position: Vec3,
    velocity: Vec3,
    inverse_mass: f32,
    restitution: f32,
}

/// Integration and collision resolution state carried between frames
#[derive(Debug, Clone)]
pub struct SimulationStepper {
    gravity: Vec3,
    linear_damping: f32,
    angular_damping: f32,
    solver_iterations: u32,
    penetration_slop: f32,
    correction_percent: f32,
    previous_pairs: BTreeMap<CollisionPair, EventKind>,
    events: Vec<PhysicsEvent>,
    last_contacts: Vec<ContactRecord>,
    frame: u64,
}

impl SimulationStepper {
    /// Stepper using the solver settings of `config`
    pub fn new(config: &PhysicsConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            gravity: config.gravity,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            solver_iterations: config.solver_iterations,
            penetration_slop: config.penetration_slop,
            correction_percent: config.correction_percent,
            previous_pairs: BTreeMap::new(),
            events: Vec::new(),
            last_contacts: Vec::new(),
            frame: 0,
        }
    }

    /// Number of completed steps
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Events accumulated since the last drain
    pub fn events(&self) -> &[PhysicsEvent] {
        &self.events
    }

    /// Take and clear the accumulated events
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Contacts and trigger overlaps found by the last step
    pub fn last_contacts(&self) -> &[ContactRecord] {
        &self.last_contacts
    }

    /// Drop every pair involving a deregistered component without emitting events
    pub fn forget(&mut self, id: ComponentId) {
        self.previous_pairs.retain(|pair, _| !pair.involves(id));
        self.last_contacts.retain(|record| record.a != id && record.b != id);
    }

    /// Advance the world by `dt` seconds
    pub fn step<N: NarrowPhase>(&mut self, registry: &mut ComponentRegistry, narrow: &N, dt: f32) -> StepStats {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!("Rejected time step {dt}; stepping with dt = 0");
            0.0
        };

        let mut stats = StepStats::default();
        self.integrate(registry, dt, &mut stats);

        // Broad phase
        let candidates = registry.index().overlapping_pairs();
        stats.candidate_pairs = candidates.len();

        // Narrow phase
        let mut current: Vec<(CollisionPair, EventKind, Contact)> = Vec::new();
        let mut solid: Vec<(ComponentHandle, ComponentHandle, Contact)> = Vec::new();
        for (ha, hb) in candidates {
            let (Some(a), Some(b)) = (registry.component_by_handle(ha), registry.component_by_handle(hb)) else {
                continue;
            };
            if !a.is_valid() || !b.is_valid() {
                continue;
            }
            let trigger = a.interactivity.is_trigger() || b.interactivity.is_trigger();
            if !trigger && !a.integrates() && !b.integrates() {
                continue;
            }
            let Some(contact) = narrow.contact(&a.world_shape(), &b.world_shape()) else {
                continue;
            };

            let pair = CollisionPair::new(a.id, b.id);
            let oriented = if pair.a == a.id { contact } else { contact.flipped() };
            if trigger {
                stats.triggers += 1;
                current.push((pair, EventKind::Trigger, oriented));
            } else {
                stats.contacts += 1;
                current.push((pair, EventKind::Contact, oriented));
                solid.push((ha, hb, contact));
            }
        }

        self.resolve(registry, &solid);
        self.emit_events(registry, &current);

        self.last_contacts = current
            .iter()
            .map(|(pair, kind, contact)| ContactRecord {
                a: pair.a,
                b: pair.b,
                kind: *kind,
                contact: *contact,
            })
            .collect();
        self.frame += 1;

        trace!(
            "Step {} ({} narrow phase, dt {dt}): {} integrated, {} skipped, {} candidates, {} contacts, {} triggers",
            self.frame,
            narrow.name(),
            stats.integrated,
            stats.skipped,
            stats.candidate_pairs,
            stats.contacts,
            stats.triggers
        );
        stats
    }

    /// Semi-implicit Euler over every dynamic / kinematic component
    fn integrate(&self, registry: &mut ComponentRegistry, dt: f32, stats: &mut StepStats) {
        let linear_factor = 1.0 / (1.0 + self.linear_damping * dt);
        let angular_factor = 1.0 / (1.0 + self.angular_damping * dt);

        let mut moved = Vec::new();
        for (handle, component) in registry.iter_mut() {
            if !component.integrates() {
                continue;
            }
            if !component.is_valid() {
                warn!("Skipping {} this frame: invalid transform, shape or velocity", component.id);
                stats.skipped += 1;
                continue;
            }

            if component.interactivity.is_dynamic() && component.inverse_mass() > 0.0 {
                component.velocity += self.gravity * dt;
            }
            component.velocity *= linear_factor;
            component.angular_velocity *= angular_factor;

            let transform = &mut component.transform;
            transform.position += component.velocity * dt;
            if component.angular_velocity != Vec3::zeros() {
                let spin = Quat::from_scaled_axis(component.angular_velocity * dt);
                transform.rotation = Quat::new_normalize((spin * transform.rotation).into_inner());
            }

            stats.integrated += 1;
            moved.push(handle);
        }

        for handle in moved {
            registry.refresh_bounds(handle);
        }
    }

    /// Impulse passes followed by positional correction
    fn resolve(&self, registry: &mut ComponentRegistry, contacts: &[(ComponentHandle, ComponentHandle, Contact)]) {
        if contacts.is_empty() {
            return;
        }

        let mut bodies: HashMap<ComponentHandle, BodyState> = HashMap::new();
        for &(ha, hb, _) in contacts {
            for handle in [ha, hb] {
                if let Some(component) = registry.component_by_handle(handle) {
                    bodies.entry(handle).or_insert(BodyState {
                        position: component.transform.position,
                        velocity: component.velocity,
                        inverse_mass: component.inverse_mass(),
                        restitution: component.restitution,
                    });
                }
            }
        }

        for _ in 0..self.solver_iterations {
            for &(ha, hb, contact) in contacts {
                let (Some(a), Some(b)) = (bodies.get(&ha).copied(), bodies.get(&hb).copied()) else {
                    continue;
                };
                let inverse_sum = a.inverse_mass + b.inverse_mass;
                if inverse_sum <= 0.0 {
                    continue;
                }

                let approach = (b.velocity - a.velocity).dot(&contact.normal);
                if approach >= 0.0 {
                    continue;
                }
                let restitution = a.restitution.max(b.restitution);
                let impulse = contact.normal * (-(1.0 + restitution) * approach / inverse_sum);

                if let Some(body) = bodies.get_mut(&ha) {
                    body.velocity -= impulse * a.inverse_mass;
                }
                if let Some(body) = bodies.get_mut(&hb) {
                    body.velocity += impulse * b.inverse_mass;
                }
            }
        }

        // Positional correction never pushes a pair deeper together
        for &(ha, hb, contact) in contacts {
            let (Some(a), Some(b)) = (bodies.get(&ha).copied(), bodies.get(&hb).copied()) else {
                continue;
            };
            let inverse_sum = a.inverse_mass + b.inverse_mass;
            if inverse_sum <= 0.0 {
                continue;
            }
            let magnitude = (contact.depth - self.penetration_slop).max(0.0) * self.correction_percent / inverse_sum;
            let correction = contact.normal * magnitude;
            if let Some(body) = bodies.get_mut(&ha) {
                body.position -= correction * a.inverse_mass;
            }
            if let Some(body) = bodies.get_mut(&hb) {
                body.position += correction * b.inverse_mass;
            }
        }

        for (handle, state) in bodies {
            if state.inverse_mass <= 0.0 {
                continue;
            }
            if let Some(component) = registry.component_mut_by_handle(handle) {
                component.transform.position = state.position;
                component.velocity = state.velocity;
            }
            registry.refresh_bounds(handle);
        }
    }

    /// Diff this frame's pairs against the previous frame
    fn emit_events(&mut self, registry: &ComponentRegistry, current: &[(CollisionPair, EventKind, Contact)]) {
        let mut next = BTreeMap::new();
        for &(pair, kind, contact) in current {
            let phase = match self.previous_pairs.get(&pair) {
                Some(previous_kind) if *previous_kind == kind => EventPhase::Stay,
                _ => EventPhase::Entered,
            };
            self.events.push(PhysicsEvent {
                kind,
                phase,
                a: pair.a,
                b: pair.b,
                contact: Some(contact),
            });
            next.insert(pair, kind);
        }

        let previous = std::mem::replace(&mut self.previous_pairs, next);
        for (pair, kind) in previous {
            let still_current = self.previous_pairs.get(&pair) == Some(&kind);
            if still_current || !registry.contains(pair.a) || !registry.contains(pair.b) {
                continue;
            }
            self.events.push(PhysicsEvent {
                kind,
                phase: EventPhase::Exited,
                a: pair.a,
                b: pair.b,
                contact: None,
            });
        }
    }
}
