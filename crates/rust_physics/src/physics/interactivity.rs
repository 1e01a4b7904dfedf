//! Interactivity categories for filtering and simulation treatment
//!
//! Every component carries a set of base categories. Query filters are the
//! same type; a component matches a filter when the two share at least one
//! category.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// How a component takes part in simulation and queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Interactivity: u32 {
        /// Never moves; collision target only
        const STATIC = 1 << 0;
        /// Integrated and pushed by impulses
        const DYNAMIC = 1 << 1;
        /// Detects overlaps, never takes part in impulse resolution
        const TRIGGER = 1 << 2;
        /// Moved by its own velocity, treated as infinite mass by others
        const KINEMATIC = 1 << 3;
        /// Every base category
        const ALL = Self::STATIC.bits() | Self::DYNAMIC.bits() | Self::TRIGGER.bits() | Self::KINEMATIC.bits();
    }
}

impl Interactivity {
    /// No category (matches nothing)
    pub const NONE: Self = Self::empty();

    /// Inclusive-or match: true when `self` and `filter` share any category
    pub fn matches(self, filter: Interactivity) -> bool {
        self.intersects(filter)
    }

    /// Static components never integrate; STATIC wins over DYNAMIC
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// True for trigger volumes
    pub fn is_trigger(self) -> bool {
        self.contains(Self::TRIGGER)
    }

    /// True for gameplay-driven movers
    pub fn is_kinematic(self) -> bool {
        self.contains(Self::KINEMATIC) && !self.is_static()
    }

    /// True when the component is simulated as a dynamic body
    pub fn is_dynamic(self) -> bool {
        self.contains(Self::DYNAMIC) && !self.is_static()
    }

    /// True when the flags let the stepper advance the component's position
    pub fn integrates(self) -> bool {
        self.is_dynamic() || self.is_kinematic()
    }

    /// True when contact impulses may change the component's velocity
    pub fn receives_impulses(self) -> bool {
        self.is_dynamic() && !self.is_kinematic() && !self.is_trigger()
    }
}
