//! Configuration system
//!
//! [`PhysicsConfig`] is plain serde data; the [`Config`] trait loads and saves
//! it as TOML or RON depending on the file extension.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;
use crate::spatial::{GridConfig, OctreeConfig, AABB};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            self.to_toml_string()?
        } else if path.ends_with(".ron") {
            self.to_ron_string()?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to a TOML document
    fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Serialize to a RON document
    fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Which narrow-phase strategy a world is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NarrowPhaseKind {
    /// Exact sphere / box / mesh tests
    #[default]
    Exact,
    /// Bounding boxes only (cheap, coarse)
    Aabb,
}

/// Which spatial index a world is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BroadPhaseKind {
    /// Loose octree over `world_bounds`
    #[default]
    Octree,
    /// Hashed uniform grid
    UniformGrid,
}

/// World-level physics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity applied to dynamic components (units / s^2)
    pub gravity: Vec3,

    /// Fraction of linear velocity removed per second
    pub linear_damping: f32,

    /// Fraction of angular velocity removed per second
    pub angular_damping: f32,

    /// Impulse passes over the contact list per step
    pub solver_iterations: u32,

    /// Penetration depth tolerated without positional correction
    pub penetration_slop: f32,

    /// Share of the remaining penetration removed per positional pass (0..=1)
    pub correction_percent: f32,

    /// Narrow-phase backend
    pub narrow_phase: NarrowPhaseKind,

    /// Broad-phase backend
    pub broad_phase: BroadPhaseKind,

    /// Minimum corner of the region the octree covers
    pub world_bounds_min: Vec3,

    /// Maximum corner of the region the octree covers
    pub world_bounds_max: Vec3,

    /// Initial state of the debug draw toggle
    pub debug_enabled: bool,

    /// Octree tuning
    pub octree: OctreeConfig,

    /// Uniform grid tuning
    pub grid: GridConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::zeros(),
            linear_damping: 0.0,
            angular_damping: 0.05,
            solver_iterations: 4,
            penetration_slop: 0.001,
            correction_percent: 0.8,
            narrow_phase: NarrowPhaseKind::default(),
            broad_phase: BroadPhaseKind::default(),
            world_bounds_min: Vec3::new(-512.0, -512.0, -512.0),
            world_bounds_max: Vec3::new(512.0, 512.0, 512.0),
            debug_enabled: false,
            octree: OctreeConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl Config for PhysicsConfig {}

impl PhysicsConfig {
    /// Octree world bounds as an AABB
    pub fn world_bounds(&self) -> AABB {
        AABB::new(self.world_bounds_min, self.world_bounds_max)
    }

    /// Builder: select the narrow phase
    pub fn with_narrow_phase(mut self, kind: NarrowPhaseKind) -> Self {
        self.narrow_phase = kind;
        self
    }

    /// Builder: select the broad phase
    pub fn with_broad_phase(mut self, kind: BroadPhaseKind) -> Self {
        self.broad_phase = kind;
        self
    }

    /// Builder: set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Clamp values that would make the solver misbehave
    pub fn sanitized(mut self) -> Self {
        self.solver_iterations = self.solver_iterations.max(1);
        self.correction_percent = self.correction_percent.clamp(0.0, 1.0);
        self.penetration_slop = self.penetration_slop.max(0.0);
        self.linear_damping = self.linear_damping.max(0.0);
        self.angular_damping = self.angular_damping.max(0.0);
        if !self.gravity.iter().all(|g| g.is_finite()) {
            self.gravity = Vec3::zeros();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_round_trip_keeps_backend_choice() {
        let config = PhysicsConfig::default()
            .with_narrow_phase(NarrowPhaseKind::Aabb)
            .with_broad_phase(BroadPhaseKind::UniformGrid)
            .with_gravity(Vec3::new(0.0, -9.81, 0.0));

        let text = config.to_toml_string().unwrap();
        let parsed = PhysicsConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = PhysicsConfig {
            solver_iterations: 9,
            debug_enabled: true,
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        let parsed = PhysicsConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed = PhysicsConfig::from_toml_str("solver_iterations = 2\n").unwrap();
        assert_eq!(parsed.solver_iterations, 2);
        assert_eq!(parsed.broad_phase, BroadPhaseKind::Octree);
        assert_eq!(parsed.octree, OctreeConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = PhysicsConfig::default().save_to_file("physics.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_sanitized_clamps() {
        let config = PhysicsConfig {
            solver_iterations: 0,
            correction_percent: 4.0,
            gravity: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.solver_iterations, 1);
        assert_eq!(config.correction_percent, 1.0);
        assert_eq!(config.gravity, Vec3::zeros());
    }
}
