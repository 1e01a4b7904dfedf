//! Error types for the physics system

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::physics::ComponentId;

/// Physics system errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// A component with this id is already registered
    #[error("{0} is already registered")]
    DuplicateRegistration(ComponentId),

    /// No registered component has this id
    #[error("{0} is not registered")]
    UnknownComponent(ComponentId),

    /// Ray origin or direction is unusable
    #[error("Invalid ray: origin {origin:?}, direction {direction:?}")]
    InvalidRay {
        /// Ray origin as given
        origin: Vec3,
        /// Ray direction as given
        direction: Vec3,
    },
}

/// Result type for physics operations
pub type PhysicsResult<T> = std::result::Result<T, PhysicsError>;
