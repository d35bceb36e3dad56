//! # ECS Error Types
//!
//! All errors that can surface from the ECS core.

use thiserror::Error;

use crate::ecs::ComponentTypeId;

/// Errors that can occur in the ECS core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A system declared no required component types.
    #[error("system `{system}` declares no required component types")]
    EmptyRequirements {
        /// Name of the rejected system.
        system: String,
    },

    /// A component type index that this ECS instance never issued.
    #[error("unknown component type: {0}")]
    UnknownComponentType(ComponentTypeId),

    /// The entity index is not live (never created, or already destroyed).
    #[error("entity {0} is not alive")]
    EntityNotAlive(u32),

    /// A type-erased component value does not match its registered type.
    #[error("component value for type {type_id} is not a `{expected}`")]
    ComponentTypeMismatch {
        /// Target component type.
        type_id: ComponentTypeId,
        /// Rust type name registered for that index.
        expected: &'static str,
    },

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
