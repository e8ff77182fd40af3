//! Error types for the Kernel.

use recipe_kernel_core::{ContentId, ValidationError};
use recipe_kernel_events::EventError;
use recipe_kernel_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// No recipe is stored under this id.
    #[error("recipe not found: {0}")]
    NotFound(ContentId),

    /// The stored bytes do not decode to a recipe.
    #[error("recipe {id} is corrupt: {reason}")]
    Corrupt { id: ContentId, reason: String },

    /// The content store could not be reached or failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A chunk could not be retrieved during composition.
    #[error("chunk unavailable: {id}")]
    ChunkUnavailable { id: ContentId },

    /// A recipe failed validation where it had to be trusted.
    #[error("integrity check failed for recipe {id}")]
    IntegrityFailure { id: ContentId },

    /// The recipe is structurally unusable.
    #[error("invalid recipe: {0}")]
    InvalidRecipe(#[from] ValidationError),

    /// A mutating operation was attempted before `start` or after `stop`.
    #[error("kernel not started")]
    NotStarted,

    /// The event fabric failed to start or stop.
    #[error("event fabric error: {0}")]
    Events(#[from] EventError),
}

impl From<StoreError> for KernelError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => KernelError::NotFound(id),
            StoreError::Corrupt { id, reason } => KernelError::Corrupt { id, reason },
            StoreError::Unavailable(reason) => KernelError::StorageUnavailable(reason),
            other => KernelError::StorageUnavailable(other.to_string()),
        }
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
