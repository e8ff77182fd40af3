//! Error types for the store module.

use recipe_kernel_core::ContentId;
use thiserror::Error;

/// Errors that can occur during content store and recipe store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob (or no pin, for unpin) exists for the id.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// A stored recipe failed to decode.
    #[error("corrupt content {id}: {reason}")]
    Corrupt { id: ContentId, reason: String },

    /// The backing store cannot be reached or written.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from chunk access.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The chunk does not exist.
    #[error("chunk missing: {0}")]
    Missing(ContentId),

    /// The chunk could not be fetched.
    #[error("chunk {id} unavailable: {reason}")]
    Unavailable { id: ContentId, reason: String },
}

impl ChunkError {
    /// The id of the chunk that failed.
    pub fn id(&self) -> &ContentId {
        match self {
            ChunkError::Missing(id) => id,
            ChunkError::Unavailable { id, .. } => id,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
