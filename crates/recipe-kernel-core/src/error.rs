//! Error types for the Recipe Kernel Core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding recipes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported recipe version: {0}")]
    UnsupportedVersion(u8),

    #[error("malformed recipe: {0}")]
    MalformedRecipe(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("non-canonical encoding")]
    NonCanonical,
}

/// Structural errors in a recipe body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipe has no chunks")]
    EmptyChunks,

    #[error("chunk at position {0} has an empty id")]
    EmptyChunkId(usize),

    #[error("recipe has no creator")]
    EmptyCreator,

    #[error("created_at {created_at} is after updated_at {updated_at}")]
    TimestampOrder { created_at: i64, updated_at: i64 },

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
}

impl From<ValidationError> for CoreError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::UnsupportedVersion(v) => CoreError::UnsupportedVersion(v),
            other => CoreError::MalformedRecipe(other.to_string()),
        }
    }
}
