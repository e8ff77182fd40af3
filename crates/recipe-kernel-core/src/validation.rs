//! Recipe validation: structural checks on a recipe body.
//!
//! Chunk integrity is not checked here; that needs chunk access and lives in
//! the kernel's validation pipeline.

use crate::error::ValidationError;
use crate::recipe::{RecipeBody, RECIPE_VERSION};

/// Validate a recipe body's structure.
///
/// This performs:
/// - Version check
/// - Non-empty chunk list, no empty chunk ids
/// - Non-empty creator
/// - `created_at <= updated_at`
pub fn validate_body(body: &RecipeBody) -> Result<(), ValidationError> {
    if body.version != RECIPE_VERSION {
        return Err(ValidationError::UnsupportedVersion(body.version));
    }

    if body.chunks.is_empty() {
        return Err(ValidationError::EmptyChunks);
    }

    if let Some(pos) = body.chunks.iter().position(|c| c.is_empty()) {
        return Err(ValidationError::EmptyChunkId(pos));
    }

    if body.creator.is_empty() {
        return Err(ValidationError::EmptyCreator);
    }

    if body.created_at > body.updated_at {
        return Err(ValidationError::TimestampOrder {
            created_at: body.created_at,
            updated_at: body.updated_at,
        });
    }

    Ok(())
}
