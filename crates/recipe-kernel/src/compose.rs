//! Composition: rebuilding an artifact from a recipe's chunks.
//!
//! The artifact is the exact concatenation of the chunk contents in recipe
//! order. A chunk listed twice appears twice. Nothing is reordered, merged,
//! or deduplicated.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use recipe_kernel_core::{Recipe, ValidationError};
use recipe_kernel_store::ChunkSource;

use crate::error::{KernelError, Result};
use crate::reads::{read_each, ReadLimit};

/// Compose `recipe` with unbounded concurrent reads.
pub async fn compose<C>(source: &Arc<C>, recipe: &Recipe) -> Result<Bytes>
where
    C: ChunkSource + ?Sized + 'static,
{
    compose_with(source, recipe, &ReadLimit::unbounded()).await
}

/// Compose `recipe`, bounding in-flight reads by `limit`.
///
/// All or nothing: if any chunk cannot be retrieved the result is
/// `ChunkUnavailable` naming the earliest such chunk in recipe order.
pub async fn compose_with<C>(source: &Arc<C>, recipe: &Recipe, limit: &ReadLimit) -> Result<Bytes>
where
    C: ChunkSource + ?Sized + 'static,
{
    let chunks = recipe.chunks();
    if chunks.is_empty() {
        return Err(KernelError::InvalidRecipe(ValidationError::EmptyChunks));
    }

    let fetched = read_each(source, chunks, limit, |_, _, fetched| fetched).await;

    let mut parts = Vec::with_capacity(chunks.len());
    for (id, slot) in chunks.iter().zip(fetched) {
        match slot {
            Some(Ok(chunk)) => parts.push(chunk.data),
            Some(Err(e)) => {
                tracing::debug!(recipe = %recipe.id, chunk = %id, error = %e, "chunk unavailable");
                return Err(KernelError::ChunkUnavailable { id: id.clone() });
            }
            None => return Err(KernelError::ChunkUnavailable { id: id.clone() }),
        }
    }

    let total = parts.iter().map(Bytes::len).sum();
    let mut artifact = BytesMut::with_capacity(total);
    for part in &parts {
        artifact.extend_from_slice(part);
    }

    tracing::debug!(recipe = %recipe.id, chunks = chunks.len(), size = total, "composed artifact");
    Ok(artifact.freeze())
}
