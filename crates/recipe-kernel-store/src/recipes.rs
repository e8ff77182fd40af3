//! Recipe persistence on top of a [`ContentStore`].
//!
//! A recipe's id is whatever the content store returns for the canonical
//! bytes of its body, so identical bodies deduplicate to one id.

use recipe_kernel_core::{canonical_bytes, decode_body, ContentId, Recipe, RecipeBody};

use crate::error::{Result, StoreError};
use crate::traits::ContentStore;

/// Stores and loads recipes as canonical CBOR blobs.
pub struct RecipeStore<S: ContentStore> {
    content: S,
}

impl<S: ContentStore> RecipeStore<S> {
    /// Wrap a content store.
    pub fn new(content: S) -> Self {
        Self { content }
    }

    /// Get the underlying content store.
    pub fn content(&self) -> &S {
        &self.content
    }

    /// Serialize and store a body, returning its content id.
    ///
    /// Writes exactly one blob. Any store failure surfaces as
    /// [`StoreError::Unavailable`].
    pub async fn put(&self, body: &RecipeBody) -> Result<ContentId> {
        let bytes = canonical_bytes(body);
        let id = self.content.put(&bytes).await.map_err(into_unavailable)?;

        tracing::trace!(%id, size = bytes.len(), "stored recipe body");
        Ok(id)
    }

    /// Load and decode the recipe stored under `id`.
    ///
    /// `NotFound` if no blob exists, `Corrupt` if it does not decode.
    pub async fn get(&self, id: &ContentId) -> Result<Recipe> {
        let bytes = self
            .content
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let body = decode_body(&bytes).map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Recipe::new(id.clone(), body))
    }

    /// Unpin the recipe stored under `id`.
    ///
    /// `NotFound` if `id` is not pinned, including when it was already deleted.
    pub async fn delete(&self, id: &ContentId) -> Result<()> {
        self.content.unpin(id).await
    }

    /// Whether `id` is a live (pinned) recipe blob.
    pub async fn contains(&self, id: &ContentId) -> Result<bool> {
        self.content.is_pinned(id).await
    }
}

/// Writes fail only because the store is unreachable or broken.
fn into_unavailable(e: StoreError) -> StoreError {
    match e {
        StoreError::Unavailable(_) => e,
        other => StoreError::Unavailable(other.to_string()),
    }
}
