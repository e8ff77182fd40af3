//! ContentStore trait: the abstract interface for content-addressed blobs.
//!
//! This trait allows the kernel to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use recipe_kernel_core::ContentId;

use crate::error::Result;

/// The ContentStore trait: async interface for content-addressed blobs.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Content addressing**: `put` derives the key with [`ContentId::for_bytes`].
///   Storing identical bytes twice yields the same id and one blob.
/// - **Pinning**: `put` pins the blob. Unpinned blobs stay readable until
///   [`ContentStore::gc`] removes them.
/// - **Strict unpin**: unpinning an id that is not pinned is `NotFound`, not
///   a silent success.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob and pin it, returning its content id.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId>;

    /// Fetch a blob by id.
    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>>;

    /// Check if a blob exists (pinned or not).
    async fn has(&self, id: &ContentId) -> Result<bool>;

    /// Pin an existing blob. `NotFound` if no blob exists for the id.
    async fn pin(&self, id: &ContentId) -> Result<()>;

    /// Unpin a blob. `NotFound` if the id is not in the pin set.
    async fn unpin(&self, id: &ContentId) -> Result<()>;

    /// Check if a blob is pinned.
    async fn is_pinned(&self, id: &ContentId) -> Result<bool>;

    /// List all pinned ids.
    async fn pinned(&self) -> Result<Vec<ContentId>>;

    /// Remove every unpinned blob. Returns how many were removed.
    async fn gc(&self) -> Result<usize>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        (**self).put(bytes).await
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>> {
        (**self).get(id).await
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        (**self).has(id).await
    }

    async fn pin(&self, id: &ContentId) -> Result<()> {
        (**self).pin(id).await
    }

    async fn unpin(&self, id: &ContentId) -> Result<()> {
        (**self).unpin(id).await
    }

    async fn is_pinned(&self, id: &ContentId) -> Result<bool> {
        (**self).is_pinned(id).await
    }

    async fn pinned(&self) -> Result<Vec<ContentId>> {
        (**self).pinned().await
    }

    async fn gc(&self) -> Result<usize> {
        (**self).gc().await
    }
}
