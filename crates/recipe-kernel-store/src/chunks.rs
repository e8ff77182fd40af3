//! Chunk access: fetching chunk bytes by id and checking their integrity.
//!
//! Chunks are produced elsewhere. The kernel only reads them, through the
//! [`ChunkSource`] trait.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use recipe_kernel_core::{Blake3Hash, ContentId};

use crate::error::ChunkError;
use crate::traits::ContentStore;

/// A fetched chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The id the chunk was requested under.
    pub id: ContentId,

    /// The chunk bytes.
    pub data: Bytes,

    /// Blake3 digest recorded when the chunk was produced.
    pub checksum: Blake3Hash,
}

impl Chunk {
    /// Create a chunk, recording the checksum of `data`.
    pub fn new(id: impl Into<ContentId>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            id: id.into(),
            checksum: Blake3Hash::hash(&data),
            data,
        }
    }

    /// Check the data against the recorded checksum.
    pub fn verify(&self) -> bool {
        Blake3Hash::hash(&self.data) == self.checksum
    }

    /// Length of the chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Chunk access: retrieval plus integrity check.
///
/// Implementations must be thread-safe; composition and validation issue
/// reads for different chunks concurrently.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Fetch a chunk by id.
    async fn get_chunk(&self, id: &ContentId) -> Result<Chunk, ChunkError>;

    /// Check a fetched chunk's integrity.
    fn verify_chunk(&self, chunk: &Chunk) -> bool {
        chunk.verify()
    }
}

#[async_trait]
impl<C: ChunkSource + ?Sized> ChunkSource for Arc<C> {
    async fn get_chunk(&self, id: &ContentId) -> Result<Chunk, ChunkError> {
        (**self).get_chunk(id).await
    }

    fn verify_chunk(&self, chunk: &Chunk) -> bool {
        (**self).verify_chunk(chunk)
    }
}

/// In-memory chunk source.
///
/// Chunks may be registered under arbitrary ids; integrity is checked against
/// the checksum recorded at insert time.
#[derive(Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<ContentId, Chunk>>,
}

impl MemoryChunkStore {
    /// Create an empty chunk store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` under `id`, recording its checksum.
    pub fn insert(&self, id: impl Into<ContentId>, data: impl Into<Bytes>) {
        self.insert_chunk(Chunk::new(id, data));
    }

    /// Register `data` under its own content id.
    pub fn insert_content(&self, data: impl Into<Bytes>) -> ContentId {
        let data = data.into();
        let id = ContentId::for_bytes(&data);
        self.insert(id.clone(), data);
        id
    }

    /// Register a chunk as-is, including its recorded checksum.
    pub fn insert_chunk(&self, chunk: Chunk) {
        if let Ok(mut chunks) = self.chunks.write() {
            chunks.insert(chunk.id.clone(), chunk);
        }
    }

    /// Remove a chunk. Returns whether it existed.
    pub fn remove(&self, id: &ContentId) -> bool {
        self.chunks
            .write()
            .map(|mut chunks| chunks.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Number of registered chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether no chunks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChunkSource for MemoryChunkStore {
    async fn get_chunk(&self, id: &ContentId) -> Result<Chunk, ChunkError> {
        let chunks = self.chunks.read().map_err(|e| ChunkError::Unavailable {
            id: id.clone(),
            reason: format!("lock poisoned: {}", e),
        })?;

        chunks
            .get(id)
            .cloned()
            .ok_or_else(|| ChunkError::Missing(id.clone()))
    }
}

/// Chunk source backed by a [`ContentStore`].
///
/// Chunks are plain blobs; a chunk is intact when its bytes hash to its id.
pub struct ContentChunkSource<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> ContentChunkSource<S> {
    /// Read chunks from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: ContentStore> ChunkSource for ContentChunkSource<S> {
    async fn get_chunk(&self, id: &ContentId) -> Result<Chunk, ChunkError> {
        match self.store.get(id).await {
            Ok(Some(data)) => Ok(Chunk::new(id.clone(), data)),
            Ok(None) => Err(ChunkError::Missing(id.clone())),
            Err(e) => Err(ChunkError::Unavailable {
                id: id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn verify_chunk(&self, chunk: &Chunk) -> bool {
        ContentId::for_bytes(&chunk.data) == chunk.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryContentStore;

    #[tokio::test]
    async fn test_memory_chunk_store() {
        let chunks = MemoryChunkStore::new();
        chunks.insert("c1", &b"hello "[..]);

        let chunk = chunks.get_chunk(&"c1".into()).await.unwrap();
        assert_eq!(&chunk.data[..], b"hello ");
        assert!(chunks.verify_chunk(&chunk));

        let missing = chunks.get_chunk(&"c9".into()).await;
        assert!(matches!(missing, Err(ChunkError::Missing(id)) if id.as_str() == "c9"));
    }

    #[tokio::test]
    async fn test_tampered_chunk_fails_verification() {
        let chunks = MemoryChunkStore::new();
        let good = Chunk::new("c1", &b"original"[..]);
        chunks.insert_chunk(Chunk {
            data: Bytes::from_static(b"tampered"),
            ..good
        });

        let chunk = chunks.get_chunk(&"c1".into()).await.unwrap();
        assert!(!chunks.verify_chunk(&chunk));
    }

    #[tokio::test]
    async fn test_content_chunk_source() {
        let store = Arc::new(MemoryContentStore::new());
        let id = store.put(b"payload").await.unwrap();
        let source = ContentChunkSource::new(Arc::clone(&store));

        let chunk = source.get_chunk(&id).await.unwrap();
        assert!(source.verify_chunk(&chunk));

        // Same bytes, wrong id: fails the content check.
        let forged = Chunk::new("not-the-hash", chunk.data.clone());
        assert!(!source.verify_chunk(&forged));

        let missing = source.get_chunk(&ContentId::for_bytes(b"nope")).await;
        assert!(matches!(missing, Err(ChunkError::Missing(_))));
    }
}
