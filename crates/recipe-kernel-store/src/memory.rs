//! In-memory implementation of the ContentStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use recipe_kernel_core::ContentId;

use crate::error::{Result, StoreError};
use crate::traits::ContentStore;

/// In-memory content store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryContentStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Blobs indexed by content id.
    blobs: HashMap<ContentId, Bytes>,

    /// The local pin set.
    pins: HashSet<ContentId>,
}

impl MemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Number of blobs held, pinned or not.
    pub fn blob_count(&self) -> usize {
        self.read().map(|inner| inner.blobs.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let id = ContentId::for_bytes(bytes);
        let mut inner = self.write()?;

        inner
            .blobs
            .entry(id.clone())
            .or_insert_with(|| Bytes::copy_from_slice(bytes));
        inner.pins.insert(id.clone());

        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>> {
        let inner = self.read()?;
        Ok(inner.blobs.get(id).cloned())
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.blobs.contains_key(id))
    }

    async fn pin(&self, id: &ContentId) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.blobs.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        inner.pins.insert(id.clone());
        Ok(())
    }

    async fn unpin(&self, id: &ContentId) -> Result<()> {
        let mut inner = self.write()?;
        if inner.pins.remove(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.clone()))
        }
    }

    async fn is_pinned(&self, id: &ContentId) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.pins.contains(id))
    }

    async fn pinned(&self) -> Result<Vec<ContentId>> {
        let inner = self.read()?;
        let mut ids: Vec<ContentId> = inner.pins.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn gc(&self) -> Result<usize> {
        let mut inner = self.write()?;
        let MemoryStoreInner { blobs, pins } = &mut *inner;

        let before = blobs.len();
        blobs.retain(|id, _| pins.contains(id));
        Ok(before - blobs.len())
    }
}
