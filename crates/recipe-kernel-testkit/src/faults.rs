//! Collaborators that fail on demand.
//!
//! Each wrapper passes calls through to an inner implementation until told
//! to fail, so tests can break one collaborator mid-scenario.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use recipe_kernel_core::ContentId;
use recipe_kernel_events::{EventError, EventFabric, NodeId};
use recipe_kernel_store::{Chunk, ChunkError, ChunkSource, ContentStore, StoreError};

const INJECTED: &str = "injected fault";

/// A content store whose reads or writes can be switched off.
pub struct FlakyContentStore<S> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl<S: ContentStore> FlakyContentStore<S> {
    /// Wrap `inner`, initially healthy.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Get the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail `get`, `has` and pin queries while set.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `put`, `pin` and `unpin` while set.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(INJECTED.into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: ContentStore> ContentStore for FlakyContentStore<S> {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        self.check(&self.fail_writes)?;
        let id = self.inner.put(bytes).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.get(id).await
    }

    async fn has(&self, id: &ContentId) -> Result<bool, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.has(id).await
    }

    async fn pin(&self, id: &ContentId) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.pin(id).await
    }

    async fn unpin(&self, id: &ContentId) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.unpin(id).await
    }

    async fn is_pinned(&self, id: &ContentId) -> Result<bool, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.is_pinned(id).await
    }

    async fn pinned(&self) -> Result<Vec<ContentId>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.pinned().await
    }

    async fn gc(&self) -> Result<usize, StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.gc().await
    }
}

/// A chunk source that reports chosen chunks as unavailable.
pub struct FlakyChunkSource<C> {
    inner: C,
    broken: Mutex<HashSet<ContentId>>,
    reads: AtomicUsize,
}

impl<C: ChunkSource> FlakyChunkSource<C> {
    /// Wrap `inner`, initially healthy.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            broken: Mutex::new(HashSet::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Get the wrapped source.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Make reads of `id` fail.
    pub fn break_chunk(&self, id: impl Into<ContentId>) {
        self.broken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into());
    }

    /// Make reads of `id` succeed again.
    pub fn heal_chunk(&self, id: &ContentId) {
        self.broken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
    }

    /// Total `get_chunk` calls, failed or not.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: ChunkSource> ChunkSource for FlakyChunkSource<C> {
    async fn get_chunk(&self, id: &ContentId) -> Result<Chunk, ChunkError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let broken = self
            .broken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id);
        if broken {
            return Err(ChunkError::Unavailable {
                id: id.clone(),
                reason: INJECTED.into(),
            });
        }

        self.inner.get_chunk(id).await
    }

    fn verify_chunk(&self, chunk: &Chunk) -> bool {
        self.inner.verify_chunk(chunk)
    }
}

/// An event fabric that can refuse publishes and counts attempts.
pub struct FlakyFabric<F> {
    inner: Arc<F>,
    down: AtomicBool,
    fail_next: AtomicU32,
    attempts: AtomicUsize,
}

impl<F: EventFabric> FlakyFabric<F> {
    /// Wrap `inner`, initially healthy.
    pub fn new(inner: Arc<F>) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
            fail_next: AtomicU32::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Get the wrapped fabric.
    pub fn inner(&self) -> &Arc<F> {
        &self.inner
    }

    /// Fail every publish while set.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fail the next `n` publishes, then recover.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Total publish attempts, failed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F: EventFabric> EventFabric for FlakyFabric<F> {
    async fn start(&self) -> Result<(), EventError> {
        self.inner.start().await
    }

    async fn stop(&self) -> Result<(), EventError> {
        self.inner.stop().await
    }

    async fn publish(&self, topic: &str, payload: Value) -> Result<(), EventError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.down.load(Ordering::SeqCst) {
            return Err(EventError::Transport(INJECTED.into()));
        }
        let skipped = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if skipped {
            return Err(EventError::Transport(INJECTED.into()));
        }

        self.inner.publish(topic, payload).await
    }

    fn local_node_id(&self) -> NodeId {
        self.inner.local_node_id()
    }
}
