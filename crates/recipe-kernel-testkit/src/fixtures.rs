//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a kernel wired to in-memory
//! collaborators, each wrapped so it can be broken on demand.

use std::sync::Arc;

use recipe_kernel::{KernelConfig, RecipeKernel, Result};
use recipe_kernel_core::{ContentId, Metadata, MetadataValue, Recipe};
use recipe_kernel_events::{MemoryFabric, MemoryHub, NodeId, RetryPolicy, Subscription};
use recipe_kernel_store::{MemoryChunkStore, MemoryContentStore};

use crate::faults::{FlakyChunkSource, FlakyContentStore, FlakyFabric};

/// The kernel type the fixture builds.
pub type TestKernel = RecipeKernel<
    Arc<FlakyContentStore<MemoryContentStore>>,
    FlakyChunkSource<MemoryChunkStore>,
    FlakyFabric<MemoryFabric>,
>;

/// A kernel plus handles on each of its collaborators.
pub struct KernelFixture {
    pub kernel: TestKernel,
    pub store: Arc<FlakyContentStore<MemoryContentStore>>,
    pub chunks: Arc<FlakyChunkSource<MemoryChunkStore>>,
    pub fabric: Arc<FlakyFabric<MemoryFabric>>,
    pub hub: Arc<MemoryHub>,
}

impl KernelFixture {
    /// A fixture with the default config, except that failed publishes are
    /// retried without delay.
    pub fn new() -> Self {
        Self::with_config(KernelConfig {
            notify: RetryPolicy {
                max_attempts: 3,
                base_delay: std::time::Duration::ZERO,
                max_delay: std::time::Duration::ZERO,
            },
            ..KernelConfig::default()
        })
    }

    /// A fixture with the given config.
    ///
    /// Chunks `c1` = "hello " and `c2` = "world" are preloaded.
    pub fn with_config(config: KernelConfig) -> Self {
        let store = Arc::new(FlakyContentStore::new(MemoryContentStore::new()));

        let memory_chunks = MemoryChunkStore::new();
        memory_chunks.insert("c1", &b"hello "[..]);
        memory_chunks.insert("c2", &b"world"[..]);
        let chunks = Arc::new(FlakyChunkSource::new(memory_chunks));

        let hub = MemoryHub::new(256);
        let fabric = Arc::new(FlakyFabric::new(Arc::new(hub.fabric(NodeId::random()))));

        let kernel = RecipeKernel::new(
            Arc::clone(&store),
            Arc::clone(&chunks),
            Arc::clone(&fabric),
            config,
        );

        Self {
            kernel,
            store,
            chunks,
            fabric,
            hub,
        }
    }

    /// A started fixture with the default config.
    pub async fn started() -> Self {
        let fixture = Self::new();
        // The in-memory fabric cannot fail to start.
        let _ = fixture.kernel.start().await;
        fixture
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    /// Register an extra chunk.
    pub fn add_chunk(&self, id: impl Into<ContentId>, data: &'static [u8]) {
        self.chunks.inner().insert(id, data);
    }

    /// Create the `demo` recipe: chunks c1, c2 by alice.
    pub async fn create_demo(&self) -> Result<Recipe> {
        self.kernel
            .create(vec!["c1".into(), "c2".into()], metadata("demo"), "alice")
            .await
    }
}

impl Default for KernelFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `{"name": name}`.
pub fn metadata(name: &str) -> Metadata {
    let mut m = Metadata::new();
    m.insert("name".into(), MetadataValue::from(name));
    m
}

/// Install a test-writer tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
