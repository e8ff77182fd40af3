//! Laws the kernel must uphold for any input.

use std::sync::Arc;

use proptest::prelude::*;

use recipe_kernel::events::{MemoryHub, NodeId};
use recipe_kernel::store::{
    ContentChunkSource, ContentStore, MemoryChunkStore, MemoryContentStore, RecipeStore,
    SqliteContentStore,
};
use recipe_kernel::{compose, validate, KernelConfig, Recipe, RecipeKernel};
use recipe_kernel_testkit::generators::{body_from_params, chunk_list, metadata, RecipeParams};
use recipe_kernel_testkit::{init_tracing, KernelFixture};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// get(put(r)) has the same chunks in the same order, metadata, creator
    /// and value.
    #[test]
    fn store_round_trip(params: RecipeParams) {
        let rt = runtime();
        let body = body_from_params(&params);

        let recipe = rt.block_on(async {
            let store = RecipeStore::new(MemoryContentStore::new());
            let id = store.put(&body).await.unwrap();
            store.get(&id).await.unwrap()
        });

        prop_assert_eq!(recipe.chunks(), &body.chunks[..]);
        prop_assert_eq!(recipe.metadata(), &body.metadata);
        prop_assert_eq!(recipe.creator(), body.creator.as_str());
        prop_assert_eq!(recipe.value(), body.value);
        prop_assert!(recipe.is_consistent());
    }

    /// Field-identical bodies share an id, across store backends.
    #[test]
    fn identical_bodies_identical_ids(params: RecipeParams) {
        let rt = runtime();
        let (a, b) = rt.block_on(async {
            let memory = RecipeStore::new(MemoryContentStore::new());
            let sqlite = RecipeStore::new(SqliteContentStore::open_memory().unwrap());
            (
                memory.put(&body_from_params(&params)).await.unwrap(),
                sqlite.put(&body_from_params(&params)).await.unwrap(),
            )
        });
        prop_assert_eq!(a, b);
    }

    /// Composition is the concatenation of chunk contents, and idempotent.
    #[test]
    fn compose_is_concatenation(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8),
        order in prop::collection::vec(0usize..8, 1..12),
    ) {
        let rt = runtime();
        let store = Arc::new(MemoryContentStore::new());
        let source = Arc::new(ContentChunkSource::new(Arc::clone(&store)));

        let (ids, expected, first, second) = rt.block_on(async {
            let mut ids = Vec::new();
            for data in &contents {
                ids.push(store.put(data).await.unwrap());
            }

            let picks: Vec<usize> = order.iter().map(|i| i % contents.len()).collect();
            let chunk_ids: Vec<_> = picks.iter().map(|&i| ids[i].clone()).collect();
            let expected: Vec<u8> = picks.iter().flat_map(|&i| contents[i].clone()).collect();

            let body = recipe_kernel::core::RecipeBuilder::new("alice")
                .chunks(chunk_ids.clone())
                .build();
            let recipe = Recipe::new(body.compute_id(), body);

            let first = compose(&source, &recipe).await.unwrap();
            let second = compose(&source, &recipe).await.unwrap();
            (chunk_ids, expected, first, second)
        });

        prop_assert!(!ids.is_empty());
        prop_assert_eq!(&first[..], &expected[..]);
        prop_assert_eq!(first, second);
    }

    /// validate is true iff every chunk is retrievable and intact.
    #[test]
    fn validate_iff_all_chunks_intact(chunks in chunk_list(6), drop_index in any::<prop::sample::Index>()) {
        let rt = runtime();
        let source = Arc::new(MemoryChunkStore::new());
        for id in &chunks {
            source.insert(id.clone(), id.as_str().as_bytes().to_vec());
        }

        let body = recipe_kernel::core::RecipeBuilder::new("alice").chunks(chunks.clone()).build();
        let recipe = Recipe::new(body.compute_id(), body);

        let (before, after) = rt.block_on(async {
            let before = validate(&source, &recipe).await;
            source.remove(drop_index.get(&chunks));
            let after = validate(&source, &recipe).await;
            (before, after)
        });

        prop_assert!(before);
        prop_assert!(!after);
    }

    /// Any patch, empty or not, moves to a new id on the kernel.
    #[test]
    fn every_update_yields_new_id(patch in metadata(3)) {
        let rt = runtime();
        let (old, new) = rt.block_on(async {
            let fixture = KernelFixture::started().await;
            let v1 = fixture.create_demo().await.unwrap();
            let v2 = fixture.kernel.update(&v1.id, patch.clone()).await.unwrap();
            (v1, v2)
        });

        prop_assert_ne!(&old.id, &new.id);
        prop_assert!(new.updated_at() > old.updated_at());
        for (k, v) in &patch {
            prop_assert_eq!(&new.metadata()[k], v);
        }
    }
}

#[tokio::test]
async fn sqlite_kernel_survives_restart() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("recipes.db");

    let chunks = Arc::new(MemoryChunkStore::new());
    chunks.insert("c1", &b"hello "[..]);
    chunks.insert("c2", &b"world"[..]);
    let hub = MemoryHub::new(16);

    let recipe = {
        let kernel = RecipeKernel::new(
            SqliteContentStore::open(&path)?,
            Arc::clone(&chunks),
            Arc::new(hub.fabric(NodeId::random())),
            KernelConfig::default(),
        );
        kernel.start().await?;
        let recipe = kernel
            .create(
                vec!["c1".into(), "c2".into()],
                recipe_kernel_testkit::metadata("demo"),
                "alice",
            )
            .await?;
        kernel.stop().await?;
        recipe
    };

    let kernel = RecipeKernel::new(
        SqliteContentStore::open(&path)?,
        chunks,
        Arc::new(hub.fabric(NodeId::random())),
        KernelConfig {
            validate_before_execute: true,
            max_concurrent_reads: Some(1),
            ..KernelConfig::default()
        },
    );

    let loaded = kernel.get(&recipe.id).await?;
    assert_eq!(loaded, recipe);
    assert_eq!(&kernel.execute(&loaded).await?[..], b"hello world");
    Ok(())
}
