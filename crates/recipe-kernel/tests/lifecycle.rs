//! End-to-end lifecycle scenarios against a fully wired kernel.

use std::time::Duration;

use recipe_kernel::events::{topics, RecipeEvent, Subscription};
use recipe_kernel::{
    ContentId, KernelError, Metadata, MetadataValue, RecipeState, ValidationError,
};
use recipe_kernel_testkit::{init_tracing, metadata, KernelFixture};
use serde_json::json;

async fn next_event(events: &mut Subscription) -> anyhow::Result<RecipeEvent> {
    let envelope = events
        .recv_timeout(Duration::from_secs(1))
        .await?
        .ok_or_else(|| anyhow::anyhow!("no event published"))?;
    Ok(envelope.decode()?)
}

fn assert_quiet(events: &mut Subscription) {
    assert!(events.try_next().is_none(), "unexpected event published");
}

#[tokio::test]
async fn create_demo_recipe() -> anyhow::Result<()> {
    init_tracing();
    let fixture = KernelFixture::started().await;
    let mut events = fixture.subscribe();

    let recipe = fixture.create_demo().await?;

    assert_eq!(recipe.chunks(), &[ContentId::from("c1"), ContentId::from("c2")]);
    assert_eq!(recipe.creator(), "alice");
    assert_eq!(recipe.value(), 0);
    assert_eq!(recipe.created_at(), recipe.updated_at());
    assert!(recipe.is_consistent());
    assert_eq!(fixture.kernel.state(&recipe.id), RecipeState::Active);

    let envelope = events
        .recv_timeout(Duration::from_secs(1))
        .await?
        .ok_or_else(|| anyhow::anyhow!("no event"))?;
    assert_eq!(envelope.topic, topics::NEW_RECIPE);
    assert_eq!(
        envelope.payload,
        json!({"id": recipe.id.as_str(), "creator": "alice", "metadata": {"name": "demo"}})
    );

    let artifact = fixture.kernel.execute(&recipe).await?;
    assert_eq!(&artifact[..], b"hello world");
    Ok(())
}

#[tokio::test]
async fn create_rejects_malformed_input() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let mut events = fixture.subscribe();

    assert!(matches!(
        fixture.kernel.create(Vec::new(), metadata("x"), "alice").await,
        Err(KernelError::InvalidRecipe(ValidationError::EmptyChunks))
    ));
    assert!(matches!(
        fixture.kernel.create(vec!["c1".into()], metadata("x"), "").await,
        Err(KernelError::InvalidRecipe(ValidationError::EmptyCreator))
    ));

    assert_eq!(fixture.store.writes(), 0);
    assert!(fixture.kernel.ledger().is_empty());
    assert_quiet(&mut events);
    Ok(())
}

#[tokio::test]
async fn repeated_chunks_compose_in_order() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    fixture.add_chunk("bang", b"!");

    let recipe = fixture
        .kernel
        .create(
            vec!["c1".into(), "bang".into(), "c1".into(), "c2".into(), "bang".into()],
            metadata("echo"),
            "bob",
        )
        .await?;

    assert!(fixture.kernel.check_integrity(&recipe).await);
    assert_eq!(
        &fixture.kernel.execute(&recipe).await?[..],
        b"hello !hello world!"
    );
    Ok(())
}

#[tokio::test]
async fn update_metadata_creates_new_version() -> anyhow::Result<()> {
    init_tracing();
    let fixture = KernelFixture::started().await;
    let v1 = fixture.create_demo().await?;
    let mut events = fixture.subscribe();

    let v2 = fixture.kernel.update(&v1.id, metadata("demo2")).await?;

    assert_ne!(v2.id, v1.id);
    assert_eq!(v2.metadata()["name"], MetadataValue::from("demo2"));
    assert_eq!(v2.chunks(), v1.chunks());
    assert_eq!(v2.creator(), v1.creator());
    assert_eq!(v2.created_at(), v1.created_at());
    assert!(v2.updated_at() > v1.updated_at());

    // The old version is still stored, just superseded.
    assert_eq!(fixture.kernel.get(&v1.id).await?, v1);
    assert_eq!(
        fixture.kernel.state(&v1.id),
        RecipeState::Superseded { by: v2.id.clone() }
    );
    assert_eq!(fixture.kernel.current(&v1.id), v2.id);

    match next_event(&mut events).await? {
        RecipeEvent::Update(e) => {
            assert_eq!(e.id, v2.id);
            assert_eq!(e.updates, metadata("demo2"));
        }
        other => panic!("expected update-recipe, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn update_keeps_unpatched_keys() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let mut meta = metadata("demo");
    meta.insert("author".into(), MetadataValue::from("alice"));
    let v1 = fixture
        .kernel
        .create(vec!["c1".into()], meta, "alice")
        .await?;

    let v2 = fixture.kernel.update(&v1.id, metadata("renamed")).await?;

    assert_eq!(v2.metadata()["name"], MetadataValue::from("renamed"));
    assert_eq!(v2.metadata()["author"], MetadataValue::from("alice"));
    Ok(())
}

#[tokio::test]
async fn empty_patch_still_yields_new_id() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let v1 = fixture.create_demo().await?;

    let v2 = fixture.kernel.update(&v1.id, Metadata::new()).await?;
    let v3 = fixture.kernel.update(&v2.id, Metadata::new()).await?;

    assert_ne!(v1.id, v2.id);
    assert_ne!(v2.id, v3.id);
    assert_eq!(v3.metadata(), v1.metadata());
    assert_eq!(fixture.kernel.current(&v1.id), v3.id);
    Ok(())
}

#[tokio::test]
async fn update_value_event_carries_prior_id() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let v1 = fixture.create_demo().await?;
    let mut events = fixture.subscribe();

    let v2 = fixture.kernel.update_value(&v1.id, 250).await?;

    assert_eq!(v2.value(), 250);
    assert_ne!(v2.id, v1.id);
    assert_eq!(fixture.kernel.current(&v1.id), v2.id);

    let envelope = events
        .recv_timeout(Duration::from_secs(1))
        .await?
        .ok_or_else(|| anyhow::anyhow!("no event"))?;
    assert_eq!(envelope.topic, topics::UPDATE_RECIPE_VALUE);
    assert_eq!(envelope.payload, json!({"id": v1.id.as_str(), "value": 250}));
    Ok(())
}

#[tokio::test]
async fn delete_unpins_and_is_strict() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let recipe = fixture.create_demo().await?;
    let mut events = fixture.subscribe();

    fixture.kernel.delete(&recipe.id).await?;
    assert!(fixture.kernel.state(&recipe.id).is_deleted());
    assert!(!fixture.kernel.recipes().contains(&recipe.id).await?);
    match next_event(&mut events).await? {
        RecipeEvent::Delete(e) => assert_eq!(e.id, recipe.id),
        other => panic!("expected delete-recipe, got {:?}", other),
    }

    let again = fixture.kernel.delete(&recipe.id).await;
    assert!(matches!(again, Err(KernelError::NotFound(_))));
    assert_quiet(&mut events);
    Ok(())
}

#[tokio::test]
async fn deleted_recipe_cannot_be_updated() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let recipe = fixture.create_demo().await?;
    fixture.kernel.delete(&recipe.id).await?;
    let mut events = fixture.subscribe();
    let writes = fixture.store.writes();

    assert!(matches!(
        fixture.kernel.update(&recipe.id, metadata("zombie")).await,
        Err(KernelError::NotFound(ref id)) if *id == recipe.id
    ));
    assert!(matches!(
        fixture.kernel.update_value(&recipe.id, 7).await,
        Err(KernelError::NotFound(_))
    ));
    assert!(matches!(
        fixture.kernel.revalue(&recipe.id).await,
        Err(KernelError::NotFound(_))
    ));

    assert_eq!(fixture.kernel.state(&recipe.id), RecipeState::Deleted);
    assert_eq!(fixture.kernel.current(&recipe.id), recipe.id);
    assert_eq!(fixture.store.writes(), writes);
    assert_quiet(&mut events);
    Ok(())
}

#[tokio::test]
async fn delete_never_created_id() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let mut events = fixture.subscribe();

    let bogus = ContentId::for_bytes(b"never stored");
    let result = fixture.kernel.delete(&bogus).await;

    assert!(matches!(result, Err(KernelError::NotFound(id)) if id == bogus));
    assert_eq!(fixture.kernel.state(&bogus), RecipeState::Uncommitted);
    assert_quiet(&mut events);
    Ok(())
}

#[tokio::test]
async fn unretrievable_chunk() -> anyhow::Result<()> {
    init_tracing();
    let fixture = KernelFixture::started().await;
    let recipe = fixture.create_demo().await?;

    fixture.chunks.break_chunk("c2");

    let result = fixture.kernel.execute(&recipe).await;
    assert!(matches!(
        result,
        Err(KernelError::ChunkUnavailable { ref id }) if id.as_str() == "c2"
    ));
    assert!(!fixture.kernel.check_integrity(&recipe).await);

    // Recovery makes the same recipe usable again.
    fixture.chunks.heal_chunk(&"c2".into());
    assert!(fixture.kernel.check_integrity(&recipe).await);
    assert_eq!(&fixture.kernel.execute(&recipe).await?[..], b"hello world");
    Ok(())
}

#[tokio::test]
async fn update_missing_recipe() -> anyhow::Result<()> {
    let fixture = KernelFixture::started().await;
    let missing = ContentId::for_bytes(b"missing");

    assert!(matches!(
        fixture.kernel.update(&missing, metadata("x")).await,
        Err(KernelError::NotFound(_))
    ));
    assert!(matches!(
        fixture.kernel.update_value(&missing, 1).await,
        Err(KernelError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn update_of_corrupt_blob() -> anyhow::Result<()> {
    use recipe_kernel::store::ContentStore;

    let fixture = KernelFixture::started().await;
    let junk = fixture.store.put(b"\xa1\x00\x00 not a recipe").await?;

    let result = fixture.kernel.update(&junk, metadata("x")).await;
    assert!(matches!(result, Err(KernelError::Corrupt { .. })));
    Ok(())
}

#[tokio::test]
async fn mutations_rejected_when_stopped() -> anyhow::Result<()> {
    let fixture = KernelFixture::new();

    assert!(matches!(
        fixture.create_demo().await,
        Err(KernelError::NotStarted)
    ));

    fixture.kernel.start().await?;
    let recipe = fixture.create_demo().await?;
    fixture.kernel.stop().await?;

    assert!(matches!(
        fixture.kernel.update(&recipe.id, Metadata::new()).await,
        Err(KernelError::NotStarted)
    ));
    assert!(matches!(
        fixture.kernel.update_value(&recipe.id, 3).await,
        Err(KernelError::NotStarted)
    ));
    assert!(matches!(
        fixture.kernel.revalue(&recipe.id).await,
        Err(KernelError::NotStarted)
    ));

    // Reads do not need the fabric.
    assert!(fixture.kernel.check_integrity(&recipe).await);
    assert_eq!(fixture.kernel.get(&recipe.id).await?, recipe);
    Ok(())
}
