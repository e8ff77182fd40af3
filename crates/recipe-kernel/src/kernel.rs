//! The Kernel: the recipe lifecycle coordinator.
//!
//! Every state-changing operation follows the same sequence: read the prior
//! version if needed, compute the new body, write it, and only after the
//! write succeeds publish the event. A failed publish is logged and never
//! undoes the write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use recipe_kernel_core::{validate_body, ContentId, Metadata, Recipe, RecipeBuilder, RecipeState};
use recipe_kernel_events::{
    DeleteRecipe, EventFabric, NewRecipe, Notifier, RecipeEvent, RetryPolicy, UpdateRecipe,
    UpdateRecipeValue,
};
use recipe_kernel_store::{ChunkSource, ContentStore, RecipeStore};

use crate::compose::compose_with;
use crate::error::{KernelError, Result};
use crate::ledger::VersionLedger;
use crate::reads::ReadLimit;
use crate::validate::{validate_report, ValidationReport};
use crate::valuation::{FlatValuation, Valuation};

/// Configuration for the Kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Validate every recipe before composing it in `execute`.
    /// Stale recipes are validated regardless.
    pub validate_before_execute: bool,
    /// Upper bound on concurrent chunk reads across all operations.
    pub max_concurrent_reads: Option<usize>,
    /// Retry schedule for event publication.
    pub notify: RetryPolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            validate_before_execute: false,
            max_concurrent_reads: None,
            notify: RetryPolicy::default(),
        }
    }
}

/// The main Kernel struct.
///
/// Owns its collaborators: the content store (through a [`RecipeStore`]),
/// the chunk source, and the event fabric (through a [`Notifier`]).
pub struct RecipeKernel<S, C, F>
where
    S: ContentStore,
    C: ChunkSource + 'static,
    F: EventFabric + 'static,
{
    recipes: RecipeStore<S>,
    chunks: Arc<C>,
    notifier: Notifier<F>,
    valuation: Box<dyn Valuation>,
    config: KernelConfig,
    reads: ReadLimit,
    ledger: VersionLedger,
    started: AtomicBool,
}

impl<S, C, F> RecipeKernel<S, C, F>
where
    S: ContentStore,
    C: ChunkSource + 'static,
    F: EventFabric + 'static,
{
    /// Create a kernel. It must be started before it accepts mutations.
    pub fn new(store: S, chunks: Arc<C>, fabric: Arc<F>, config: KernelConfig) -> Self {
        Self {
            recipes: RecipeStore::new(store),
            chunks,
            notifier: Notifier::new(fabric, config.notify.clone()),
            valuation: Box::new(FlatValuation),
            reads: ReadLimit::from_config(config.max_concurrent_reads),
            config,
            ledger: VersionLedger::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Replace the valuation strategy.
    pub fn with_valuation(mut self, valuation: impl Valuation + 'static) -> Self {
        self.valuation = Box::new(valuation);
        self
    }

    /// Get the recipe store.
    pub fn recipes(&self) -> &RecipeStore<S> {
        &self.recipes
    }

    /// Get the chunk source.
    pub fn chunks(&self) -> &Arc<C> {
        &self.chunks
    }

    /// Get the event fabric.
    pub fn fabric(&self) -> &Arc<F> {
        self.notifier.fabric()
    }

    /// Get the configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get the version ledger.
    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start the event fabric and accept mutations.
    pub async fn start(&self) -> Result<()> {
        self.fabric().start().await?;
        self.started.store(true, Ordering::Release);
        tracing::info!(node = ?self.fabric().local_node_id(), "recipe kernel started");
        Ok(())
    }

    /// Stop accepting mutations and leave the event fabric.
    pub async fn stop(&self) -> Result<()> {
        self.started.store(false, Ordering::Release);
        self.fabric().stop().await?;
        tracing::info!("recipe kernel stopped");
        Ok(())
    }

    /// Whether the kernel accepts mutations.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn ensure_started(&self) -> Result<()> {
        if self.is_started() {
            Ok(())
        } else {
            Err(KernelError::NotStarted)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create and store a new recipe with value 0.
    pub async fn create(
        &self,
        chunks: Vec<ContentId>,
        metadata: Metadata,
        creator: &str,
    ) -> Result<Recipe> {
        self.ensure_started()?;

        let body = RecipeBuilder::new(creator)
            .chunks(chunks)
            .metadata(metadata)
            .timestamp(now_millis())
            .build();
        validate_body(&body)?;

        let id = self.recipes.put(&body).await?;
        self.ledger.record_active(&id);
        tracing::info!(%id, creator, chunks = body.chunks.len(), "recipe created");

        let recipe = Recipe::new(id, body);
        self.notifier
            .notify(&RecipeEvent::New(NewRecipe {
                id: recipe.id.clone(),
                creator: recipe.creator().to_string(),
                metadata: recipe.metadata().clone(),
            }))
            .await;

        Ok(recipe)
    }

    /// Shallow-merge `patch` into the metadata of `id`, storing a new version.
    ///
    /// An empty patch still produces a new version: `updated_at` always moves.
    /// Fails with `NotFound` unless `id` is pinned.
    pub async fn update(&self, id: &ContentId, patch: Metadata) -> Result<Recipe> {
        self.ensure_started()?;

        let prior = self.load_live(id).await?;
        let body = prior.body.with_metadata_patch(&patch, now_millis());

        let new_id = self.recipes.put(&body).await?;
        self.ledger.record_superseded(id, &new_id);
        tracing::info!(old = %id, new = %new_id, keys = patch.len(), "recipe updated");

        self.notifier
            .notify(&RecipeEvent::Update(UpdateRecipe {
                id: new_id.clone(),
                updates: patch,
            }))
            .await;

        Ok(Recipe::new(new_id, body))
    }

    /// Unpin `id`. Fails with `NotFound` if it is not pinned.
    pub async fn delete(&self, id: &ContentId) -> Result<()> {
        self.ensure_started()?;

        self.recipes.delete(id).await?;
        self.ledger.record_deleted(id);
        tracing::info!(%id, "recipe deleted");

        self.notifier
            .notify(&RecipeEvent::Delete(DeleteRecipe { id: id.clone() }))
            .await;

        Ok(())
    }

    /// Set the value of `id`, storing a new version.
    ///
    /// The published event carries `id` as passed in; the new id is in the
    /// returned recipe.
    pub async fn update_value(&self, id: &ContentId, value: u64) -> Result<Recipe> {
        self.ensure_started()?;

        let prior = self.load_live(id).await?;
        self.write_value(prior, value).await
    }

    /// Recompute the value of `id` with the valuation strategy and store it.
    pub async fn revalue(&self, id: &ContentId) -> Result<Recipe> {
        self.ensure_started()?;

        let prior = self.load_live(id).await?;
        let value = self.valuation.valuate(&prior.body);
        self.write_value(prior, value).await
    }

    // Unpinned blobs stay readable until gc; only pinned versions may move on.
    async fn load_live(&self, id: &ContentId) -> Result<Recipe> {
        if !self.recipes.contains(id).await? {
            return Err(KernelError::NotFound(id.clone()));
        }
        self.get(id).await
    }

    async fn write_value(&self, prior: Recipe, value: u64) -> Result<Recipe> {
        let body = prior.body.with_value(value, now_millis());

        let new_id = self.recipes.put(&body).await?;
        self.ledger.record_superseded(&prior.id, &new_id);
        tracing::info!(old = %prior.id, new = %new_id, value, "recipe value updated");

        self.notifier
            .notify(&RecipeEvent::UpdateValue(UpdateRecipeValue {
                id: prior.id.clone(),
                value,
            }))
            .await;

        Ok(Recipe::new(new_id, body))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the recipe stored under `id`.
    pub async fn get(&self, id: &ContentId) -> Result<Recipe> {
        Ok(self.recipes.get(id).await?)
    }

    /// Value `recipe` would have under the valuation strategy. Writes nothing.
    pub fn valuate(&self, recipe: &Recipe) -> u64 {
        self.valuation.valuate(&recipe.body)
    }

    /// Compose the artifact for `recipe`.
    ///
    /// A stale recipe (id not matching its body) is validated first, as is
    /// every recipe when `validate_before_execute` is set.
    pub async fn execute(&self, recipe: &Recipe) -> Result<Bytes> {
        let stale = !recipe.is_consistent();
        if stale || self.config.validate_before_execute {
            if stale {
                tracing::debug!(id = %recipe.id, "stale recipe, validating before execute");
            }
            if !self.integrity_report(recipe).await.is_valid() {
                return Err(KernelError::IntegrityFailure {
                    id: recipe.id.clone(),
                });
            }
        }

        compose_with(&self.chunks, recipe, &self.reads).await
    }

    /// Whether every chunk of `recipe` is retrievable and intact.
    pub async fn check_integrity(&self, recipe: &Recipe) -> bool {
        self.integrity_report(recipe).await.is_valid()
    }

    /// Per-chunk integrity results for `recipe`.
    pub async fn integrity_report(&self, recipe: &Recipe) -> ValidationReport {
        validate_report(&self.chunks, recipe, &self.reads).await
    }

    /// Lifecycle state of `id` as observed by this kernel.
    pub fn state(&self, id: &ContentId) -> RecipeState {
        self.ledger.state(id)
    }

    /// Latest version this kernel knows `id` was superseded by.
    pub fn current(&self, id: &ContentId) -> ContentId {
        self.ledger.current(id)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
