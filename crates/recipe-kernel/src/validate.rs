//! Validation pipeline: per-chunk integrity checks.
//!
//! Every chunk is fetched and verified independently. Failures are absorbed
//! into the report and logged; nothing here returns an error.

use std::sync::Arc;

use recipe_kernel_core::{ContentId, Recipe};
use recipe_kernel_store::{Chunk, ChunkError, ChunkSource};

use crate::reads::{read_each, ReadLimit};

/// Outcome of checking a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Retrieved and verified.
    Valid,
    /// The chunk source does not have it.
    Missing,
    /// The chunk source failed to serve it.
    Unavailable(String),
    /// Retrieved, but the integrity check failed.
    Corrupt,
}

impl ChunkStatus {
    /// Whether the chunk passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, ChunkStatus::Valid)
    }
}

/// Per-chunk validation results for one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// The recipe that was checked.
    pub recipe: ContentId,
    /// Status of each chunk, in recipe order.
    pub chunks: Vec<(ContentId, ChunkStatus)>,
}

impl ValidationReport {
    /// True iff the recipe has chunks and every one is valid.
    pub fn is_valid(&self) -> bool {
        !self.chunks.is_empty() && self.chunks.iter().all(|(_, s)| s.is_valid())
    }

    /// Chunks that did not pass, in recipe order.
    pub fn failures(&self) -> impl Iterator<Item = &(ContentId, ChunkStatus)> {
        self.chunks.iter().filter(|(_, s)| !s.is_valid())
    }
}

/// Whether every chunk of `recipe` is retrievable and intact.
///
/// An empty recipe is never valid.
pub async fn validate<C>(source: &Arc<C>, recipe: &Recipe) -> bool
where
    C: ChunkSource + ?Sized + 'static,
{
    validate_report(source, recipe, &ReadLimit::unbounded())
        .await
        .is_valid()
}

/// Check every chunk of `recipe` and report each outcome.
pub async fn validate_report<C>(
    source: &Arc<C>,
    recipe: &Recipe,
    limit: &ReadLimit,
) -> ValidationReport
where
    C: ChunkSource + ?Sized + 'static,
{
    let statuses = read_each(
        source,
        recipe.chunks(),
        limit,
        |source: &C, id, fetched: Result<Chunk, ChunkError>| match fetched {
            Ok(chunk) if source.verify_chunk(&chunk) => ChunkStatus::Valid,
            Ok(_) => {
                tracing::warn!(chunk = %id, "chunk failed integrity check");
                ChunkStatus::Corrupt
            }
            Err(ChunkError::Missing(_)) => {
                tracing::debug!(chunk = %id, "chunk missing");
                ChunkStatus::Missing
            }
            Err(e) => {
                tracing::debug!(chunk = %id, error = %e, "chunk unavailable");
                ChunkStatus::Unavailable(e.to_string())
            }
        },
    )
    .await;

    let chunks = recipe
        .chunks()
        .iter()
        .cloned()
        .zip(statuses)
        .map(|(id, status)| {
            let status =
                status.unwrap_or_else(|| ChunkStatus::Unavailable("read task failed".into()));
            (id, status)
        })
        .collect();

    let report = ValidationReport {
        recipe: recipe.id.clone(),
        chunks,
    };

    if report.is_valid() {
        tracing::debug!(recipe = %recipe.id, "recipe validated");
    } else {
        tracing::warn!(
            recipe = %recipe.id,
            failed = report.failures().count(),
            total = report.chunks.len(),
            "recipe failed validation"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use recipe_kernel_core::RecipeBuilder;
    use recipe_kernel_store::MemoryChunkStore;

    fn recipe(chunks: &[&str]) -> Recipe {
        let body = RecipeBuilder::new("alice")
            .chunks(chunks.iter().copied())
            .timestamp(1)
            .build();
        Recipe::new(body.compute_id(), body)
    }

    fn source() -> Arc<MemoryChunkStore> {
        let chunks = MemoryChunkStore::new();
        chunks.insert("c1", &b"hello "[..]);
        chunks.insert("c2", &b"world"[..]);
        Arc::new(chunks)
    }

    #[tokio::test]
    async fn test_all_valid() {
        assert!(validate(&source(), &recipe(&["c1", "c2"])).await);
    }

    #[tokio::test]
    async fn test_empty_recipe_is_invalid() {
        let report = validate_report(&source(), &recipe(&[]), &ReadLimit::unbounded()).await;
        assert!(report.chunks.is_empty());
        assert!(!report.is_valid());
    }

    #[tokio::test]
    async fn test_missing_chunk() {
        let report =
            validate_report(&source(), &recipe(&["c1", "c9"]), &ReadLimit::unbounded()).await;
        assert!(!report.is_valid());
        assert_eq!(
            report.chunks,
            vec![
                (ContentId::from("c1"), ChunkStatus::Valid),
                (ContentId::from("c9"), ChunkStatus::Missing),
            ]
        );
    }

    #[tokio::test]
    async fn test_corrupt_chunk() {
        let source = source();
        let good = Chunk::new("c2", &b"world"[..]);
        source.insert_chunk(Chunk {
            data: Bytes::from_static(b"w0rld"),
            ..good
        });

        let report =
            validate_report(&source, &recipe(&["c1", "c2"]), &ReadLimit::unbounded()).await;
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, vec![&(ContentId::from("c2"), ChunkStatus::Corrupt)]);
    }
}
