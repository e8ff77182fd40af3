//! Concurrent chunk reads shared by composition and validation.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use recipe_kernel_core::ContentId;
use recipe_kernel_store::{Chunk, ChunkError, ChunkSource};

/// Bound on in-flight chunk reads.
///
/// Clones share one set of permits, so a limit set on the kernel holds
/// across all operations running at once.
#[derive(Debug, Clone, Default)]
pub struct ReadLimit {
    permits: Option<Arc<Semaphore>>,
}

impl ReadLimit {
    /// No bound; concurrency is left to the chunk source.
    pub fn unbounded() -> Self {
        Self { permits: None }
    }

    /// At most `max` reads in flight. Zero is treated as one.
    pub fn new(max: usize) -> Self {
        Self {
            permits: Some(Arc::new(Semaphore::new(max.max(1)))),
        }
    }

    /// Build from an optional maximum.
    pub fn from_config(max: Option<usize>) -> Self {
        max.map(Self::new).unwrap_or_default()
    }

    /// Whether reads are bounded.
    pub fn is_bounded(&self) -> bool {
        self.permits.is_some()
    }
}

/// Fetch every id concurrently and apply `inspect` to each outcome.
///
/// Results come back in input order. A slot is `None` only if its task
/// panicked or was cancelled.
pub(crate) async fn read_each<C, T, F>(
    source: &Arc<C>,
    ids: &[ContentId],
    limit: &ReadLimit,
    inspect: F,
) -> Vec<Option<T>>
where
    C: ChunkSource + ?Sized + 'static,
    T: Send + 'static,
    F: Fn(&C, &ContentId, Result<Chunk, ChunkError>) -> T + Clone + Send + 'static,
{
    let mut join_set = JoinSet::new();

    for (index, id) in ids.iter().enumerate() {
        let source = Arc::clone(source);
        let permits = limit.permits.clone();
        let id = id.clone();
        let inspect = inspect.clone();

        join_set.spawn(async move {
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        let closed = ChunkError::Unavailable {
                            id: id.clone(),
                            reason: "read limiter closed".into(),
                        };
                        return (index, inspect(&*source, &id, Err(closed)));
                    }
                },
                None => None,
            };

            let fetched = source.get_chunk(&id).await;
            (index, inspect(&*source, &id, fetched))
        });
    }

    let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None).take(ids.len()).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, value)) => results[index] = Some(value),
            Err(e) => tracing::warn!(error = %e, "chunk read task failed"),
        }
    }

    results
}
