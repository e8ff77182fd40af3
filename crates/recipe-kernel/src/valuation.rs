//! Valuation strategies.
//!
//! A strategy maps a recipe body to a value. It must be deterministic for a
//! given body and must not observe anything but the body.

use recipe_kernel_core::RecipeBody;

/// Computes a recipe's value.
pub trait Valuation: Send + Sync {
    /// Value of `body`.
    fn valuate(&self, body: &RecipeBody) -> u64;
}

impl<F> Valuation for F
where
    F: Fn(&RecipeBody) -> u64 + Send + Sync,
{
    fn valuate(&self, body: &RecipeBody) -> u64 {
        self(body)
    }
}

/// Every recipe is worth zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatValuation;

impl Valuation for FlatValuation {
    fn valuate(&self, _body: &RecipeBody) -> u64 {
        0
    }
}

/// `base + per_chunk * chunk_count`, saturating at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkCountValuation {
    pub base: u64,
    pub per_chunk: u64,
}

impl Valuation for ChunkCountValuation {
    fn valuate(&self, body: &RecipeBody) -> u64 {
        let count = u64::try_from(body.chunks.len()).unwrap_or(u64::MAX);
        self.base.saturating_add(self.per_chunk.saturating_mul(count))
    }
}
