//! Version ledger: the lifecycle state of every version this kernel observed.
//!
//! Ids are content-derived, so an update produces a new id. The ledger links
//! each superseded id to its successor so callers can resolve the current
//! version locally. It is in-memory only and says nothing about versions
//! produced by other participants.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use recipe_kernel_core::{ContentId, RecipeState};

/// Observed lifecycle states, keyed by version id.
#[derive(Debug, Default)]
pub struct VersionLedger {
    states: RwLock<HashMap<ContentId, RecipeState>>,
}

impl VersionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `id`; `Uncommitted` if never observed.
    pub fn state(&self, id: &ContentId) -> RecipeState {
        self.read()
            .get(id)
            .cloned()
            .unwrap_or(RecipeState::Uncommitted)
    }

    /// Follow the supersession chain from `id` to its latest known version.
    ///
    /// Returns `id` itself if it was never superseded.
    pub fn current(&self, id: &ContentId) -> ContentId {
        let states = self.read();
        let mut current = id.clone();

        // Each hop lands on a distinct entry, so the chain is at most this long.
        for _ in 0..=states.len() {
            match states.get(&current).and_then(RecipeState::successor) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }

        current
    }

    /// Number of versions observed.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn record_active(&self, id: &ContentId) {
        self.write().insert(id.clone(), RecipeState::Active);
    }

    pub(crate) fn record_superseded(&self, old: &ContentId, new: &ContentId) {
        let mut states = self.write();
        states.insert(new.clone(), RecipeState::Active);
        if old != new && !matches!(states.get(old), Some(RecipeState::Deleted)) {
            states.insert(old.clone(), RecipeState::Superseded { by: new.clone() });
        }
    }

    pub(crate) fn record_deleted(&self, id: &ContentId) {
        self.write().insert(id.clone(), RecipeState::Deleted);
    }

    // A poisoned lock still holds a consistent map: every write is a single insert.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ContentId, RecipeState>> {
        self.states.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ContentId, RecipeState>> {
        self.states.write().unwrap_or_else(|e| e.into_inner())
    }
}
