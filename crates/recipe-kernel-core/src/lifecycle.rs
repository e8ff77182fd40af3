//! Lifecycle states of a recipe version.
//!
//! ```text
//! Uncommitted --store--> Active --update--> Superseded { by }
//!                          |
//!                          +----delete----> Deleted
//! ```

use serde::{Deserialize, Serialize};

use crate::types::ContentId;

/// The lifecycle state of a single recipe version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeState {
    /// Not (yet) stored, or never observed by this participant.
    Uncommitted,

    /// Stored and pinned; the current version.
    Active,

    /// A later version replaced this one.
    Superseded {
        /// The version that replaced it.
        by: ContentId,
    },

    /// Unpinned; no longer considered live.
    Deleted,
}

impl RecipeState {
    /// Check if the version is the live one.
    pub fn is_active(&self) -> bool {
        matches!(self, RecipeState::Active)
    }

    /// Check if the version has been replaced.
    pub fn is_superseded(&self) -> bool {
        matches!(self, RecipeState::Superseded { .. })
    }

    /// Check if the version was deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, RecipeState::Deleted)
    }

    /// The successor, if superseded.
    pub fn successor(&self) -> Option<&ContentId> {
        match self {
            RecipeState::Superseded { by } => Some(by),
            _ => None,
        }
    }
}
