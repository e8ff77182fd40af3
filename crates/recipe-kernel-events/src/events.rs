//! Recipe lifecycle event types.
//!
//! These are published to other participants after a lifecycle change has
//! been committed to the content store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use recipe_kernel_core::{ContentId, Metadata};

use crate::error::{EventError, Result};

/// Unique identifier for a participant on the event fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random node ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }
}

/// Topic names on the event fabric.
pub mod topics {
    /// A recipe was created.
    pub const NEW_RECIPE: &str = "new-recipe";
    /// A recipe's metadata was updated.
    pub const UPDATE_RECIPE: &str = "update-recipe";
    /// A recipe was deleted.
    pub const DELETE_RECIPE: &str = "delete-recipe";
    /// A recipe's value was updated.
    pub const UPDATE_RECIPE_VALUE: &str = "update-recipe-value";

    /// Every topic the kernel publishes.
    pub const ALL: [&str; 4] = [NEW_RECIPE, UPDATE_RECIPE, DELETE_RECIPE, UPDATE_RECIPE_VALUE];
}

/// Payload of `new-recipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    /// Id of the created recipe.
    pub id: ContentId,
    /// Its creator.
    pub creator: String,
    /// Its metadata.
    pub metadata: Metadata,
}

/// Payload of `update-recipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecipe {
    /// Id of the new version.
    pub id: ContentId,
    /// The patch that was applied.
    pub updates: Metadata,
}

/// Payload of `delete-recipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRecipe {
    /// Id of the deleted version.
    pub id: ContentId,
}

/// Payload of `update-recipe-value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecipeValue {
    /// Id the update was requested against (the version before the write).
    pub id: ContentId,
    /// The new value.
    pub value: u64,
}

/// A recipe lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeEvent {
    New(NewRecipe),
    Update(UpdateRecipe),
    Delete(DeleteRecipe),
    UpdateValue(UpdateRecipeValue),
}

impl RecipeEvent {
    /// The topic this event is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            RecipeEvent::New(_) => topics::NEW_RECIPE,
            RecipeEvent::Update(_) => topics::UPDATE_RECIPE,
            RecipeEvent::Delete(_) => topics::DELETE_RECIPE,
            RecipeEvent::UpdateValue(_) => topics::UPDATE_RECIPE_VALUE,
        }
    }

    /// The recipe id the event refers to.
    pub fn id(&self) -> &ContentId {
        match self {
            RecipeEvent::New(e) => &e.id,
            RecipeEvent::Update(e) => &e.id,
            RecipeEvent::Delete(e) => &e.id,
            RecipeEvent::UpdateValue(e) => &e.id,
        }
    }

    /// Encode the payload as structured JSON.
    pub fn payload(&self) -> Result<Value> {
        let value = match self {
            RecipeEvent::New(e) => serde_json::to_value(e)?,
            RecipeEvent::Update(e) => serde_json::to_value(e)?,
            RecipeEvent::Delete(e) => serde_json::to_value(e)?,
            RecipeEvent::UpdateValue(e) => serde_json::to_value(e)?,
        };
        Ok(value)
    }

    /// Decode an event from its topic and payload.
    pub fn from_parts(topic: &str, payload: Value) -> Result<Self> {
        match topic {
            topics::NEW_RECIPE => Ok(RecipeEvent::New(serde_json::from_value(payload)?)),
            topics::UPDATE_RECIPE => Ok(RecipeEvent::Update(serde_json::from_value(payload)?)),
            topics::DELETE_RECIPE => Ok(RecipeEvent::Delete(serde_json::from_value(payload)?)),
            topics::UPDATE_RECIPE_VALUE => {
                Ok(RecipeEvent::UpdateValue(serde_json::from_value(payload)?))
            }
            other => Err(EventError::UnknownTopic(other.to_string())),
        }
    }
}
