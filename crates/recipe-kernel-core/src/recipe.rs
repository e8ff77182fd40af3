//! Recipe: an ordered assembly of chunks plus metadata and a valuation.
//!
//! A stored recipe version is immutable. Metadata and value changes are
//! represented as new bodies, stored under new content identifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_bytes;
use crate::types::ContentId;

/// The current recipe schema version.
pub const RECIPE_VERSION: u8 = 1;

/// Free-form recipe metadata, keyed by string.
///
/// A `BTreeMap` so iteration order never depends on insertion order.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A metadata value.
///
/// Floats are not representable: every value must encode deterministically.
///
/// In JSON, bytes appear as `{"$bytes": "<hex>"}`. A map whose only entry is a
/// `$bytes` key holding hex text therefore reads back as bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
    Array(Vec<MetadataValue>),
    Bytes(#[serde(with = "tagged_hex")] Vec<u8>),
    Map(BTreeMap<String, MetadataValue>),
}

mod tagged_hex {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Tagged {
        #[serde(rename = "$bytes")]
        hex: String,
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        Tagged {
            hex: hex::encode(bytes),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let tagged = Tagged::deserialize(deserializer)?;
        hex::decode(&tagged.hex).map_err(de::Error::custom)
    }
}

impl MetadataValue {
    /// Get the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<Vec<u8>> for MetadataValue {
    fn from(b: Vec<u8>) -> Self {
        MetadataValue::Bytes(b)
    }
}

/// The serialized content of a recipe.
///
/// Everything here contributes to the recipe's content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeBody {
    /// Schema version (currently 1).
    pub version: u8,

    /// Chunk ids in assembly order.
    pub chunks: Vec<ContentId>,

    /// Caller-defined metadata.
    pub metadata: Metadata,

    /// The originating participant. Immutable after creation.
    pub creator: String,

    /// Creation time (Unix milliseconds).
    pub created_at: i64,

    /// Time of the last mutation (Unix milliseconds).
    pub updated_at: i64,

    /// Current valuation.
    pub value: u64,
}

impl RecipeBody {
    /// Canonical encoding of this body.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(self)
    }

    /// The content id this body stores under.
    pub fn compute_id(&self) -> ContentId {
        ContentId::for_bytes(&self.canonical_bytes())
    }

    /// Shallow-merge `patch` into the metadata and bump `updated_at`.
    ///
    /// Keys in the patch overwrite; other keys are retained.
    pub fn with_metadata_patch(&self, patch: &Metadata, now: i64) -> Self {
        let mut next = self.clone();
        for (key, value) in patch {
            next.metadata.insert(key.clone(), value.clone());
        }
        next.touch(now);
        next
    }

    /// Replace the value and bump `updated_at`.
    pub fn with_value(&self, value: u64, now: i64) -> Self {
        let mut next = self.clone();
        next.value = value;
        next.touch(now);
        next
    }

    /// Advance `updated_at` to `now`, or one millisecond past the previous
    /// mutation if the clock has not moved.
    ///
    /// Every mutation therefore produces distinct content, and
    /// `created_at <= updated_at` survives a clock stepping backwards.
    fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.updated_at.saturating_add(1));
    }
}

/// A stored recipe version: the content id plus the body it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// The content id returned when the body was stored.
    pub id: ContentId,

    /// The serialized content.
    pub body: RecipeBody,
}

impl Recipe {
    /// Pair a body with the id it was stored under.
    pub fn new(id: ContentId, body: RecipeBody) -> Self {
        Self { id, body }
    }

    /// Whether `id` matches a fresh hash of the body.
    ///
    /// An inconsistent recipe is stale and must be re-validated before its
    /// chunks are trusted.
    pub fn is_consistent(&self) -> bool {
        self.body.compute_id() == self.id
    }

    /// Get the chunk ids in assembly order.
    pub fn chunks(&self) -> &[ContentId] {
        &self.body.chunks
    }

    /// Get the metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.body.metadata
    }

    /// Get the creator.
    pub fn creator(&self) -> &str {
        &self.body.creator
    }

    /// Get the creation time.
    pub fn created_at(&self) -> i64 {
        self.body.created_at
    }

    /// Get the time of the last mutation.
    pub fn updated_at(&self) -> i64 {
        self.body.updated_at
    }

    /// Get the value.
    pub fn value(&self) -> u64 {
        self.body.value
    }

    /// Consume the recipe, returning the body.
    pub fn into_body(self) -> RecipeBody {
        self.body
    }
}

/// Builder for creating recipe bodies.
pub struct RecipeBuilder {
    creator: String,
    chunks: Vec<ContentId>,
    metadata: Metadata,
    timestamp: i64,
    value: u64,
}

impl RecipeBuilder {
    /// Start a new recipe for the given creator.
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            chunks: Vec::new(),
            metadata: Metadata::new(),
            timestamp: 0,
            value: 0,
        }
    }

    /// Append one chunk.
    pub fn chunk(mut self, id: impl Into<ContentId>) -> Self {
        self.chunks.push(id.into());
        self
    }

    /// Append chunks in order.
    pub fn chunks<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ContentId>,
    {
        self.chunks.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Set one metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the metadata map.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the creation timestamp (also used as `updated_at`).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the initial value.
    pub fn value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    /// Build the body. Structure is not checked here; see [`crate::validate_body`].
    pub fn build(self) -> RecipeBody {
        RecipeBody {
            version: RECIPE_VERSION,
            chunks: self.chunks,
            metadata: self.metadata,
            creator: self.creator,
            created_at: self.timestamp,
            updated_at: self.timestamp,
            value: self.value,
        }
    }
}
