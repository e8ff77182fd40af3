//! # Recipe Kernel Core
//!
//! Pure primitives for the Recipe Kernel: recipes, content identifiers, and
//! canonicalization.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Recipe`] - A stored recipe version: its [`ContentId`] plus its [`RecipeBody`]
//! - [`RecipeBody`] - The serialized part of a recipe (chunks, metadata, creator, timestamps, value)
//! - [`ContentId`] - Content-derived identifier (hex Blake3 digest for kernel-produced blobs)
//! - [`MetadataValue`] - Free-form, float-free metadata values
//! - [`RecipeState`] - Lifecycle state of a single recipe version
//!
//! ## Canonicalization
//!
//! Recipe bodies are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod lifecycle;
pub mod recipe;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, decode_body};
pub use crypto::Blake3Hash;
pub use error::{CoreError, ValidationError};
pub use lifecycle::RecipeState;
pub use recipe::{Metadata, MetadataValue, Recipe, RecipeBody, RecipeBuilder, RECIPE_VERSION};
pub use types::ContentId;
pub use validation::validate_body;
