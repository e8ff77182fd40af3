//! # Recipe Kernel
//!
//! Content-addressed recipes: ordered lists of chunk references plus
//! metadata and a valuation, from which an artifact is rebuilt on demand.
//!
//! ## Overview
//!
//! - **Recipes** are immutable. Every metadata or value change is stored as a
//!   new version under a new content id.
//! - **Composition** concatenates the chunks in recipe order, all or nothing.
//! - **Validation** fetches and verifies every chunk independently.
//! - **Valuation** is a pluggable strategy over the recipe body.
//! - **Events** are published after each committed change, best-effort.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipe_kernel::{KernelConfig, Metadata, RecipeKernel};
//! use recipe_kernel::events::{MemoryHub, NodeId};
//! use recipe_kernel::store::{MemoryChunkStore, SqliteContentStore};
//!
//! async fn run() {
//!     let store = SqliteContentStore::open("recipes.db").unwrap();
//!     let chunks = Arc::new(MemoryChunkStore::new());
//!     chunks.insert("c1", &b"hello "[..]);
//!     chunks.insert("c2", &b"world"[..]);
//!
//!     let hub = MemoryHub::new(64);
//!     let fabric = Arc::new(hub.fabric(NodeId::random()));
//!
//!     let kernel = RecipeKernel::new(store, chunks, fabric, KernelConfig::default());
//!     kernel.start().await.unwrap();
//!
//!     let recipe = kernel
//!         .create(vec!["c1".into(), "c2".into()], Metadata::new(), "alice")
//!         .await
//!         .unwrap();
//!     let artifact = kernel.execute(&recipe).await.unwrap();
//!     assert_eq!(&artifact[..], b"hello world");
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `recipe_kernel::core` - Recipes, content ids, canonical encoding
//! - `recipe_kernel::store` - Content store, chunk access, recipe store
//! - `recipe_kernel::events` - Lifecycle events and the event fabric

pub mod compose;
pub mod error;
pub mod kernel;
pub mod ledger;
pub mod reads;
pub mod validate;
pub mod valuation;

// Re-export component crates
pub use recipe_kernel_core as core;
pub use recipe_kernel_events as events;
pub use recipe_kernel_store as store;

// Re-export main types for convenience
pub use compose::{compose, compose_with};
pub use error::{KernelError, Result};
pub use kernel::{KernelConfig, RecipeKernel};
pub use ledger::VersionLedger;
pub use reads::ReadLimit;
pub use validate::{validate, validate_report, ChunkStatus, ValidationReport};
pub use valuation::{ChunkCountValuation, FlatValuation, Valuation};

// Re-export commonly used core types
pub use recipe_kernel_core::{
    ContentId, Metadata, MetadataValue, Recipe, RecipeBody, RecipeState, ValidationError,
};
