//! # Recipe Kernel Store
//!
//! Storage abstraction for the Recipe Kernel. Provides a trait-based interface
//! for content-addressed blob persistence with SQLite and in-memory
//! implementations, chunk access, and recipe storage on top.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait for put/get/pin/unpin of blobs
//! - [`SqliteContentStore`] - SQLite-based persistent storage
//! - [`MemoryContentStore`] - In-memory storage for tests
//! - [`ChunkSource`] - Chunk retrieval plus integrity check
//! - [`RecipeStore`] - Canonical recipe bodies in a content store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use recipe_kernel_core::RecipeBuilder;
//! use recipe_kernel_store::{RecipeStore, SqliteContentStore};
//!
//! async fn run() {
//!     let store = RecipeStore::new(SqliteContentStore::open("recipes.db").unwrap());
//!
//!     let body = RecipeBuilder::new("alice").chunks(["c1", "c2"]).build();
//!     let id = store.put(&body).await.unwrap();
//!     let recipe = store.get(&id).await.unwrap();
//!     assert_eq!(recipe.body, body);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content addressing**: ids are Blake3 digests of the stored bytes
//! - **Pin on put**: every write pins; delete is an unpin
//! - **Strict unpin**: unpinning an unknown id is `NotFound`
//! - **Deferred removal**: unpinned blobs stay readable until `gc`

pub mod chunks;
pub mod error;
pub mod memory;
pub mod migration;
pub mod recipes;
pub mod sqlite;
pub mod traits;

pub use chunks::{Chunk, ChunkSource, ContentChunkSource, MemoryChunkStore};
pub use error::{ChunkError, Result, StoreError};
pub use memory::MemoryContentStore;
pub use recipes::RecipeStore;
pub use sqlite::SqliteContentStore;
pub use traits::ContentStore;
