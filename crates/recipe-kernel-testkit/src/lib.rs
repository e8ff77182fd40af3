//! # Recipe Kernel Testkit
//!
//! Testing utilities for the Recipe Kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A fully wired kernel over in-memory collaborators
//! - **Faults**: Collaborator wrappers that fail on demand
//! - **Generators**: Proptest strategies for property-based testing
//! - **Golden vectors**: Known recipe bodies with their expected canonical bytes
//!
//! ## Golden Vectors
//!
//! ```rust
//! use recipe_kernel_testkit::vectors::{all_vectors, body_from_vector};
//!
//! for vector in all_vectors() {
//!     let body = body_from_vector(&vector);
//!     assert_eq!(hex::encode(body.canonical_bytes()), vector.expected_canonical_hex);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use recipe_kernel_testkit::generators::{RecipeParams, body_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn id_is_deterministic(params: RecipeParams) {
//!         prop_assert_eq!(body_from_params(&params).compute_id(), body_from_params(&params).compute_id());
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust,no_run
//! use recipe_kernel_testkit::KernelFixture;
//!
//! async fn run() {
//!     let fixture = KernelFixture::started().await;
//!     let recipe = fixture.create_demo().await.unwrap();
//!     let artifact = fixture.kernel.execute(&recipe).await.unwrap();
//!     assert_eq!(&artifact[..], b"hello world");
//! }
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faults::{FlakyChunkSource, FlakyContentStore, FlakyFabric};
pub use fixtures::{init_tracing, metadata, KernelFixture, TestKernel};
