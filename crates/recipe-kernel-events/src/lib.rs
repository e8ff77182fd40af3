//! # Recipe Kernel Events
//!
//! Lifecycle events and the fabric they are published on.
//!
//! ## Topics
//!
//! | Topic                 | Payload                      |
//! |-----------------------|------------------------------|
//! | `new-recipe`          | `{id, creator, metadata}`    |
//! | `update-recipe`       | `{id, updates}`              |
//! | `delete-recipe`       | `{id}`                       |
//! | `update-recipe-value` | `{id, value}`                |
//!
//! Events are published only after the change they describe has been
//! committed. Delivery is best-effort: the [`Notifier`] retries per its
//! [`RetryPolicy`] and then logs and moves on.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipe_kernel_events::{EventFabric, MemoryHub, NodeId, Notifier, RetryPolicy};
//!
//! async fn wire_up() {
//!     let hub = MemoryHub::new(64);
//!     let fabric = Arc::new(hub.fabric(NodeId::random()));
//!     fabric.start().await.unwrap();
//!
//!     let mut events = hub.subscribe();
//!     let notifier = Notifier::new(fabric, RetryPolicy::default());
//!     // notifier.notify(&event).await;
//!     // let envelope = events.recv().await?;
//! }
//! ```

pub mod error;
pub mod events;
pub mod fabric;
pub mod notifier;

pub use error::{EventError, Result};
pub use events::{
    topics, DeleteRecipe, NewRecipe, NodeId, RecipeEvent, UpdateRecipe, UpdateRecipeValue,
};
pub use fabric::memory::{MemoryFabric, MemoryHub, Subscription};
pub use fabric::{Envelope, EventFabric};
pub use notifier::{Notifier, NotifyOutcome, RetryPolicy};
