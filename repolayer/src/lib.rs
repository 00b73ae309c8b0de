//! Main repolayer crate providing a unified interface to the document
//! repository layer.
//!
//! This crate is the primary entry point for users of repolayer. It
//! re-exports the core types from the sub-crates and provides convenient
//! access to the storage backends.
//!
//! # Quick Start
//!
//! ```ignore
//! use repolayer::{prelude::*, memory::InMemoryClient};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//! use std::sync::Arc;
//!
//! #[derive(Document, Debug, Clone, Serialize, Deserialize)]
//! #[document(collection = "users")]
//! pub struct User {
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     pub id: Option<Uuid>,
//!     pub email: String,
//!     #[document(redact)]
//!     pub password: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(InMemoryClient::new());
//!     let users: Repository<User> = Repository::new(client);
//!
//!     let created = users
//!         .create(&User {
//!             id: None,
//!             email: "alice@example.com".to_string(),
//!             password: "<hash>".to_string(),
//!         })
//!         .await?;
//!
//!     let found = users
//!         .find_one(&Filter::eq("email", "alice@example.com"))
//!         .await?;
//!     assert_eq!(found.id, created.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! Every repository operation is a single round trip to the shared
//! [`StoreClient`](client::StoreClient); atomic read-modify-write operations
//! (`find_one_and_update`, `find_one_and_delete`) are delegated to the
//! store, never emulated. Paginated reads return the page plus the total
//! size of the matching set.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use repolayer_core::{client, document, error, filter, page, redact, repository, update};

pub use repolayer_macros::Document;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend.
pub mod memory {
    pub use repolayer_memory::InMemoryClient;
}

/// MongoDB storage backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use repolayer_mongodb::{MongoClient, MongoClientBuilder};
}
