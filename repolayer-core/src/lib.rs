//! Core contract of the repolayer document repository abstraction.
//!
//! This crate defines everything the services above the storage boundary bind to:
//!
//! - **Document traits** ([`document`]) - Marker and serialization traits for stored entities
//! - **Store client boundary** ([`client`]) - The narrow async interface a document store must provide
//! - **Filter expressions** ([`filter`]) - Type-safe predicate construction over document fields
//! - **Update specifications** ([`update`]) - Partial field updates applied atomically by the store
//! - **Pagination** ([`page`]) - Page requests and paginated results with full match counts
//! - **Generic repository** ([`repository`]) - The entity-agnostic CRUD/query contract itself
//! - **Error taxonomy** ([`error`]) - Validation, not-found, and storage failures kept distinct
//! - **Payload redaction** ([`redact`]) - Loggable filter/update rendering that masks sensitive fields
//!
//! # Example
//!
//! ```ignore
//! use repolayer_core::{document::Document, repository::Repository};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Option<Uuid>,
//!     pub email: String,
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> Option<Uuid> {
//!         self.id
//!     }
//!
//!     fn set_id(&mut self, id: Uuid) {
//!         self.id = Some(id);
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! # async fn example(client: std::sync::Arc<dyn repolayer_core::client::StoreClient>) {
//! let users: Repository<User> = Repository::new(client);
//! # }
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_core;

pub mod client;
pub mod document;
pub mod error;
pub mod filter;
pub mod page;
pub mod redact;
pub mod repository;
pub mod update;

// Re-exported so derive-generated code and downstream crates agree on BSON types.
pub use bson;
