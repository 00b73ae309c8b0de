//! In-memory store client for repolayer.
//!
//! A thread-safe, full-fidelity implementation of
//! [`StoreClient`](repolayer_core::client::StoreClient) that keeps every
//! document in process memory. Intended for tests and local development; it
//! honors the same atomicity and absence-versus-failure contract as the
//! real backends, so service code exercised against it behaves identically
//! against MongoDB.
//!
//! ```ignore
//! use std::sync::Arc;
//! use repolayer_core::repository::Repository;
//! use repolayer_memory::InMemoryClient;
//!
//! let client = Arc::new(InMemoryClient::new());
//! let users: Repository<User> = Repository::new(client);
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_memory;

pub mod client;
pub mod evaluator;

pub use client::InMemoryClient;
