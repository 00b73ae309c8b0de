//! MongoDB store client for repolayer.
//!
//! Implements [`StoreClient`](repolayer_core::client::StoreClient) on top of
//! the official MongoDB driver. Filters translate into native query
//! documents, the atomic find-and-mutate operations map onto
//! `findOneAndUpdate` / `findOneAndDelete`, and connection plus
//! per-operation deadlines are configured through the builder.
//!
//! ```ignore
//! use std::time::Duration;
//! use repolayer_mongodb::MongoClient;
//!
//! let client = MongoClient::builder("mongodb://localhost:27017", "reservations")
//!     .connect_timeout(Duration::from_secs(5))
//!     .build()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as repolayer_mongodb;

pub mod client;
pub mod query;

pub use client::{MongoClient, MongoClientBuilder};
