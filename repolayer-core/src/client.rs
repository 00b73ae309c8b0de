//! The store client boundary: the narrow interface a document store must provide.

use async_trait::async_trait;
use bson::{Document as RawDocument, Uuid};
use std::fmt::Debug;

use crate::{error::StoreResult, filter::Expr, update::UpdateSpec};

/// Async interface to a remote (or in-memory) document store.
///
/// One client instance owns the connection pool for the whole process; it is
/// created once at startup and shared across every repository via `Arc`. The
/// trait is object-safe so repositories can hold `Arc<dyn StoreClient>` without
/// caring which backend is behind it.
///
/// # Atomicity
///
/// `find_one_and_update` and `find_one_and_delete` are single atomic
/// find-and-mutate requests. Implementations must never emulate them with a
/// separate read followed by a separate write; the store is the sole arbiter
/// of read-modify-write atomicity.
///
/// # Absence vs failure
///
/// Lookup primitives return `Ok(None)` when nothing matched. A `StoreError` is
/// reserved for transport and backend failures, so callers can always tell the
/// two apart.
///
/// # Concurrency
///
/// Every method is a self-contained request/response exchange; implementations
/// must support many in-flight calls at once and suspend (not block) for the
/// duration of the round trip.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug {
    /// Inserts a new document under the given identifier.
    async fn insert(&self, collection: &str, id: Uuid, document: RawDocument) -> StoreResult<()>;

    /// Returns one document matching the filter, or `None`.
    ///
    /// When several documents match, which one is returned is store-defined.
    async fn find_one(&self, collection: &str, filter: &Expr) -> StoreResult<Option<RawDocument>>;

    /// Atomically locates one matching document and applies the update,
    /// returning the post-update state, or `None` if nothing matched.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Expr,
        update: &UpdateSpec,
    ) -> StoreResult<Option<RawDocument>>;

    /// Returns matching documents after skipping `skip` and taking at most `limit`.
    async fn find(
        &self,
        collection: &str,
        filter: &Expr,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<RawDocument>>;

    /// Counts every document matching the filter, ignoring any pagination.
    async fn count_documents(&self, collection: &str, filter: &Expr) -> StoreResult<u64>;

    /// Atomically locates one matching document and removes it, returning its
    /// last state, or `None` if nothing matched.
    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: &Expr,
    ) -> StoreResult<Option<RawDocument>>;
}
