//! The generic, entity-agnostic document repository.

use bson::Uuid;
use futures::try_join;
use std::{fmt, marker::PhantomData, sync::Arc};
use tracing::{error, warn};

use crate::{
    client::StoreClient,
    document::{Document, DocumentExt},
    error::{RepositoryError, RepositoryResult, StoreError},
    filter::Expr,
    page::{Page, PageRequest},
    redact::{RedactedFilter, RedactedUpdate},
    update::UpdateSpec,
};

/// A typed repository over one entity's collection.
///
/// The repository shields the service layer from store-specific query syntax
/// and store-level error types: every operation is a single self-contained
/// round trip to the shared [`StoreClient`], failures come back as the
/// [`RepositoryError`] taxonomy, and every failure is logged with its
/// operation context (payloads pass through the entity's redaction list
/// first).
///
/// The only state is the shared client handle and the collection name, so a
/// repository is cheap to clone and safe to call from any number of tasks
/// concurrently. Atomicity of read-modify-write operations is delegated
/// entirely to the store.
pub struct Repository<D: Document> {
    client: Arc<dyn StoreClient>,
    collection: &'static str,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            collection: self.collection,
            _marker: PhantomData,
        }
    }
}

impl<D: Document> fmt::Debug for Repository<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<D: Document> Repository<D> {
    /// Creates a repository over the entity's collection, sharing the
    /// process-wide store client.
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self {
            client,
            collection: D::collection_name(),
            _marker: PhantomData,
        }
    }

    /// The collection this repository operates on.
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    fn redacted<'a>(&self, filter: &'a Expr) -> RedactedFilter<'a> {
        RedactedFilter::new(filter, D::redacted_fields())
    }

    fn storage_error(&self, operation: &'static str, filter: &Expr, err: StoreError) -> RepositoryError {
        error!(
            collection = self.collection,
            operation,
            filter = %self.redacted(filter),
            %err,
            "document store request failed",
        );
        RepositoryError::Storage(err)
    }

    fn not_found(&self, operation: &'static str, filter: &Expr) -> RepositoryError {
        warn!(
            collection = self.collection,
            operation,
            filter = %self.redacted(filter),
            "no document matched",
        );
        RepositoryError::not_found(self.collection)
    }

    /// Persists a new document and returns it with its assigned identifier.
    ///
    /// The input must not already carry an identifier; a fresh one is
    /// generated here. The document is serialized into a detached copy before
    /// submission, so mutating the caller-held value afterwards can never
    /// reach the persisted record (and vice versa).
    pub async fn create(&self, document: &D) -> RepositoryResult<D> {
        if document.id().is_some() {
            return Err(RepositoryError::Validation(format!(
                "documents in '{}' are assigned their identifier at creation; \
                 the input must not carry one",
                self.collection
            )));
        }

        let mut created = document.clone();
        let id = Uuid::new();
        created.set_id(id);
        let raw = created.to_raw()?;

        if let Err(err) = self.client.insert(self.collection, id, raw).await {
            error!(
                collection = self.collection,
                operation = "create",
                %id,
                %err,
                "failed to persist document",
            );
            return Err(err.into());
        }

        Ok(created)
    }

    /// Returns the single document matching the filter.
    ///
    /// Fails with [`RepositoryError::NotFound`] when nothing matches. When
    /// more than one document matches, which one is returned is store-defined
    /// and should be treated as non-deterministic unless the filter is
    /// unique-key-based. Never mutates store state.
    pub async fn find_one(&self, filter: &Expr) -> RepositoryResult<D> {
        let found = self
            .client
            .find_one(self.collection, filter)
            .await
            .map_err(|err| self.storage_error("find_one", filter, err))?;

        match found {
            Some(raw) => Ok(D::from_raw(raw)?),
            None => Err(self.not_found("find_one", filter)),
        }
    }

    /// Atomically locates one matching document, applies the update, and
    /// returns the post-update state.
    ///
    /// The identifier is immutable; an update naming `id` is rejected before
    /// anything reaches the store. A [`Timeout`](crate::error::StoreErrorKind::Timeout)
    /// failure here means the outcome is unknown - re-check with
    /// [`find_one`](Self::find_one) rather than assuming the update was lost.
    pub async fn find_one_and_update(
        &self,
        filter: &Expr,
        update: &UpdateSpec,
    ) -> RepositoryResult<D> {
        if update.is_empty() {
            return Err(RepositoryError::Validation(
                "update specification names no fields".to_string(),
            ));
        }
        if update.touches("id") {
            return Err(RepositoryError::Validation(
                "document identifiers are immutable and cannot be updated".to_string(),
            ));
        }

        let updated = self
            .client
            .find_one_and_update(self.collection, filter, update)
            .await
            .map_err(|err| {
                error!(
                    collection = self.collection,
                    operation = "find_one_and_update",
                    filter = %self.redacted(filter),
                    update = %RedactedUpdate::new(update, D::redacted_fields()),
                    %err,
                    "document store request failed",
                );
                RepositoryError::Storage(err)
            })?;

        match updated {
            Some(raw) => Ok(D::from_raw(raw)?),
            None => Err(self.not_found("find_one_and_update", filter)),
        }
    }

    /// Returns one page of matches plus the total count of the full matching
    /// set.
    ///
    /// The page query and the unbounded count are issued concurrently. Zero
    /// matches is not an error: the result is an empty page with `total == 0`.
    pub async fn find(&self, filter: &Expr, page: &PageRequest) -> RepositoryResult<Page<D>> {
        page.validate()?;

        let (raw, total) = try_join!(
            self.client
                .find(self.collection, filter, page.offset(), page.limit),
            self.client.count_documents(self.collection, filter),
        )
        .map_err(|err| self.storage_error("find", filter, err))?;

        let data = raw
            .into_iter()
            .map(D::from_raw)
            .collect::<RepositoryResult<Vec<D>>>()?;

        Ok(Page {
            data,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Atomically locates one matching document, removes it, and returns its
    /// last state.
    ///
    /// Fails with [`RepositoryError::NotFound`] when nothing matches. As with
    /// updates, a timeout leaves the outcome unknown.
    pub async fn find_one_and_delete(&self, filter: &Expr) -> RepositoryResult<D> {
        let deleted = self
            .client
            .find_one_and_delete(self.collection, filter)
            .await
            .map_err(|err| self.storage_error("find_one_and_delete", filter, err))?;

        match deleted {
            Some(raw) => Ok(D::from_raw(raw)?),
            None => Err(self.not_found("find_one_and_delete", filter)),
        }
    }
}
