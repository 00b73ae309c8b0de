//! Error taxonomy for repository and store operations.
//!
//! Failures are split into two layers. [`StoreError`] is what a store client may
//! return: a transport or backend failure classified by [`StoreErrorKind`].
//! Absence of a document is *not* a store error - lookup primitives return
//! `Option` and the repository translates `None` into
//! [`RepositoryError::NotFound`], so callers can always tell "nothing there"
//! apart from "store unreachable".

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use thiserror::Error;

/// Classification of a store-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The store could not be reached or the connection was lost mid-flight.
    Connection,
    /// The externally imposed deadline for the operation elapsed.
    ///
    /// For a mutating call this means *unknown outcome*: the request may or may
    /// not have committed. Callers must re-check with a lookup rather than
    /// assume failure.
    Timeout,
    /// Any other backend failure.
    Unknown,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreErrorKind::Connection => "connection",
            StoreErrorKind::Timeout => "timeout",
            StoreErrorKind::Unknown => "unknown",
        })
    }
}

/// A transport or backend failure raised by a [`StoreClient`](crate::client::StoreClient).
#[derive(Error, Debug)]
#[error("document store {kind} failure: {message}")]
pub struct StoreError {
    /// What class of failure this is.
    pub kind: StoreErrorKind,
    /// Human-readable detail from the backend driver.
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Connection, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unknown, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == StoreErrorKind::Timeout
    }
}

/// A specialized `Result` for store client operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// All failures a repository operation can surface to the service layer.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Malformed input, rejected before anything reaches the store.
    /// Never retried.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Zero documents matched a lookup, update, or delete filter.
    #[error("no document matched in collection '{collection}'")]
    NotFound {
        /// The collection that was queried.
        collection: String,
    },
    /// A document failed to encode to or decode from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The store reported a transport or backend failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RepositoryError {
    pub fn not_found(collection: impl Into<String>) -> Self {
        RepositoryError::NotFound { collection: collection.into() }
    }

    /// True when the failure is the typed "absent" result rather than a real error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// A specialized `Result` for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<BsonError> for RepositoryError {
    fn from(err: BsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for RepositoryError {
    fn from(err: SerdeJsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable_from_storage_failure() {
        let absent = RepositoryError::not_found("users");
        let unreachable = RepositoryError::from(StoreError::connection("refused"));

        assert!(absent.is_not_found());
        assert!(!unreachable.is_not_found());
    }

    #[test]
    fn store_error_kind_renders_in_message() {
        let err = StoreError::timeout("exceeded 5s");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "document store timeout failure: exceeded 5s");
    }
}
