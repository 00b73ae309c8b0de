//! Traits stored entities implement to participate in the repository layer.

use bson::{Bson, Document as RawDocument, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::{RepositoryError, RepositoryResult};

/// Marker trait binding an entity type to its collection.
///
/// The identifier is `Option<Uuid>` on purpose: a document is built by the
/// caller with `id: None`, and the repository assigns a fresh identifier during
/// `create`. Once assigned the identifier never changes.
///
/// Most entities derive this via `#[derive(Document)]` from `repolayer-macros`:
///
/// ```ignore
/// use repolayer_macros::Document;
/// use bson::Uuid;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Document)]
/// #[document(collection = "users")]
/// pub struct User {
///     pub id: Option<Uuid>,
///     pub email: String,
///     #[document(redact)]
///     pub password: String,
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// The identifier, or `None` for a document that has not been persisted yet.
    fn id(&self) -> Option<Uuid>;

    /// Records the store-assigned identifier. Called exactly once, by `create`.
    fn set_id(&mut self, id: Uuid);

    /// The name of the collection this entity lives in.
    ///
    /// Should be a static, lowercase identifier (e.g. "users", "reservations").
    fn collection_name() -> &'static str;

    /// Field paths whose values must never appear in logs.
    ///
    /// Filter and update payloads are rendered through this list before any
    /// diagnostic output, so credentials and payment data stay out of logs.
    fn redacted_fields() -> &'static [&'static str] {
        &[]
    }
}

/// Conversion helpers between an entity and its stored/raw forms.
///
/// Automatically implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Serializes this document into a raw BSON document for storage.
    fn to_raw(&self) -> RepositoryResult<RawDocument>;

    /// Rebuilds a document from its stored BSON form.
    fn from_raw(raw: RawDocument) -> RepositoryResult<Self>;

    /// Serializes this document to a JSON value for API payloads.
    fn to_json(&self) -> RepositoryResult<Value>;

    /// Builds a document from a JSON value.
    fn from_json(value: Value) -> RepositoryResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_raw(&self) -> RepositoryResult<RawDocument> {
        match serialize_to_bson(self)? {
            Bson::Document(raw) => Ok(raw),
            _ => Err(RepositoryError::Serialization(format!(
                "entity for collection '{}' did not serialize to a BSON document",
                D::collection_name(),
            ))),
        }
    }

    fn from_raw(raw: RawDocument) -> RepositoryResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(raw))?)
    }

    fn to_json(&self) -> RepositoryResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> RepositoryResult<Self> {
        Ok(from_value(value)?)
    }
}
