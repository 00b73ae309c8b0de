//! Partial update specifications.

use bson::{Bson, Document as RawDocument};

/// A partial mapping from field paths to replacement values.
///
/// The store applies the whole specification to a single matched document in
/// one atomic find-and-mutate request; fields not named here are left
/// untouched. Setting the same path twice keeps the last value.
///
/// ```ignore
/// use repolayer_core::update::UpdateSpec;
///
/// let update = UpdateSpec::new()
///     .set("status", "confirmed")
///     .set("charge.amount_cents", 4200);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    fields: Vec<(String, Bson)>,
}

impl UpdateSpec {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field path to a new value, replacing any earlier value for the
    /// same path.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        let path = path.into();
        self.fields.retain(|(existing, _)| *existing != path);
        self.fields.push((path, value.into()));
        self
    }

    /// True when no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates the `(path, value)` pairs in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Bson)> {
        self.fields
            .iter()
            .map(|(path, value)| (path.as_str(), value))
    }

    /// Whether any set path is, or lives under, the given field.
    pub fn touches(&self, field: &str) -> bool {
        self.fields
            .iter()
            .any(|(path, _)| path == field || path.starts_with(&format!("{field}.")))
    }

    /// Renders the specification as a flat BSON document keyed by field path.
    pub fn to_raw(&self) -> RawDocument {
        self.fields
            .iter()
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect()
    }
}
