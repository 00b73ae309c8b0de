//! Filter evaluation and update application for in-memory documents.
//!
//! The store keeps documents as plain BSON, so matching a filter means
//! walking the expression tree against each candidate document. Field paths
//! use dot notation and resolve through nested documents.

use bson::{Bson, Document as RawDocument, datetime::DateTime};
use std::{cmp::Ordering, collections::HashMap};

use repolayer_core::{
    error::{StoreError, StoreResult},
    filter::{Expr, FieldOp, FilterVisitor},
    update::UpdateSpec,
};

/// Resolves a dotted field path against a document.
///
/// `"charge.amount"` looks up `charge`, then `amount` inside it. Returns
/// `None` when any segment is missing or a non-terminal segment is not a
/// document.
pub(crate) fn resolve_path<'a>(document: &'a RawDocument, path: &str) -> Option<&'a Bson> {
    match path.split_once('.') {
        None => document.get(path),
        Some((head, rest)) => match document.get(head) {
            Some(Bson::Document(nested)) => resolve_path(nested, rest),
            _ => None,
        },
    }
}

/// Sets a dotted field path on a document, creating intermediate documents
/// as needed. A non-document value in the middle of the path is replaced.
pub(crate) fn set_path(document: &mut RawDocument, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, RawDocument::new());
            }
            if let Some(Bson::Document(nested)) = document.get_mut(head) {
                set_path(nested, rest, value);
            }
        }
    }
}

/// Applies every field of an update specification to a document in place.
pub(crate) fn apply_update(document: &mut RawDocument, update: &UpdateSpec) {
    for (path, value) in update.fields() {
        set_path(document, path, value.clone());
    }
}

/// Type-erased, comparable view of a BSON value.
///
/// Normalizes all numeric types to f64 so that, say, an `Int32` filter value
/// compares equal to an `Int64` field. Binary values (including UUIDs, which
/// BSON encodes as binary) compare by their bytes; anything else without a
/// meaningful ordering becomes `Opaque` and never matches.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Bytes(&'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    Opaque,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Bytes(&binary.bytes),
            Bson::Array(arr) => {
                Comparable::Array(arr.iter().map(Comparable::from).collect::<Vec<_>>())
            }
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Opaque,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a RawDocument,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a RawDocument) -> Self {
        Self { document }
    }

    pub fn matches(document: &RawDocument, expr: &Expr) -> StoreResult<bool> {
        DocumentEvaluator::new(document).visit_expr(expr)
    }
}

impl<'a> FilterVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, path: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(resolve_path(self.document, path).is_some() == should_exist)
    }

    fn visit_field(&mut self, path: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = resolve_path(self.document, path) else {
            return Ok(false);
        };

        match op {
            FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
            FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => Ok(match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        FieldOp::Lte => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    }),
                    None => Ok(false),
                }
            }
            FieldOp::Contains => match Comparable::from(field_value) {
                Comparable::Array(array) => {
                    Ok(array.iter().any(|item| item == &Comparable::from(value)))
                }
                Comparable::String(left) => match Comparable::from(value) {
                    Comparable::String(right) => Ok(left.contains(right)),
                    _ => Ok(false),
                },
                _ => Ok(false),
            },
            FieldOp::StartsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::String(left), Comparable::String(right)) => Ok(left.starts_with(right)),
                _ => Ok(false),
            },
            FieldOp::EndsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::String(left), Comparable::String(right)) => Ok(left.ends_with(right)),
                _ => Ok(false),
            },
        }
    }
}
