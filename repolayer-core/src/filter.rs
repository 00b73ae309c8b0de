//! Filter expression construction for document lookups.
//!
//! A filter is a predicate over document field paths. Structurally it is a
//! small expression tree: field comparisons at the leaves, logical combinators
//! above them. Backends consume the tree through [`FilterVisitor`] - the
//! in-memory client evaluates it directly, the MongoDB client translates it to
//! native query syntax.
//!
//! # Building filters
//!
//! The [`Filter`] namespace provides the constructors:
//!
//! ```ignore
//! use repolayer_core::filter::Filter;
//!
//! // unique-key lookup
//! let by_email = Filter::eq("email", "alice@example.com");
//!
//! // composed predicate; field paths may be dotted to reach nested fields
//! let active_adults = Filter::eq("status", "active").and(Filter::gte("profile.age", 18));
//!
//! // matches every document in the collection
//! let everything = Filter::all();
//! ```

use bson::Bson;

/// Comparison operators usable at a filter leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// String contains substring, or array contains element.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
}

/// A filter expression tree.
///
/// `And` of an empty list is the match-everything filter (see [`Filter::all`]);
/// `Or` of an empty list matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All sub-expressions must match.
    And(Vec<Expr>),
    /// At least one sub-expression must match.
    Or(Vec<Expr>),
    /// Inverts the inner expression.
    Not(Box<Expr>),
    /// The field path exists (`true`) or is absent (`false`).
    Exists(String, bool),
    /// A field comparison leaf.
    Field {
        /// Dotted path to the field being compared.
        path: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value compared against.
        value: Bson,
    },
}

impl Expr {
    /// Builds a field comparison leaf.
    pub fn field(path: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { path, op, value }
    }

    /// Combines this expression with another so both must match.
    ///
    /// Flattens into an existing `And` instead of nesting.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another so either may match.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// True for the match-everything filter.
    pub fn matches_all(&self) -> bool {
        matches!(self, Expr::And(list) if list.is_empty())
    }
}

/// Constructor namespace for filter expressions.
pub struct Filter;

impl Filter {
    /// The empty filter: matches every document in the collection.
    pub fn all() -> Expr {
        Expr::And(Vec::new())
    }

    /// Field equals the given value.
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Eq, value.into())
    }

    /// Field does not equal the given value.
    pub fn ne(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Ne, value.into())
    }

    /// Field is greater than the given value.
    pub fn gt(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Gt, value.into())
    }

    /// Field is greater than or equal to the given value.
    pub fn gte(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Gte, value.into())
    }

    /// Field is less than the given value.
    pub fn lt(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Lt, value.into())
    }

    /// Field is less than or equal to the given value.
    pub fn lte(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Lte, value.into())
    }

    /// String field contains the substring, or array field contains the element.
    pub fn contains(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::Contains, value.into())
    }

    /// String field starts with the given prefix.
    pub fn starts_with(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::StartsWith, value.into())
    }

    /// String field ends with the given suffix.
    pub fn ends_with(path: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(path.into(), FieldOp::EndsWith, value.into())
    }

    /// The field path exists on the document.
    pub fn exists(path: impl Into<String>) -> Expr {
        Expr::Exists(path.into(), true)
    }

    /// The field path is absent from the document.
    pub fn not_exists(path: impl Into<String>) -> Expr {
        Expr::Exists(path.into(), false)
    }

    /// All given expressions must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// At least one of the given expressions must match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// Visitor over a filter expression tree.
///
/// Backends implement this to fold an [`Expr`] into whatever their engine
/// consumes: a boolean for in-memory evaluation, a native query document for a
/// remote store, a display string for redacted logging.
pub trait FilterVisitor {
    type Output;
    type Error;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, path: &str, should_exist: bool)
    -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        path: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(path, should_exist) => self.visit_exists(path, *should_exist),
            Expr::Field { path, op, value } => self.visit_field(path, op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_instead_of_nesting() {
        let expr = Filter::eq("a", 1)
            .and(Filter::eq("b", 2))
            .and(Filter::eq("c", 3));

        match expr {
            Expr::And(list) => assert_eq!(list.len(), 3),
            other => panic!("expected flat And, got {other:?}"),
        }
    }

    #[test]
    fn all_is_the_empty_and() {
        assert!(Filter::all().matches_all());
        assert!(!Filter::eq("a", 1).matches_all());
        assert!(!Filter::or([]).matches_all());
    }

    #[test]
    fn field_leaf_carries_path_op_value() {
        let expr = Filter::gte("profile.age", 18);
        assert_eq!(
            expr,
            Expr::Field {
                path: "profile.age".to_string(),
                op: FieldOp::Gte,
                value: Bson::Int32(18),
            }
        );
    }
}
