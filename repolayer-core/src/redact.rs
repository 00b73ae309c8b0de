//! Loggable rendering of filter and update payloads with sensitive fields masked.
//!
//! Diagnostic logs carry the filter or update that a failed operation was
//! issued with. Values for field paths named in an entity's
//! [`redacted_fields`](crate::document::Document::redacted_fields) list (or
//! nested under one) are replaced with a placeholder before the payload is
//! formatted, so credentials and payment data never reach log output.

use bson::Bson;
use std::convert::Infallible;
use std::fmt;

use crate::{
    filter::{Expr, FieldOp, FilterVisitor},
    update::UpdateSpec,
};

const MASK: &str = "[redacted]";

fn is_redacted(path: &str, redacted: &[&str]) -> bool {
    redacted
        .iter()
        .any(|field| path == *field || path.starts_with(&format!("{field}.")))
}

/// `Display` adapter for a filter expression with redaction applied.
pub struct RedactedFilter<'a> {
    expr: &'a Expr,
    redacted: &'static [&'static str],
}

impl<'a> RedactedFilter<'a> {
    pub fn new(expr: &'a Expr, redacted: &'static [&'static str]) -> Self {
        Self { expr, redacted }
    }
}

impl fmt::Display for RedactedFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = ExprFormatter { redacted: self.redacted };
        let rendered = formatter
            .visit_expr(self.expr)
            .unwrap_or_default();
        f.write_str(&rendered)
    }
}

/// `Display` adapter for an update specification with redaction applied.
pub struct RedactedUpdate<'a> {
    update: &'a UpdateSpec,
    redacted: &'static [&'static str],
}

impl<'a> RedactedUpdate<'a> {
    pub fn new(update: &'a UpdateSpec, redacted: &'static [&'static str]) -> Self {
        Self { update, redacted }
    }
}

impl fmt::Display for RedactedUpdate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (path, value)) in self.update.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if is_redacted(path, self.redacted) {
                write!(f, "{path}: {MASK}")?;
            } else {
                write!(f, "{path}: {value}")?;
            }
        }
        f.write_str("}")
    }
}

struct ExprFormatter {
    redacted: &'static [&'static str],
}

impl ExprFormatter {
    fn join(&mut self, exprs: &[Expr], separator: &str, when_empty: &str) -> String {
        if exprs.is_empty() {
            return when_empty.to_string();
        }
        let parts: Vec<String> = exprs
            .iter()
            .map(|expr| self.visit_expr(expr).unwrap_or_default())
            .collect();
        if parts.len() == 1 {
            parts.into_iter().next().unwrap_or_default()
        } else {
            format!("({})", parts.join(separator))
        }
    }
}

impl FilterVisitor for ExprFormatter {
    type Output = String;
    type Error = Infallible;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<String, Infallible> {
        Ok(self.join(exprs, " && ", "*"))
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<String, Infallible> {
        Ok(self.join(exprs, " || ", "<none>"))
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<String, Infallible> {
        let inner = self.visit_expr(expr).unwrap_or_default();
        Ok(format!("!({inner})"))
    }

    fn visit_exists(&mut self, path: &str, should_exist: bool) -> Result<String, Infallible> {
        Ok(if should_exist {
            format!("{path} exists")
        } else {
            format!("{path} missing")
        })
    }

    fn visit_field(&mut self, path: &str, op: &FieldOp, value: &Bson) -> Result<String, Infallible> {
        let symbol = match op {
            FieldOp::Eq => "==",
            FieldOp::Ne => "!=",
            FieldOp::Gt => ">",
            FieldOp::Gte => ">=",
            FieldOp::Lt => "<",
            FieldOp::Lte => "<=",
            FieldOp::Contains => "contains",
            FieldOp::StartsWith => "starts_with",
            FieldOp::EndsWith => "ends_with",
        };
        if is_redacted(path, self.redacted) {
            Ok(format!("{path} {symbol} {MASK}"))
        } else {
            Ok(format!("{path} {symbol} {value}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn sensitive_values_are_masked() {
        let expr = Filter::eq("email", "alice@example.com").and(Filter::eq("password", "hunter2"));
        let rendered = RedactedFilter::new(&expr, &["password"]).to_string();

        assert!(rendered.contains("alice@example.com"));
        assert!(rendered.contains("password == [redacted]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn redaction_covers_nested_paths() {
        let expr = Filter::eq("card.number", "4242424242424242");
        let rendered = RedactedFilter::new(&expr, &["card"]).to_string();

        assert!(!rendered.contains("4242"));
        assert!(rendered.contains(MASK));
    }

    #[test]
    fn empty_filter_renders_as_wildcard() {
        let all = Filter::all();
        assert_eq!(RedactedFilter::new(&all, &[]).to_string(), "*");
    }

    #[test]
    fn update_payloads_are_masked_too() {
        let update = UpdateSpec::new()
            .set("status", "active")
            .set("password", "s3cret");
        let rendered = RedactedUpdate::new(&update, &["password"]).to_string();

        assert!(rendered.contains("status: \"active\""));
        assert!(!rendered.contains("s3cret"));
    }
}
