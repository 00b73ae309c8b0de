//! Filter translation into MongoDB query documents.

use bson::{doc, Bson, Document};

use repolayer_core::{
    error::StoreError,
    filter::{Expr, FieldOp, FilterVisitor},
};

/// Translates filter expressions into MongoDB's native query syntax.
///
/// The match-everything filter (an empty conjunction) becomes the empty
/// query document, since MongoDB rejects `$and` with an empty operand list.
/// An empty disjunction matches nothing, expressed as a constant-false
/// `$expr`.
///
/// String operators translate to metacharacter-escaped regexes with no
/// options, so matching stays case-sensitive like the in-memory
/// evaluator's.
pub(crate) struct MongoFilterTranslator;

impl FilterVisitor for MongoFilterTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! { "$expr": false });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not is only valid per-field, so negation of an arbitrary
        // subexpression goes through $nor
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, path: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            path: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, path: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            path: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => doc! { "$regex": regex::escape(s) },
                    Bson::Array(arr) => doc! { "$all": arr },
                    _ => doc! { "$elemMatch": { "$eq": value } },
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("^{}", regex::escape(s)) },
                    _ => return Err(StoreError::unknown("starts_with requires a string value")),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", regex::escape(s)) },
                    _ => return Err(StoreError::unknown("ends_with requires a string value")),
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolayer_core::filter::Filter;

    fn translate(expr: &Expr) -> Document {
        MongoFilterTranslator.visit_expr(expr).unwrap()
    }

    #[test]
    fn match_everything_is_the_empty_query() {
        assert_eq!(translate(&Filter::all()), doc! {});
    }

    #[test]
    fn empty_disjunction_matches_nothing() {
        assert_eq!(translate(&Filter::or(vec![])), doc! { "$expr": false });
    }

    #[test]
    fn field_comparisons_use_native_operators() {
        let expr = Filter::eq("email", "alice@example.com").and(Filter::gte("age", 21));
        assert_eq!(
            translate(&expr),
            doc! { "$and": [
                { "email": { "$eq": "alice@example.com" } },
                { "age": { "$gte": 21 } },
            ] }
        );
    }

    #[test]
    fn negation_goes_through_nor() {
        let expr = Filter::eq("status", "void").not();
        assert_eq!(
            translate(&expr),
            doc! { "$nor": [ { "status": { "$eq": "void" } } ] }
        );
    }

    #[test]
    fn string_contains_escapes_regex_metacharacters() {
        let expr = Filter::contains("email", "a.b+c");
        let translated = translate(&expr);
        let operator = translated.get_document("email").unwrap();
        assert_eq!(operator.get_str("$regex").unwrap(), r"a\.b\+c");
    }

    #[test]
    fn string_operators_stay_case_sensitive() {
        for expr in [
            Filter::contains("email", "ALICE"),
            Filter::starts_with("email", "ALICE"),
            Filter::ends_with("email", ".COM"),
        ] {
            let translated = translate(&expr);
            let operator = translated.get_document("email").unwrap();
            assert!(
                !operator.contains_key("$options"),
                "case-folding options on {operator}",
            );
        }
    }
}
