//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for query expressions and the
//! comparison rules shared by filtering, sorting and unique-index checks.

use std::cmp::Ordering;
use bson::{Bson, datetime::DateTime};

use bugdesk_store::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Comparable view of a BSON value.
///
/// Numeric types are normalized to f64 so that an Int32 and an Int64 holding
/// the same number compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            // Documents, binaries and the rest are never filter or sort keys here
            _ => Comparable::Null,
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
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
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
            _ => None,
        }
    }
}

/// Looks up a top-level field of a stored document as a [`Comparable`].
///
/// Missing fields and non-document values read as `Null`.
pub(crate) fn field_value<'a>(document: &'a Bson, field: &str) -> Comparable<'a> {
    document
        .as_document()
        .and_then(|doc| doc.get(field))
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Bson,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut matched = Vec::new();

        for doc in documents {
            if DocumentEvaluator::new(doc).evaluate(expr)? {
                matched.push(doc.clone());
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let present = self.document
            .as_document()
            .and_then(|doc| doc.get(field));

        match (present, op) {
            (Some(field_value), FieldOp::Eq) => Ok(Comparable::from(field_value) == Comparable::from(value)),
            (None, _) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bugdesk_store::query::Filter;

    #[test]
    fn equality_matches_strings_exactly() {
        let doc = Bson::Document(doc! { "status": "open", "project": "General" });

        assert!(DocumentEvaluator::new(&doc).evaluate(&Filter::eq("status", "open")).unwrap());
        assert!(!DocumentEvaluator::new(&doc).evaluate(&Filter::eq("status", "Open")).unwrap());
    }

    #[test]
    fn conjunction_requires_every_branch() {
        let doc = Bson::Document(doc! { "status": "open", "priority": "low" });
        let expr = Filter::and([Filter::eq("status", "open"), Filter::eq("priority", "high")]);

        assert!(!DocumentEvaluator::new(&doc).evaluate(&expr).unwrap());
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = Bson::Document(doc! { "status": "open" });

        assert!(!DocumentEvaluator::new(&doc).evaluate(&Filter::eq("role", "admin")).unwrap());
    }

    #[test]
    fn numbers_compare_across_widths() {
        let doc = Bson::Document(doc! { "count": 3_i32 });

        assert!(DocumentEvaluator::new(&doc).evaluate(&Filter::eq("count", 3_i64)).unwrap());
    }
}
