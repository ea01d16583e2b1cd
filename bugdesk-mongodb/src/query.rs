//! Query translation from the store's query AST to MongoDB query syntax.

use bson::{Document, Bson, doc};

use bugdesk_store::{
    query::{QueryVisitor, Expr, FieldOp, Sort, SortDirection},
    error::DocumentStoreError,
};


/// Translates query expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub(crate) fn sort_document(sort: &Sort) -> Document {
        doc! {
            sort.field.clone(): match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        // MongoDB rejects an empty $and
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

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugdesk_store::query::Filter;

    #[test]
    fn equality_translates_to_eq_operator() {
        let translated = MongoQueryTranslator.visit_expr(&Filter::eq("status", "open")).unwrap();

        assert_eq!(translated, doc! { "status": { "$eq": "open" } });
    }

    #[test]
    fn conjunction_translates_to_and() {
        let translated = MongoQueryTranslator
            .visit_expr(&Filter::and([Filter::eq("role", "admin"), Filter::eq("status", "active")]))
            .unwrap();

        assert_eq!(
            translated,
            doc! { "$and": [
                { "role": { "$eq": "admin" } },
                { "status": { "$eq": "active" } },
            ] }
        );
    }

    #[test]
    fn empty_conjunction_matches_everything() {
        let translated = MongoQueryTranslator.visit_expr(&Filter::and(Vec::new())).unwrap();

        assert_eq!(translated, doc! {});
    }

    #[test]
    fn descending_sort_uses_minus_one() {
        let sort = Sort { field: "createdAt".into(), direction: SortDirection::Desc };

        assert_eq!(MongoQueryTranslator::sort_document(&sort), doc! { "createdAt": -1 });
    }
}
