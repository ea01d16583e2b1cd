use async_trait::async_trait;
use futures::{stream::iter, StreamExt, TryStreamExt};
use bson::{Document, Bson, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use bugdesk_store::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, QueryVisitor},
};

use crate::query::MongoQueryTranslator;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Stores the document ID as `_id` next to the document's own fields.
    fn prepare_document(&self, id: &Uuid, document: &Bson) -> DocumentStoreResult<Document> {
        Ok(Document::from_iter(
            document
                .as_document()
                .cloned()
                .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?
                .into_iter()
                .chain(vec![("_id".to_string(), id.into())].into_iter()),
        ))
    }

    fn restore_document(&self, document: Document) -> Bson {
        Bson::Document(
            Document::from_iter(
                document
                    .into_iter()
                    .filter(|(k, _)| k != "_id")
            )
        )
    }

    async fn replace_document(&self, id: Uuid, document: Bson, collection: &str) -> DocumentStoreResult<()> {
        let result = self.get_collection(collection)
            .replace_one(doc! { "_id": id }, self.prepare_document(&id, &document)?)
            .await
            .map_err(|e| classify_error(e, collection))?;

        if result.matched_count == 0 {
            return Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .insert_many(
                documents
                    .iter()
                    .map(|(id, doc)| self.prepare_document(id, doc))
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
            .map_err(|e| classify_error(e, collection))?;

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        iter(documents)
            .then(async |(id, doc)| self.replace_document(id, doc, collection).await)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        let requested = ids.len() as u64;
        let first = ids.first().map(Uuid::to_string).unwrap_or_default();

        let result = self.get_collection(collection)
            .delete_many(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        if result.deleted_count < requested {
            return Err(DocumentStoreError::DocumentNotFound(first, collection.to_string()));
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .find(doc! { "_id": { "$in": ids } })
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(sort) = &query.sort {
            options.sort = Some(MongoQueryTranslator::sort_document(sort));
        }

        Ok(
            self.get_collection(collection)
                .find(
                    if let Some(expr) = &query.filter {
                        MongoQueryTranslator.visit_expr(expr)?
                    } else {
                        doc! {}
                    },
                )
                .with_options(options)
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .create_collection(name)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                    .unique(unique)
                    .build()
                )
                .build()
            )
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

/// Maps a driver error to `DuplicateKey` when it is a unique index violation,
/// and to `Backend` otherwise.
fn classify_error(err: MongoError, collection: &str) -> DocumentStoreError {
    match duplicate_key_message(&err) {
        Some(message) => DocumentStoreError::DuplicateKey(duplicate_field(message), collection.to_string()),
        None => DocumentStoreError::Backend(err.to_string()),
    }
}

fn duplicate_key_message(err: &MongoError) -> Option<&str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE => {
            Some(write_error.message.as_str())
        }
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()?
            .iter()
            .find(|write_error| write_error.code == DUPLICATE_KEY_CODE)
            .map(|write_error| write_error.message.as_str()),
        _ => None,
    }
}

/// Extracts the offending field from a duplicate key message such as
/// `E11000 duplicate key error collection: bugdesk.users index: email_1 dup key: { email: "a@b.co" }`.
fn duplicate_field(message: &str) -> String {
    let from_key = message
        .split_once("dup key: {")
        .and_then(|(_, rest)| rest.split_once(':'))
        .map(|(field, _)| field.trim());

    let from_index = || {
        message
            .split_once("index: ")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .and_then(|index| index.rsplit_once('_'))
            .map(|(field, _)| field)
    };

    from_key
        .filter(|field| !field.is_empty())
        .or_else(from_index)
        .unwrap_or("value")
        .to_string()
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_field_reads_dup_key_section() {
        let message = r#"E11000 duplicate key error collection: bugdesk.users index: email_1 dup key: { email: "a@b.co" }"#;

        assert_eq!(duplicate_field(message), "email");
    }

    #[test]
    fn duplicate_field_falls_back_to_index_name() {
        let message = "E11000 duplicate key error collection: bugdesk.users index: email_1";

        assert_eq!(duplicate_field(message), "email");
    }

    #[test]
    fn duplicate_field_defaults_when_message_is_opaque() {
        assert_eq!(duplicate_field("E11000"), "value");
    }
}
