//! In-memory storage implementation for document stores.
//!
//! This module provides a simple backend that stores documents as BSON values in
//! HashMaps behind a single async-aware read-write lock.

use std::{collections::HashMap, sync::Arc, cmp::Ordering};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Uuid, Bson};

use bugdesk_store::{
    query::{Query, SortDirection},
    error::{DocumentStoreError, DocumentStoreResult},
    backend::{StoreBackend, StoreBackendBuilder},
};

use crate::evaluator::{DocumentEvaluator, Comparable, field_value};

type CollectionMap = HashMap<String, Bson>;

#[derive(Debug, Default)]
struct StoreState {
    /// collection_name -> (document_id -> document)
    collections: HashMap<String, CollectionMap>,
    /// collection_name -> fields carrying a unique index
    unique_fields: HashMap<String, Vec<String>>,
}

impl StoreState {
    fn contains(&self, collection: &str, key: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|map| map.contains_key(key))
    }

    /// Fails if another document in the collection already holds one of `doc`'s
    /// uniquely indexed values. Null and missing values never collide.
    fn ensure_unique(&self, collection: &str, key: &str, doc: &Bson) -> DocumentStoreResult<()> {
        let (Some(fields), Some(map)) = (self.unique_fields.get(collection), self.collections.get(collection)) else {
            return Ok(());
        };

        for field in fields {
            let value = field_value(doc, field);

            if value == Comparable::Null {
                continue;
            }

            let taken = map
                .iter()
                .filter(|(other, _)| other.as_str() != key)
                .any(|(_, existing)| field_value(existing, field) == value);

            if taken {
                return Err(DocumentStoreError::DuplicateKey(field.clone(), collection.to_string()));
            }
        }

        Ok(())
    }
}


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait entirely in memory. All
/// documents are stored as BSON values indexed by their UUID.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Every write takes the same lock, so
/// a uniqueness check and the write it guards happen atomically.
///
/// # Indexes
///
/// Queries scan all documents in a collection. Unique indexes are honored as
/// constraints only; they do not speed up lookups.
///
/// # Example
///
/// ```ignore
/// use bugdesk_memory::InMemoryStore;
/// use bugdesk_store::backend::StoreBackend;
/// use bson::{Uuid, Bson, doc};
///
/// let store = InMemoryStore::new();
///
/// let id = Uuid::new();
/// let doc = Bson::Document(doc! { "name": "Alice", "email": "alice@example.com" });
/// store.insert_documents(vec![(id, doc)], "users").await?;
///
/// let docs = store.get_documents(vec![id], "users").await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    ///
    /// ```ignore
    /// let store = InMemoryStore::builder().build().await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;

        for (id, doc) in documents {
            let key = id.to_string();

            if state.contains(collection, &key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
            }

            state.ensure_unique(collection, &key, &doc)?;
            state.collections
                .entry(collection.to_string())
                .or_default()
                .insert(key, doc);
        }

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;

        for (id, doc) in documents {
            let key = id.to_string();

            if !state.contains(collection, &key) {
                return Err(DocumentStoreError::DocumentNotFound(key, collection.to_string()));
            }

            state.ensure_unique(collection, &key, &doc)?;

            if let Some(collection_map) = state.collections.get_mut(collection) {
                collection_map.insert(key, doc);
            }
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;
        let Some(collection_map) = state.collections.get_mut(collection) else {
            return match ids.first() {
                Some(id) => Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string())),
                None => Ok(()),
            };
        };

        for id in ids {
            let key = id.to_string();

            if collection_map.remove(&key).is_none() {
                return Err(DocumentStoreError::DocumentNotFound(key, collection.to_string()));
            }
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let state = self.state.read().await;
        let collection_map = match state.collections.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(
            ids
                .iter()
                .filter_map(|id| collection_map.get(&id.to_string()))
                .cloned()
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let state = self.state.read().await;
        let collection_map = match state.collections.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(
                collection_map.values(),
                filter,
            )?,
            None => collection_map
                .values()
                .cloned()
                .collect::<Vec<_>>(),
        };

        if let Some(sort) = &query.sort {
            documents.sort_by(|a, b| {
                let left = field_value(a, &sort.field);
                let right = field_value(b, &sort.field);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(documents)
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.state
            .write()
            .await
            .collections
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.state
                .read()
                .await
                .collections
                .keys()
                .cloned()
                .collect()
        )
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        // Plain indexes have no effect on a full scan
        if !unique {
            return Ok(());
        }

        let mut state = self.state.write().await;
        let fields = state.unique_fields
            .entry(collection.to_string())
            .or_default();

        if !fields.iter().any(|existing| existing == field) {
            fields.push(field.to_string());
        }

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use bugdesk_memory::InMemoryStore;
/// use bugdesk_store::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance. Always succeeds.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, DateTime};
    use bugdesk_store::query::Filter;

    fn user(name: &str, email: &str) -> (Uuid, Bson) {
        (Uuid::new(), Bson::Document(doc! { "name": name, "email": email }))
    }

    #[tokio::test]
    async fn inserted_documents_can_be_fetched_by_id() {
        let store = InMemoryStore::new();
        let (id, doc) = user("Alice", "alice@example.com");

        store.insert_documents(vec![(id, doc.clone())], "users").await.unwrap();

        assert_eq!(store.get_documents(vec![id], "users").await.unwrap(), vec![doc]);
        assert!(store.get_documents(vec![Uuid::new()], "users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inserting_the_same_id_twice_fails() {
        let store = InMemoryStore::new();
        let (id, doc) = user("Alice", "alice@example.com");

        store.insert_documents(vec![(id, doc.clone())], "users").await.unwrap();
        let err = store.insert_documents(vec![(id, doc)], "users").await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(..)));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_insert() {
        let store = InMemoryStore::new();
        store.add_index("users", "email", true).await.unwrap();

        store.insert_documents(vec![user("Alice", "same@example.com")], "users").await.unwrap();
        let err = store
            .insert_documents(vec![user("Bob", "same@example.com")], "users")
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::DuplicateKey(field, _) if field == "email"));
    }

    #[tokio::test]
    async fn unique_index_allows_rewriting_own_value() {
        let store = InMemoryStore::new();
        store.add_index("users", "email", true).await.unwrap();

        let (id, doc) = user("Alice", "alice@example.com");
        store.insert_documents(vec![(id, doc)], "users").await.unwrap();

        let renamed = Bson::Document(doc! { "name": "Alicia", "email": "alice@example.com" });
        store.update_documents(vec![(id, renamed)], "users").await.unwrap();
    }

    #[tokio::test]
    async fn unique_index_rejects_update_onto_another_document() {
        let store = InMemoryStore::new();
        store.add_index("users", "email", true).await.unwrap();

        let (alice, alice_doc) = user("Alice", "alice@example.com");
        store
            .insert_documents(vec![(alice, alice_doc), user("Bob", "bob@example.com")], "users")
            .await
            .unwrap();

        let stolen = Bson::Document(doc! { "name": "Alice", "email": "bob@example.com" });
        let err = store.update_documents(vec![(alice, stolen)], "users").await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DuplicateKey(..)));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_document_fail() {
        let store = InMemoryStore::new();
        store.create_collection("bugs").await.unwrap();

        let missing = Uuid::new();
        let update = store
            .update_documents(vec![(missing, Bson::Document(doc! {}))], "bugs")
            .await
            .unwrap_err();
        let delete = store.delete_documents(vec![missing], "bugs").await.unwrap_err();
        let delete_unknown_collection = store.delete_documents(vec![missing], "nowhere").await.unwrap_err();

        assert!(matches!(update, DocumentStoreError::DocumentNotFound(..)));
        assert!(matches!(delete, DocumentStoreError::DocumentNotFound(..)));
        assert!(matches!(delete_unknown_collection, DocumentStoreError::DocumentNotFound(..)));
    }

    #[tokio::test]
    async fn query_filters_and_sorts_descending() {
        let store = InMemoryStore::new();
        let docs = [
            (1_000, "open"),
            (3_000, "open"),
            (2_000, "closed"),
            (4_000, "open"),
        ]
        .into_iter()
        .map(|(millis, status)| {
            (Uuid::new(), Bson::Document(doc! {
                "status": status,
                "createdAt": DateTime::from_millis(millis),
            }))
        })
        .collect::<Vec<_>>();
        store.insert_documents(docs, "bugs").await.unwrap();

        let query = Query::builder()
            .filter(Filter::eq("status", "open"))
            .sort("createdAt", SortDirection::Desc)
            .build();
        let found = store.query_documents(query, "bugs").await.unwrap();

        let created = found
            .iter()
            .map(|doc| doc.as_document().unwrap().get_datetime("createdAt").unwrap().timestamp_millis())
            .collect::<Vec<_>>();
        assert_eq!(created, vec![4_000, 3_000, 1_000]);
    }

    #[tokio::test]
    async fn query_on_unknown_collection_is_empty() {
        let store = InMemoryStore::new();

        assert!(store.query_documents(Query::new(), "bugs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_collection_is_listed() {
        let store = InMemoryStore::builder().build().await.unwrap();
        store.create_collection("users").await.unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["users".to_string()]);
    }
}
