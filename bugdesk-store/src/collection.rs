//! Typed access to a single collection.
//!
//! A [`Collection`] borrows the store's backend and converts between a concrete
//! [`Document`] type and the BSON handed to the backend.
//!
//! # Example
//!
//! ```ignore
//! let bugs = store.collection::<Bug>();
//! bugs.insert(bug.clone()).await?;
//! let found = bugs.get(*bug.id()).await?;
//! ```

use bson::Uuid;
use std::marker::PhantomData;

use crate::{
    backend::DynStoreBackend,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

/// A type-safe collection for a specific document type.
///
/// The collection name comes from [`Document::collection_name`].
pub struct Collection<'a, D: Document> {
    name: String,
    backend: &'a dyn DynStoreBackend,
    _marker: PhantomData<D>,
}

impl<'a, D: Document> Collection<'a, D> {
    pub(crate) fn new(backend: &'a dyn DynStoreBackend) -> Self {
        Self {
            name: D::collection_name().to_string(),
            backend,
            _marker: PhantomData,
        }
    }

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if a uniquely indexed field collides with another document.
    pub async fn insert(&self, document: D) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(vec![(*document.id(), document.to_bson()?)], &self.name)
            .await
    }

    /// Replaces a stored document with the given version.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if no document has this document's ID.
    pub async fn update(&self, document: D) -> DocumentStoreResult<()> {
        self.backend
            .update_documents(vec![(*document.id(), document.to_bson()?)], &self.name)
            .await
    }

    /// Deletes the document with the given ID.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if no document has this ID.
    pub async fn delete(&self, id: Uuid) -> DocumentStoreResult<()> {
        self.backend
            .delete_documents(vec![id], &self.name)
            .await
    }

    /// Retrieves the document with the given ID, if any.
    pub async fn get(&self, id: Uuid) -> DocumentStoreResult<Option<D>> {
        self.backend
            .get_documents(vec![id], &self.name)
            .await?
            .into_iter()
            .next()
            .map(D::from_bson)
            .transpose()
    }

    /// Retrieves every document matching the query, in the query's sort order.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .query_documents(query, &self.name)
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect()
    }
}

/// Returns `Ok(None)` for a `DocumentNotFound` error, passing every other outcome through.
///
/// Useful where a document can disappear between a read and the following write.
pub fn not_found_as_none<T>(result: DocumentStoreResult<T>) -> DocumentStoreResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DocumentStoreError::DocumentNotFound(..)) => Ok(None),
        Err(err) => Err(err),
    }
}
