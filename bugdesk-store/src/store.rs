//! The document store handle shared by the service.
//!
//! [`DynDocumentStore`] owns a boxed backend so the concrete engine can be chosen at
//! runtime from configuration. Collections are borrowed from it per operation.
//!
//! # Example
//!
//! ```ignore
//! use bugdesk_store::store::DynDocumentStore;
//!
//! let store = DynDocumentStore::from_backend(backend);
//! let users = store.collection::<User>();
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::Collection,
    document::Document,
    error::DocumentStoreResult,
};

#[derive(Debug)]
pub struct DynDocumentStore {
    backend: Box<dyn DynStoreBackend>,
}

impl DynDocumentStore {
    /// Creates a new dynamic document store with the given backend trait object.
    pub fn new(backend: Box<dyn DynStoreBackend>) -> Self {
        Self { backend }
    }

    /// Boxes a concrete backend into a dynamic document store.
    pub fn from_backend<B: StoreBackend + 'static>(backend: B) -> Self {
        Self::new(Box::new(backend))
    }

    /// Gets a typed collection for the specified document type.
    pub fn collection<D: Document>(&self) -> Collection<'_, D> {
        Collection::new(&*self.backend)
    }

    /// Creates the collection backing `D` unless the store already has it.
    pub async fn ensure_collection<D: Document>(&self) -> DocumentStoreResult<()> {
        let name = D::collection_name();
        let existing = self.backend.list_collections().await?;

        if existing.iter().any(|collection| collection == name) {
            return Ok(());
        }

        self.backend.create_collection(name).await
    }

    /// Adds an index to a field of the collection backing `D`.
    pub async fn add_index<D: Document>(&self, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.backend
            .add_index(D::collection_name(), field, unique)
            .await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown_boxed().await
    }
}
