//! Document storage layer for bugdesk.
//!
//! This crate defines the storage-facing half of the service:
//!
//! - **Document traits** ([`document`]) - How an entity identifies itself and names its collection
//! - **Store backend abstraction** ([`backend`]) - Traits implemented by the in-memory and MongoDB backends
//! - **Query and filtering API** ([`query`]) - Equality filters and sorting, translated by each backend
//! - **Collections interface** ([`collection`]) - Typed access to one collection
//! - **Document store** ([`store`]) - The runtime-selected store handle shared by the service
//! - **Error handling** ([`error`]) - Store error taxonomy and result alias
//!
//! # Example
//!
//! ```ignore
//! use bugdesk_store::{document::Document, store::DynDocumentStore};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Note {
//!     pub id: Uuid,
//!     pub body: String,
//! }
//!
//! impl Document for Note {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "notes"
//!     }
//! }
//!
//! let notes = store.collection::<Note>();
//! notes.insert(Note { id: Uuid::new(), body: "hello".into() }).await?;
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod query;
pub mod store;
