//! In-memory document storage backend for bugdesk.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It is the default backend of the service and the one its tests run against.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Type-erased storage** - Stores documents as BSON, exactly as a persistent backend would see them
//! - **Query support** - Equality filters and single-field sorting
//! - **Unique indexes** - Rejects writes that would duplicate a uniquely indexed value
//!
//! # Quick Start
//!
//! ```ignore
//! use bugdesk_memory::InMemoryStore;
//! use bugdesk_store::{backend::StoreBackendBuilder, store::DynDocumentStore};
//!
//! let backend = InMemoryStore::builder().build().await?;
//! let store = DynDocumentStore::from_backend(backend);
//! ```

mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
