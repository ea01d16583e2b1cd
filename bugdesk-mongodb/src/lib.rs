//! MongoDB backend implementation for bugdesk.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! giving the service persistent storage with filtering and sorting pushed down to
//! MongoDB's query engine.
//!
//! The service only links this backend when built with the `mongodb` feature:
//!
//! ```toml
//! [dependencies]
//! bugdesk = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Filters and sorts are translated to MongoDB query documents
//! - **Unique indexes** - Duplicate key errors (code 11000) surface as `DuplicateKey`
//!
//! # Example
//!
//! ```ignore
//! use bugdesk_mongodb::MongoDbStore;
//! use bugdesk_store::backend::StoreBackendBuilder;
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "bugdesk")
//!     .build()
//!     .await?;
//! ```


pub mod store;
pub mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
