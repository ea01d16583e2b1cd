//! HTTP service tracking bug reports and the users who file and fix them.
//!
//! The service is organised in layers:
//!
//! - **Models** ([`model`]) - Stored documents, request payloads, validation and statistics
//! - **Repositories** ([`repository`]) - Filtered listing and mutations over the document store
//! - **API** ([`api`]) - axum routes, handlers and the JSON response envelope
//! - **Errors** ([`error`]) - The service error taxonomy and its HTTP mapping
//! - **Configuration** ([`config`]) and **logging** ([`telemetry`]) for the binary
//!
//! Storage goes through `bugdesk-store`, so the same handlers run against the in-memory
//! backend or, with the `mongodb` feature, a MongoDB database.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bugdesk::{api::{self, AppState}, repository};
//! use bugdesk_memory::InMemoryStore;
//! use bugdesk_store::store::DynDocumentStore;
//!
//! let store = Arc::new(DynDocumentStore::from_backend(InMemoryStore::new()));
//! repository::prepare_store(&store).await?;
//!
//! let app = api::router(AppState::new(store));
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod repository;
pub mod telemetry;
