//! Repositories over the shared document store.
//!
//! Each repository owns a handle to the store and speaks in model types. Store errors
//! are converted to [`AppError`](crate::error::AppError) on the way out; a missing
//! document is reported as `None` (or `false` for deletes) so handlers choose the
//! not-found response.

use bugdesk_store::{error::DocumentStoreResult, store::DynDocumentStore};
use tracing::info;

use crate::model::{bug::Bug, user::User};

pub mod bug;
pub mod user;

pub use bug::BugRepository;
pub use user::UserRepository;

/// Creates the collections the service writes to and the unique index on user emails.
///
/// Safe to run on every start.
pub async fn prepare_store(store: &DynDocumentStore) -> DocumentStoreResult<()> {
    store.ensure_collection::<Bug>().await?;
    store.ensure_collection::<User>().await?;
    store.add_index::<User>("email", true).await?;

    info!("Document store ready");

    Ok(())
}
