//! Service error taxonomy.
//!
//! Every handler returns [`AppResult`]. Store errors are classified once, in the
//! `From<DocumentStoreError>` impl, and every variant renders as a failure envelope
//! with a fixed HTTP status.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bugdesk_store::{document::Document, error::DocumentStoreError};
use thiserror::Error;

use crate::{
    api::envelope::Envelope,
    model::{bug::Bug, user::User},
};

#[derive(Debug, Error)]
pub enum AppError {
    /// One message per violated field rule, in field declaration order.
    #[error("Validation Error")]
    Validation(Vec<String>),
    /// A write collided with a unique index; holds the field name.
    #[error("{} already exists", capitalize(.0))]
    Uniqueness(String),
    /// Holds the resource name, e.g. `Bug`.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Status is required")]
    StatusRequired,
    /// Any other store failure; holds the underlying message verbatim.
    #[error("{0}")]
    Store(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Uniqueness(_) | AppError::StatusRequired => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DocumentStoreError> for AppError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::DuplicateKey(field, _) => AppError::Uniqueness(field),
            DocumentStoreError::DocumentNotFound(_, collection) => AppError::NotFound(resource_name(&collection)),
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![rejection.body_text()])
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Store(message) => tracing::error!(error.message = %message, "Store operation failed"),
            other => tracing::debug!(status = status.as_u16(), error.message = %other, "Request rejected"),
        }

        let body = match self {
            AppError::Validation(errors) => Envelope::failure("Validation Error").with_errors(errors),
            AppError::Store(message) => Envelope::failure("Server Error").with_error(message),
            other => Envelope::failure(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

fn resource_name(collection: &str) -> &'static str {
    if collection == Bug::collection_name() {
        "Bug"
    } else if collection == User::collection_name() {
        "User"
    } else {
        "Document"
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_becomes_uniqueness_message() {
        let err = AppError::from(DocumentStoreError::DuplicateKey("email".into(), "users".into()));

        assert_eq!(err.to_string(), "Email already exists");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_document_names_the_resource() {
        let err = AppError::from(DocumentStoreError::DocumentNotFound("42".into(), "bugs".into()));

        assert_eq!(err.to_string(), "Bug not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_store_errors_keep_their_message() {
        let err = AppError::from(DocumentStoreError::Backend("connection reset".into()));

        assert!(matches!(&err, AppError::Store(message) if message == "Backend error: connection reset"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
