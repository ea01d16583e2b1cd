//! HTTP surface of the service.
//!
//! Routes live under `/api`; every response, including unknown routes, is a JSON
//! [`Envelope`](envelope::Envelope).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use bugdesk_store::store::DynDocumentStore;
use serde_json::Value;
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::{AppError, AppResult},
    repository::{BugRepository, UserRepository},
};

use self::envelope::Envelope;

pub mod bugs;
pub mod envelope;
pub mod health;
pub mod users;

/// Shared handler state: one repository per resource over the same store.
#[derive(Debug, Clone)]
pub struct AppState {
    bug_repository: BugRepository,
    user_repository: UserRepository,
}

impl AppState {
    pub fn new(store: Arc<DynDocumentStore>) -> Self {
        Self {
            bug_repository: BugRepository::new(store.clone()),
            user_repository: UserRepository::new(store),
        }
    }

    pub fn bug_repository(&self) -> &BugRepository {
        &self.bug_repository
    }

    pub fn user_repository(&self) -> &UserRepository {
        &self.user_repository
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/bugs", bugs::routes())
        .nest("/api/users", users::routes())
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(Envelope::failure("Route not found")))
}

/// Parses a path identifier. Anything that is not a UUID cannot name a document,
/// so it is reported as not found.
pub(crate) fn parse_id(raw: &str, resource: &'static str) -> AppResult<bson::Uuid> {
    uuid::Uuid::parse_str(raw)
        .map(bson::Uuid::from)
        .map_err(|_| AppError::NotFound(resource))
}

/// Pulls a non-empty string `status` out of a PATCH body. Unreadable bodies count
/// as a missing status.
pub(crate) fn requested_status(body: Result<Json<Value>, JsonRejection>) -> AppResult<String> {
    let Ok(Json(body)) = body else {
        return Err(AppError::StatusRequired);
    };

    match body.get("status") {
        Some(Value::String(status)) if !status.is_empty() => Ok(status.clone()),
        _ => Err(AppError::StatusRequired),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{app, send};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn health_reports_running() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "API is running" }));
    }

    #[tokio::test]
    async fn unknown_routes_get_a_json_404() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/api/projects", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
    }
}
