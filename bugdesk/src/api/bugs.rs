use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{AppState, envelope::Envelope, parse_id, requested_status};
use crate::{
    error::{AppError, AppResult},
    model::bug::{Bug, BugFilter, BugPayload, BugStats, BugStatus, Priority},
};

const RESOURCE: &str = "Bug";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugResponse {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub status: BugStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub reported_by: String,
    pub project: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bug> for BugResponse {
    fn from(bug: Bug) -> Self {
        Self {
            id: bug.id.into(),
            title: bug.title,
            description: bug.description,
            status: bug.status,
            priority: bug.priority,
            assigned_to: bug.assigned_to,
            reported_by: bug.reported_by,
            project: bug.project,
            tags: bug.tags,
            created_at: bug.created_at.to_chrono(),
            updated_at: bug.updated_at.to_chrono(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bugs).post(create_bug))
        .route("/stats/summary", get(bug_stats))
        .route("/:id", get(show_bug).put(update_bug).delete(delete_bug))
        .route("/:id/status", patch(update_bug_status))
}

pub async fn list_bugs(
    State(state): State<AppState>,
    Query(filter): Query<BugFilter>,
) -> AppResult<Json<Envelope<Vec<BugResponse>>>> {
    state
        .bug_repository()
        .list(&filter)
        .await
        .map(|bugs| bugs.into_iter().map(BugResponse::from).collect::<Vec<_>>())
        .map(Envelope::list)
        .map(Json)
}

pub async fn show_bug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<BugResponse>>> {
    let id = parse_id(&id, RESOURCE)?;

    state
        .bug_repository()
        .find(id)
        .await?
        .map(|bug| Json(Envelope::data(BugResponse::from(bug))))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn create_bug(
    State(state): State<AppState>,
    payload: Result<Json<BugPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<BugResponse>>)> {
    let Json(payload) = payload?;
    let bug = state.bug_repository().create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(BugResponse::from(bug)).with_message("Bug created successfully")),
    ))
}

pub async fn update_bug(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BugPayload>, JsonRejection>,
) -> AppResult<Json<Envelope<BugResponse>>> {
    let id = parse_id(&id, RESOURCE)?;
    let Json(payload) = payload?;

    state
        .bug_repository()
        .update(id, payload)
        .await?
        .map(|bug| Json(Envelope::data(BugResponse::from(bug)).with_message("Bug updated successfully")))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn update_bug_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Envelope<BugResponse>>> {
    let status = requested_status(body)?;
    let id = parse_id(&id, RESOURCE)?;

    state
        .bug_repository()
        .update_status(id, &status)
        .await?
        .map(|bug| Json(Envelope::data(BugResponse::from(bug)).with_message("Bug status updated successfully")))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn delete_bug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<()>>> {
    let id = parse_id(&id, RESOURCE)?;

    if state.bug_repository().delete(id).await? {
        Ok(Json(Envelope::message("Bug deleted successfully")))
    } else {
        Err(AppError::NotFound(RESOURCE))
    }
}

pub async fn bug_stats(State(state): State<AppState>) -> AppResult<Json<Envelope<BugStats>>> {
    state
        .bug_repository()
        .stats()
        .await
        .map(Envelope::data)
        .map(Json)
}
