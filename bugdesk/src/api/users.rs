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
    model::user::{Role, User, UserFilter, UserPayload, UserStats, UserStatus},
};

const RESOURCE: &str = "User";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub department: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into(),
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            department: user.department,
            phone: user.phone,
            skills: user.skills,
            created_at: user.created_at.to_chrono(),
            updated_at: user.updated_at.to_chrono(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/stats/summary", get(user_stats))
        .route("/:id", get(show_user).put(update_user).delete(delete_user))
        .route("/:id/status", patch(update_user_status))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> AppResult<Json<Envelope<Vec<UserResponse>>>> {
    state
        .user_repository()
        .list(&filter)
        .await
        .map(|users| users.into_iter().map(UserResponse::from).collect::<Vec<_>>())
        .map(Envelope::list)
        .map(Json)
}

pub async fn show_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let id = parse_id(&id, RESOURCE)?;

    state
        .user_repository()
        .find(id)
        .await?
        .map(|user| Json(Envelope::data(UserResponse::from(user))))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<UserResponse>>)> {
    let Json(payload) = payload?;
    let user = state.user_repository().create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(UserResponse::from(user)).with_message("User created successfully")),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let id = parse_id(&id, RESOURCE)?;
    let Json(payload) = payload?;

    state
        .user_repository()
        .update(id, payload)
        .await?
        .map(|user| Json(Envelope::data(UserResponse::from(user)).with_message("User updated successfully")))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Envelope<UserResponse>>> {
    let status = requested_status(body)?;
    let id = parse_id(&id, RESOURCE)?;

    state
        .user_repository()
        .update_status(id, &status)
        .await?
        .map(|user| Json(Envelope::data(UserResponse::from(user)).with_message("User status updated successfully")))
        .ok_or(AppError::NotFound(RESOURCE))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<()>>> {
    let id = parse_id(&id, RESOURCE)?;

    if state.user_repository().delete(id).await? {
        Ok(Json(Envelope::message("User deleted successfully")))
    } else {
        Err(AppError::NotFound(RESOURCE))
    }
}

pub async fn user_stats(State(state): State<AppState>) -> AppResult<Json<Envelope<UserStats>>> {
    state
        .user_repository()
        .stats()
        .await
        .map(Envelope::data)
        .map(Json)
}
