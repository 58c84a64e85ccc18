//! Handlers for `/api/users` endpoints (profile documents).

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendlog_core::{store::UserStore, user::UserProfile};

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

/// `GET /api/users`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
  let users = state.store.list_users().await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

/// `POST /api/users`: stores the profile under its `uid`.
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(profile): Json<UserProfile>,
) -> Result<impl IntoResponse, ApiError> {
  if profile.uid.trim().is_empty() {
    return Err(ApiError::BadRequest("uid is required".into()));
  }
  state
    .store
    .create_user(profile.clone())
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(profile)))
}

/// `DELETE /api/users/{uid}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  state.store.delete_user(uid).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
