//! Handlers for `/api/accounts`: the authentication side of a user.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendlog_core::{store::Authenticator, user::Credentials};
use serde::Serialize;

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Registered {
  pub uid: String,
}

/// `POST /api/accounts`. Body: `{"email":..,"password":..}`; 409 if the
/// email is taken.
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
  body
    .validate()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let uid = state
    .store
    .register(body.email.trim().to_owned(), body.password)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%uid, "registered account");
  Ok((StatusCode::CREATED, Json(Registered { uid })))
}

/// `DELETE /api/accounts/{uid}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  state
    .store
    .delete_account(uid.clone())
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(%uid, "deleted account");
  Ok(StatusCode::NO_CONTENT)
}
