//! Handlers for `/api/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/api/records` | Every record, in insertion order |
//! | `POST`   | `/api/records` | Body: a new record; validated before storing |
//! | `PATCH`  | `/api/records/{id}` | Body: a partial record; 404 if missing |
//! | `DELETE` | `/api/records/{id}` | 404 if missing |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendlog_core::record::{BorrowRecord, NewBorrowRecord, RecordId, RecordPatch};

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

/// `GET /api/records`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<BorrowRecord>>, ApiError> {
  Ok(Json(state.client.list().await?))
}

/// `POST /api/records`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<NewBorrowRecord>,
) -> Result<impl IntoResponse, ApiError> {
  let record = state.client.create(body).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /api/records/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<String>,
  Json(patch): Json<RecordPatch>,
) -> Result<impl IntoResponse, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("patch changes nothing".into()));
  }
  state.client.update(&RecordId::from(id), patch).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/records/{id}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  state.client.delete(&RecordId::from(id)).await?;
  Ok(StatusCode::NO_CONTENT)
}
