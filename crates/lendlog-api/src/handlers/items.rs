//! Handlers for `/api/items` endpoints (the catalog).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/api/items` | |
//! | `POST`   | `/api/items` | Body: `{"name":"Projector"}`; 409 if the name exists |
//! | `DELETE` | `/api/items/{id}` | By storage id; 404 if missing |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendlog_core::{catalog::CatalogItem, store::CatalogStore};
use serde::Deserialize;

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

/// `GET /api/items`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<CatalogItem>>, ApiError> {
  Ok(Json(state.client.list_items().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /api/items`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let item = state.client.create_item(&body.name).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `DELETE /api/items/{id}`
pub async fn remove<S: Backend>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  state.store.delete_item(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
