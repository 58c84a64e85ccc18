//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use lendlog_core::store::{FailureKind, StoreFailure};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend failure by its [`FailureKind`].
  pub fn from_store<E: StoreFailure>(err: E) -> Self {
    match err.kind() {
      FailureKind::NotFound => Self::NotFound(err.to_string()),
      FailureKind::Conflict => Self::Conflict(err.to_string()),
      FailureKind::Unauthorized => Self::Unauthorized(err.to_string()),
      FailureKind::Rejected => Self::BadRequest(err.to_string()),
      FailureKind::Unavailable => Self::Store(Box::new(err)),
    }
  }
}

impl From<lendlog_core::Error> for ApiError {
  fn from(err: lendlog_core::Error) -> Self {
    use lendlog_core::Error as E;
    match err {
      E::Validation(_) | E::InvalidTransition { .. } => Self::BadRequest(err.to_string()),
      E::RecordNotFound(_) | E::ItemNotFound(_) | E::UserNotFound(_) => Self::NotFound(err.to_string()),
      E::DuplicateItem(_) | E::DuplicateEmail(_) => Self::Conflict(err.to_string()),
      E::InvalidCredentials | E::Unauthenticated => Self::Unauthorized(err.to_string()),
      E::PartialAccount { .. } | E::Store(_) => Self::Store(Box::new(err)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"lendlog\""));
    }
    res
  }
}
