//! Handlers for `/api/session`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/api/session` | Body: `{"email":..,"password":..}`; 401 on bad credentials |
//! | `GET`    | `/api/session` | `{"uid":..}` for the presented token |
//! | `DELETE` | `/api/session` | Invalidates the presented token |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lendlog_core::{
  session::Session,
  store::{Authenticator, FailureKind, StoreFailure},
  user::Credentials,
};
use serde::Serialize;

use crate::{AppState, Backend, auth::Authenticated, error::ApiError};

/// `POST /api/session`
pub async fn sign_in<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
  let session = state
    .store
    .sign_in(body.email.trim().to_owned(), body.password)
    .await
    .map_err(|e| match e.kind() {
      FailureKind::Unauthorized | FailureKind::NotFound => {
        ApiError::Unauthorized("invalid email or password".into())
      }
      _ => ApiError::from_store(e),
    })?;
  tracing::info!(uid = %session.uid, "session opened");
  Ok((StatusCode::CREATED, Json(session)))
}

/// `DELETE /api/session`
pub async fn sign_out<S: Backend>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<impl IntoResponse, ApiError> {
  state.store.sign_out(auth.token).await.map_err(ApiError::from_store)?;
  tracing::info!(uid = %auth.uid, "session closed");
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct Whoami {
  pub uid: String,
}

/// `GET /api/session`: the subject the presented token belongs to.
pub async fn current<S: Backend>(auth: Authenticated) -> Json<Whoami> {
  Json(Whoami { uid: auth.uid })
}
