//! Bearer-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use lendlog_core::store::Authenticator;

use crate::{AppState, Backend, error::ApiError};

/// Present in a handler's arguments means the request carried a live session
/// token.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub uid:   String,
  pub token: String,
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl<S: Backend> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?
      .to_owned();
    let uid = state
      .store
      .verify(token.clone())
      .await
      .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;
    Ok(Authenticated { uid, token })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn extracts_bearer_token() {
    assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
  }

  #[test]
  fn rejects_other_schemes_and_blank_tokens() {
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
    assert_eq!(bearer_token(&headers("Bearer   ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }
}
