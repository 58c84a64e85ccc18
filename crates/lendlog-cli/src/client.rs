//! Async HTTP client for the lendlog JSON API.
//!
//! [`HttpStore`] implements the core store and authentication traits, so the
//! view-model, [`Accounts`](lendlog_core::accounts::Accounts) and
//! [`SessionGate`](lendlog_core::session::SessionGate) run unchanged against
//! a remote server.

use std::time::Duration;

use lendlog_core::{
  catalog::CatalogItem,
  record::{BorrowRecord, NewBorrowRecord, RecordId, RecordPatch},
  session::Session,
  store::{Authenticator, CatalogStore, FailureKind, RecordStore, StoreFailure, UserStore},
  user::{Credentials, UserProfile},
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HttpError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  Method,
    path:    String,
    status:  StatusCode,
    message: String,
  },
}

impl StoreFailure for HttpError {
  fn kind(&self) -> FailureKind {
    match self {
      Self::Transport(e) if e.is_decode() => FailureKind::Rejected,
      Self::Transport(_) => FailureKind::Unavailable,
      Self::Status { status, .. } => kind_for_status(*status),
    }
  }
}

fn kind_for_status(status: StatusCode) -> FailureKind {
  match status {
    StatusCode::NOT_FOUND => FailureKind::NotFound,
    StatusCode::CONFLICT => FailureKind::Conflict,
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Unauthorized,
    s if s.is_server_error() => FailureKind::Unavailable,
    _ => FailureKind::Rejected,
  }
}

pub type Result<T, E = HttpError> = std::result::Result<T, E>;

// ─── Client ───────────────────────────────────────────────────────────────────

/// Connection settings for the lendlog API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Session token sent as `Authorization: Bearer`.
  pub token:    Option<String>,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpStore {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct UidBody {
  uid: String,
}

impl HttpStore {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Send and fail on any non-2xx status, carrying the server's message.
  async fn send(&self, method: Method, path: &str, req: RequestBuilder) -> Result<Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("error").to_owned(),
    };
    tracing::debug!(%method, path, %status, %message, "request rejected");
    Err(HttpError::Status { method, path: path.to_owned(), status, message })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let req = self.request(Method::GET, path);
    Ok(self.send(Method::GET, path, req).await?.json().await?)
  }

  async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &impl serde::Serialize) -> Result<T> {
    let req = self.request(Method::POST, path).json(body);
    Ok(self.send(Method::POST, path, req).await?.json().await?)
  }

  async fn delete(&self, path: &str) -> Result<()> {
    let req = self.request(Method::DELETE, path);
    self.send(Method::DELETE, path, req).await?;
    Ok(())
  }
}

// ─── Collections ─────────────────────────────────────────────────────────────

impl RecordStore for HttpStore {
  type Error = HttpError;

  /// `GET /api/records`
  async fn list_records(&self) -> Result<Vec<BorrowRecord>> { self.get_json("/records").await }

  /// `POST /api/records`
  async fn create_record(&self, fields: NewBorrowRecord) -> Result<BorrowRecord> {
    self.post_json("/records", &fields).await
  }

  /// `PATCH /api/records/{id}`
  async fn update_record(&self, id: RecordId, patch: RecordPatch) -> Result<()> {
    let path = format!("/records/{id}");
    let req = self.request(Method::PATCH, &path).json(&patch);
    self.send(Method::PATCH, &path, req).await?;
    Ok(())
  }

  /// `DELETE /api/records/{id}`
  async fn delete_record(&self, id: RecordId) -> Result<()> { self.delete(&format!("/records/{id}")).await }
}

impl CatalogStore for HttpStore {
  type Error = HttpError;

  async fn list_items(&self) -> Result<Vec<CatalogItem>> { self.get_json("/items").await }

  async fn create_item(&self, name: String) -> Result<CatalogItem> {
    self.post_json("/items", &json!({ "name": name })).await
  }

  async fn delete_item(&self, item_id: String) -> Result<()> { self.delete(&format!("/items/{item_id}")).await }
}

impl UserStore for HttpStore {
  type Error = HttpError;

  async fn list_users(&self) -> Result<Vec<UserProfile>> { self.get_json("/users").await }

  async fn create_user(&self, profile: UserProfile) -> Result<()> {
    let _: UserProfile = self.post_json("/users", &profile).await?;
    Ok(())
  }

  async fn delete_user(&self, uid: String) -> Result<()> { self.delete(&format!("/users/{uid}")).await }
}

// ─── Authentication ──────────────────────────────────────────────────────────

impl Authenticator for HttpStore {
  type Error = HttpError;

  /// `POST /api/accounts`
  async fn register(&self, email: String, password: String) -> Result<String> {
    let body: UidBody = self.post_json("/accounts", &Credentials { email, password }).await?;
    Ok(body.uid)
  }

  /// `POST /api/session`
  async fn sign_in(&self, email: String, password: String) -> Result<Session> {
    self.post_json("/session", &Credentials { email, password }).await
  }

  /// `GET /api/session` with `token` as the bearer.
  async fn verify(&self, token: String) -> Result<String> {
    let req = self.client.get(self.url("/session")).bearer_auth(token);
    let body: UidBody = self.send(Method::GET, "/session", req).await?.json().await?;
    Ok(body.uid)
  }

  /// `DELETE /api/session` with `token` as the bearer.
  async fn sign_out(&self, token: String) -> Result<()> {
    let req = self.client.delete(self.url("/session")).bearer_auth(token);
    self.send(Method::DELETE, "/session", req).await?;
    Ok(())
  }

  /// `DELETE /api/accounts/{uid}`
  async fn delete_account(&self, uid: String) -> Result<()> { self.delete(&format!("/accounts/{uid}")).await }
}
