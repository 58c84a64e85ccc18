//! JSON REST API for lendlog.
//!
//! Exposes the store collections and the authentication collaborator over
//! HTTP so remote clients (the `lendlog` CLI) can drive the core view-model
//! against a shared database.
//!
//! Every route except `POST /api/session` requires `Authorization: Bearer
//! <token>` with a token issued by that route.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use lendlog_core::{
  client::RecordStoreClient,
  store::{Authenticator, CatalogStore, RecordStore, UserStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{accounts, items, records, session, users};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LENDLOG_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything a backend must provide to be served.
pub trait Backend: RecordStore + CatalogStore + UserStore + Authenticator + 'static {}

impl<T> Backend for T where T: RecordStore + CatalogStore + UserStore + Authenticator + 'static {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub client: RecordStoreClient<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), client: self.client.clone() } }
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    let client = RecordStoreClient::new(Arc::clone(&store));
    Self { store, client }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    // Session
    .route(
      "/api/session",
      post(session::sign_in::<S>).get(session::current::<S>).delete(session::sign_out::<S>),
    )
    // Records
    .route("/api/records", get(records::list::<S>).post(records::create::<S>))
    .route("/api/records/{id}", patch(records::update::<S>).delete(records::remove::<S>))
    // Catalog
    .route("/api/items", get(items::list::<S>).post(items::create::<S>))
    .route("/api/items/{id}", delete(items::remove::<S>))
    // Users
    .route("/api/users", get(users::list::<S>).post(users::create::<S>))
    .route("/api/users/{uid}", delete(users::remove::<S>))
    .route("/api/accounts", post(accounts::create::<S>))
    .route("/api/accounts/{uid}", delete(accounts::remove::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
