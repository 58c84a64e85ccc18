//! Error type for `lendlog-store-sqlite`.

use lendlog_core::store::{FailureKind, StoreFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored column could not be turned back into a domain value.
  #[error("corrupt column {column}: {value:?}")]
  Decode { column: &'static str, value: String },

  #[error("record not found: {0}")]
  RecordNotFound(String),

  #[error("catalog item not found: {0}")]
  ItemNotFound(String),

  #[error("user profile not found: {0}")]
  ProfileNotFound(String),

  #[error("account not found: {0}")]
  AccountNotFound(String),

  #[error("catalog item already exists: {0:?}")]
  DuplicateItem(String),

  #[error("an account already exists for {0}")]
  EmailTaken(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("unknown or expired session token")]
  InvalidToken,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl StoreFailure for Error {
  fn kind(&self) -> FailureKind {
    match self {
      Self::Database(_) => FailureKind::Unavailable,
      Self::RecordNotFound(_)
      | Self::ItemNotFound(_)
      | Self::ProfileNotFound(_)
      | Self::AccountNotFound(_) => FailureKind::NotFound,
      Self::DuplicateItem(_) | Self::EmailTaken(_) => FailureKind::Conflict,
      Self::InvalidCredentials | Self::InvalidToken => FailureKind::Unauthorized,
      Self::Decode { .. } | Self::PasswordHash(_) => FailureKind::Rejected,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
