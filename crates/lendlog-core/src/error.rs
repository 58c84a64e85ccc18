//! Error types for `lendlog-core`.

use thiserror::Error;

use crate::{
  record::{BorrowStatus, RecordId},
  store::{FailureKind, StoreFailure},
};

/// A caller-supplied value was rejected before any store call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("required field `{0}` is empty")]
  MissingField(&'static str),

  #[error("email address {0:?} is not valid")]
  InvalidEmail(String),

  #[error("password must be at least {min} characters")]
  PasswordTooShort { min: usize },

  #[error("return date {due} is before the borrow date {borrowed}")]
  DueBeforeBorrowed {
    borrowed: chrono::NaiveDate,
    due:      chrono::NaiveDate,
  },

  #[error("a {0} record cannot carry a return date")]
  ReturnDateOnOpenRecord(BorrowStatus),

  #[error("a submission must name at least one item")]
  EmptySubmission,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("record not found: {0}")]
  RecordNotFound(RecordId),

  #[error("catalog item not found: {0:?}")]
  ItemNotFound(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("catalog item already exists: {0:?}")]
  DuplicateItem(String),

  #[error("an account already exists for {0}")]
  DuplicateEmail(String),

  #[error("cannot change status from {from} to {to}")]
  InvalidTransition { from: BorrowStatus, to: BorrowStatus },

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("not signed in")]
  Unauthenticated,

  /// A two-step account operation failed after its first step took effect.
  #[error("account {uid}: {completed} succeeded but {failed} failed: {source}")]
  PartialAccount {
    uid:       String,
    completed: &'static str,
    failed:    &'static str,
    #[source]
    source:    Box<Error>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether this error means the referenced entity does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::RecordNotFound(_) | Self::ItemNotFound(_) | Self::UserNotFound(_)
    )
  }

  /// Translate a backend failure, using `not_found` for the entity-specific
  /// not-found variant.
  pub(crate) fn from_store<E: StoreFailure>(
    err: E,
    not_found: impl FnOnce() -> Error,
  ) -> Self {
    match err.kind() {
      FailureKind::NotFound => not_found(),
      _ => Self::from_backend(err),
    }
  }

  /// Translate a backend failure that has no entity to be missing.
  pub(crate) fn from_backend<E: StoreFailure>(err: E) -> Self {
    match err.kind() {
      FailureKind::Unauthorized => Self::Unauthenticated,
      _ => Self::Store(Box::new(err)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
