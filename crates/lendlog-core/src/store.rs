//! The persistence and authentication traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `lendlog-store-sqlite`) and by remote clients (the CLI's HTTP store).
//! Higher layers depend on these abstractions, never on a concrete backend.
//!
//! The model is a document store with three collections (borrow records,
//! catalog items, user profiles) offering list-all, create, update-by-id and
//! delete-by-id. There is no server-side filtering: callers fetch everything
//! and filter in memory.

use std::future::Future;

use crate::{
  catalog::CatalogItem,
  record::{BorrowRecord, NewBorrowRecord, RecordId, RecordPatch},
  session::Session,
  user::UserProfile,
};

// ─── Failure classification ──────────────────────────────────────────────────

/// Coarse classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// The addressed document does not exist.
  NotFound,
  /// A uniqueness constraint rejected the write.
  Conflict,
  /// Missing, expired or wrong credentials.
  Unauthorized,
  /// The backend could not be reached.
  Unavailable,
  /// The backend refused the operation for any other reason.
  Rejected,
}

/// Implemented by every backend error type so callers can tell "not found"
/// apart from other failures without knowing the backend.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> FailureKind;
}

// ─── Collections ─────────────────────────────────────────────────────────────

/// The borrow-record collection.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes and from spawned tasks.
pub trait RecordStore: Send + Sync {
  type Error: StoreFailure;

  /// Every stored record, each carrying its assigned identifier.
  fn list_records(
    &self,
  ) -> impl Future<Output = Result<Vec<BorrowRecord>, Self::Error>> + Send + '_;

  /// Persist a new record and return it with a freshly assigned identifier.
  fn create_record(
    &self,
    fields: NewBorrowRecord,
  ) -> impl Future<Output = Result<BorrowRecord, Self::Error>> + Send + '_;

  /// Merge `patch` into the stored record. Fails with a
  /// [`FailureKind::NotFound`] error if `id` does not exist.
  fn update_record(
    &self,
    id: RecordId,
    patch: RecordPatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a record. Not idempotent: deleting a missing id fails with
  /// [`FailureKind::NotFound`].
  fn delete_record(
    &self,
    id: RecordId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// The catalog-item collection.
pub trait CatalogStore: Send + Sync {
  type Error: StoreFailure;

  fn list_items(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogItem>, Self::Error>> + Send + '_;

  fn create_item(
    &self,
    name: String,
  ) -> impl Future<Output = Result<CatalogItem, Self::Error>> + Send + '_;

  /// Delete by storage identifier (not by name).
  fn delete_item(
    &self,
    item_id: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// The user-profile collection.
pub trait UserStore: Send + Sync {
  type Error: StoreFailure;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<UserProfile>, Self::Error>> + Send + '_;

  /// Store a profile document under `profile.uid`.
  fn create_user(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_user(
    &self,
    uid: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Authentication ──────────────────────────────────────────────────────────

/// The authentication collaborator: issues and checks session tokens.
pub trait Authenticator: Send + Sync {
  type Error: StoreFailure;

  /// Create an account and return its subject id. Fails with
  /// [`FailureKind::Conflict`] if the email is taken.
  fn register(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Check credentials and issue a session. Wrong credentials fail with
  /// [`FailureKind::Unauthorized`].
  fn sign_in(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Resolve a session token to its subject id.
  fn verify(
    &self,
    token: String,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Invalidate a session token.
  fn sign_out(
    &self,
    token: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove an account and every session it holds.
  fn delete_account(
    &self,
    uid: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
