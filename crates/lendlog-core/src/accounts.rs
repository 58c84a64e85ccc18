//! User management: an authentication account plus a profile document per
//! user.
//!
//! The two halves live in different collaborators and are written one after
//! the other without a transaction. A failure after the first write is
//! surfaced as [`Error::PartialAccount`] rather than hidden.

use std::sync::Arc;

use crate::{
  Error, Result,
  store::{Authenticator, FailureKind, StoreFailure, UserStore},
  user::{NewUser, UserProfile},
};

/// What [`Accounts::remove`] actually deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRemoval {
  pub profile_removed: bool,
  pub account_removed: bool,
}

pub struct Accounts<A, U> {
  auth:  Arc<A>,
  users: Arc<U>,
}

impl<A, U> Clone for Accounts<A, U> {
  fn clone(&self) -> Self { Self { auth: Arc::clone(&self.auth), users: Arc::clone(&self.users) } }
}

impl<A: Authenticator, U: UserStore> Accounts<A, U> {
  pub fn new(auth: Arc<A>, users: Arc<U>) -> Self { Self { auth, users } }

  pub async fn list(&self) -> Result<Vec<UserProfile>> {
    self.users.list_users().await.map_err(Error::from_backend)
  }

  /// Register the account, then write its profile.
  pub async fn add(&self, user: NewUser) -> Result<UserProfile> {
    user.validate()?;
    let email = user.email.trim().to_owned();

    let uid = self
      .auth
      .register(email.clone(), user.password.clone())
      .await
      .map_err(|e| match e.kind() {
        FailureKind::Conflict => Error::DuplicateEmail(email.clone()),
        _ => Error::from_backend(e),
      })?;

    let profile = user.profile(uid.clone());
    if let Err(e) = self.users.create_user(profile.clone()).await {
      tracing::error!(%uid, error = %e, "account registered but profile write failed");
      return Err(Error::PartialAccount {
        uid,
        completed: "account registration",
        failed: "profile write",
        source: Box::new(Error::from_backend(e)),
      });
    }

    tracing::info!(%uid, email = %profile.email, "added user");
    Ok(profile)
  }

  /// Delete the profile, then the account.
  ///
  /// A half that is already gone is skipped; the user is unknown only if both
  /// are missing.
  pub async fn remove(&self, uid: &str) -> Result<AccountRemoval> {
    let profile_removed = match self.users.delete_user(uid.to_owned()).await {
      Ok(()) => true,
      Err(e) if e.kind() == FailureKind::NotFound => false,
      Err(e) => return Err(Error::from_backend(e)),
    };

    let account_removed = match self.auth.delete_account(uid.to_owned()).await {
      Ok(()) => true,
      Err(e) if e.kind() == FailureKind::NotFound => false,
      Err(e) if profile_removed => {
        tracing::error!(%uid, error = %e, "profile removed but account removal failed");
        return Err(Error::PartialAccount {
          uid:       uid.to_owned(),
          completed: "profile removal",
          failed:    "account removal",
          source:    Box::new(Error::from_backend(e)),
        });
      }
      Err(e) => return Err(Error::from_backend(e)),
    };

    if !profile_removed && !account_removed {
      return Err(Error::UserNotFound(uid.to_owned()));
    }
    tracing::info!(uid, profile_removed, account_removed, "removed user");
    Ok(AccountRemoval { profile_removed, account_removed })
  }
}
