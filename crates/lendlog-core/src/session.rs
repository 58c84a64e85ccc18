//! Session handling.
//!
//! Holding a token is the authorization gate for protected operations; the
//! gate does not re-check the token with the authentication collaborator on
//! every call.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::{Authenticator, FailureKind, StoreFailure},
};

/// A signed-in identity as issued by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token: String,
  pub uid:   String,
  pub email: String,
}

/// Owns the current session, if any.
pub struct SessionGate<A> {
  auth:    A,
  session: Option<Session>,
}

fn auth_error<E: StoreFailure>(err: E) -> Error {
  match err.kind() {
    FailureKind::Unauthorized | FailureKind::NotFound => Error::InvalidCredentials,
    _ => Error::Store(Box::new(err)),
  }
}

impl<A: Authenticator> SessionGate<A> {
  pub fn new(auth: A) -> Self { Self { auth, session: None } }

  /// Resume a session persisted by an earlier run.
  pub fn restore(auth: A, session: Session) -> Self { Self { auth, session: Some(session) } }

  pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

  pub fn is_authenticated(&self) -> bool { self.session.is_some() }

  /// The current session, or [`Error::Unauthenticated`].
  pub fn require(&self) -> Result<&Session> { self.session.as_ref().ok_or(Error::Unauthenticated) }

  pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&Session> {
    let session = self
      .auth
      .sign_in(email.trim().to_owned(), password.to_owned())
      .await
      .map_err(auth_error)?;
    tracing::info!(uid = %session.uid, "signed in");
    Ok(&*self.session.insert(session))
  }

  /// Invalidate the session remotely and always forget it locally.
  ///
  /// Returns the remote failure, if any, after the local token is cleared.
  pub async fn sign_out(&mut self) -> Result<()> {
    let Some(session) = self.session.take() else {
      return Ok(());
    };
    self.auth.sign_out(session.token).await.map_err(|e| {
      tracing::warn!(error = %e, "remote sign-out failed; local session cleared");
      Error::from_backend(e)
    })?;
    tracing::info!(uid = %session.uid, "signed out");
    Ok(())
  }
}
