//! Application users.
//!
//! Each user has an account with the authentication collaborator and a
//! profile document keyed by the same `uid`.

use serde::{Deserialize, Serialize};

use crate::{ValidationError, record::check_email};

/// The shortest password the authentication collaborator accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub uid:        String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
}

impl UserProfile {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Input for creating a user: credentials plus profile fields.
#[derive(Clone, Deserialize)]
pub struct NewUser {
  pub email:      String,
  pub password:   String,
  pub first_name: String,
  pub last_name:  String,
}

impl NewUser {
  pub fn validate(&self) -> Result<(), ValidationError> {
    check_email(&self.email)?;
    if self.first_name.trim().is_empty() {
      return Err(ValidationError::MissingField("first_name"));
    }
    if self.last_name.trim().is_empty() {
      return Err(ValidationError::MissingField("last_name"));
    }
    check_password(&self.password)
  }

  /// The profile document to store once the account has a `uid`.
  pub fn profile(&self, uid: String) -> UserProfile {
    UserProfile {
      uid,
      email:      self.email.trim().to_owned(),
      first_name: self.first_name.trim().to_owned(),
      last_name:  self.last_name.trim().to_owned(),
    }
  }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
  }
  Ok(())
}

/// An email/password pair presented to the authentication collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl Credentials {
  /// The checks applied when registering a new account.
  pub fn validate(&self) -> Result<(), ValidationError> {
    check_email(&self.email)?;
    check_password(&self.password)
  }
}

// Keep passwords out of debug logs.
impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .finish_non_exhaustive()
  }
}

impl std::fmt::Debug for NewUser {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NewUser")
      .field("email", &self.email)
      .field("first_name", &self.first_name)
      .field("last_name", &self.last_name)
      .finish_non_exhaustive()
  }
}
