//! Catalog items: reusable item names offered when composing a borrow.
//!
//! Items are independent of records: a record stores the item name as plain
//! text, so deleting a catalog item never touches existing records.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
  /// Storage identifier; only used to address the item for deletion.
  pub item_id: String,
  pub name:    String,
}

/// Trim a user-entered item name, rejecting blank input.
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::MissingField("name"));
  }
  Ok(trimmed.to_owned())
}
