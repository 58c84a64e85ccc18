//! [`RecordStoreClient`]: the thin layer between the view-model and a store.
//!
//! Validates input before it leaves the process, translates backend failures
//! into [`Error`], and implements the catalog's by-name operations on top of
//! the store's by-id primitives.

use std::sync::Arc;

use crate::{
  Error, Result,
  catalog::{CatalogItem, normalize_name},
  record::{BorrowRecord, NewBorrowRecord, RecordId, RecordPatch},
  store::{CatalogStore, FailureKind, RecordStore, StoreFailure},
};

pub struct RecordStoreClient<S> {
  store: Arc<S>,
}

impl<S> Clone for RecordStoreClient<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S> RecordStoreClient<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &Arc<S> { &self.store }
}

// ─── Records ─────────────────────────────────────────────────────────────────

impl<S: RecordStore> RecordStoreClient<S> {
  pub async fn list(&self) -> Result<Vec<BorrowRecord>> {
    let records = self
      .store
      .list_records()
      .await
      .map_err(Error::from_backend)?;
    tracing::debug!(count = records.len(), "listed records");
    Ok(records)
  }

  /// Validate and persist a new record. Nothing is sent if validation fails.
  pub async fn create(&self, fields: NewBorrowRecord) -> Result<BorrowRecord> {
    fields.validate()?;
    let record = self
      .store
      .create_record(fields)
      .await
      .map_err(Error::from_backend)?;
    tracing::info!(id = %record.id, item = %record.item_name, "created record");
    Ok(record)
  }

  pub async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<()> {
    self
      .store
      .update_record(id.clone(), patch)
      .await
      .map_err(|e| Error::from_store(e, || Error::RecordNotFound(id.clone())))?;
    tracing::debug!(%id, "updated record");
    Ok(())
  }

  pub async fn delete(&self, id: &RecordId) -> Result<()> {
    self
      .store
      .delete_record(id.clone())
      .await
      .map_err(|e| Error::from_store(e, || Error::RecordNotFound(id.clone())))?;
    tracing::info!(%id, "deleted record");
    Ok(())
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

impl<S: CatalogStore> RecordStoreClient<S> {
  pub async fn list_items(&self) -> Result<Vec<CatalogItem>> {
    self.store.list_items().await.map_err(Error::from_backend)
  }

  /// Add a catalog item. Names are unique: a name already in the catalog is
  /// rejected with [`Error::DuplicateItem`].
  pub async fn create_item(&self, name: &str) -> Result<CatalogItem> {
    let name = normalize_name(name)?;
    if self.list_items().await?.iter().any(|i| i.name == name) {
      return Err(Error::DuplicateItem(name));
    }
    let item = self.store.create_item(name.clone()).await.map_err(|e| {
      if e.kind() == FailureKind::Conflict {
        Error::DuplicateItem(name.clone())
      } else {
        Error::from_backend(e)
      }
    })?;
    tracing::info!(name = %item.name, "added catalog item");
    Ok(item)
  }

  /// Delete a catalog item by name. The store only deletes by id, so the name
  /// is resolved by scanning the current catalog.
  pub async fn delete_item(&self, name: &str) -> Result<()> {
    let name = name.trim();
    let item = self
      .list_items()
      .await?
      .into_iter()
      .find(|i| i.name == name)
      .ok_or_else(|| Error::ItemNotFound(name.to_owned()))?;
    self
      .store
      .delete_item(item.item_id)
      .await
      .map_err(|e| Error::from_store(e, || Error::ItemNotFound(name.to_owned())))?;
    tracing::info!(name, "removed catalog item");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    ValidationError,
    record::BorrowStatus,
    testing::{MemoryStore, new_record},
  };

  fn client() -> RecordStoreClient<MemoryStore> { RecordStoreClient::new(Arc::new(MemoryStore::new())) }

  #[tokio::test]
  async fn create_assigns_an_id() {
    let c = client();
    let r = c
      .create(new_record("Jane Doe", "Laptop", "2024-01-01", "2024-01-06", BorrowStatus::Borrowed))
      .await
      .unwrap();
    assert!(!r.id.as_str().is_empty());
    assert_eq!(c.list().await.unwrap(), vec![r]);
  }

  #[tokio::test]
  async fn invalid_records_never_reach_the_store() {
    let c = client();
    let mut fields = new_record("Jane Doe", "Laptop", "2024-01-01", "2024-01-06", BorrowStatus::Borrowed);
    fields.full_name = String::new();

    let err = c.create(fields).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MissingField("full_name"))));
    assert_eq!(c.store().create_calls(), 0);
  }

  #[tokio::test]
  async fn update_of_missing_record_is_not_found() {
    let c = client();
    let err = c
      .update(&RecordId::from("nope"), RecordPatch::status(BorrowStatus::Returned))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(ref id) if id.as_str() == "nope"));
  }

  #[tokio::test]
  async fn second_delete_is_not_found() {
    let c = client();
    let r = c
      .create(new_record("Jane Doe", "Laptop", "2024-01-01", "2024-01-06", BorrowStatus::Borrowed))
      .await
      .unwrap();
    c.delete(&r.id).await.unwrap();
    assert!(c.delete(&r.id).await.unwrap_err().is_not_found());
  }

  #[tokio::test]
  async fn duplicate_item_names_are_rejected() {
    let c = client();
    c.create_item("Projector").await.unwrap();
    let err = c.create_item("  Projector ").await.unwrap_err();
    assert!(matches!(err, Error::DuplicateItem(ref n) if n == "Projector"));
    assert_eq!(c.list_items().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn items_are_deleted_by_name() {
    let c = client();
    c.create_item("Projector").await.unwrap();
    c.create_item("Tripod").await.unwrap();

    c.delete_item("Projector").await.unwrap();
    let names: Vec<_> = c.list_items().await.unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["Tripod"]);

    assert!(matches!(c.delete_item("Projector").await, Err(Error::ItemNotFound(_))));
  }

  #[tokio::test]
  async fn rejected_credentials_mean_signed_out_everywhere() {
    let c = client();
    c.store().fail_lists(Some(FailureKind::Unauthorized));
    assert!(matches!(c.list().await, Err(Error::Unauthenticated)));
    assert!(matches!(c.list_items().await, Err(Error::Unauthenticated)));
    assert!(matches!(c.create_item("Projector").await, Err(Error::Unauthenticated)));

    c.store().fail_lists(Some(FailureKind::Unavailable));
    assert!(matches!(c.list().await, Err(Error::Store(_))));
  }
}
