//! Test fixtures: record builders and an in-memory store with fault
//! injection.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::NaiveDate;

use crate::{
  catalog::CatalogItem,
  record::{BorrowRecord, BorrowStatus, NewBorrowRecord, RecordId, RecordPatch},
  session::Session,
  store::{Authenticator, CatalogStore, FailureKind, RecordStore, StoreFailure, UserStore},
  user::UserProfile,
};

pub fn date(s: &str) -> NaiveDate { s.parse().expect("valid test date") }

pub fn new_record(
  name: &str,
  item: &str,
  borrowed: &str,
  due: &str,
  status: BorrowStatus,
) -> NewBorrowRecord {
  NewBorrowRecord {
    full_name:           name.into(),
    email:               None,
    item_name:           item.into(),
    asset_tag:           format!("AT-{item}"),
    date_borrowed:       date(borrowed),
    days_borrowed:       (date(due) - date(borrowed)).num_days() as u32,
    reason:              "testing".into(),
    status,
    date_to_be_returned: date(due),
    date_returned:       None,
  }
}

pub fn record(
  id: &str,
  name: &str,
  item: &str,
  borrowed: &str,
  due: &str,
  status: BorrowStatus,
) -> BorrowRecord {
  new_record(name, item, borrowed, due, status).into_record(RecordId::from(id))
}

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store: {kind:?}")]
pub struct MemoryError {
  pub kind: FailureKind,
}

impl StoreFailure for MemoryError {
  fn kind(&self) -> FailureKind { self.kind }
}

fn fail(kind: FailureKind) -> MemoryError { MemoryError { kind } }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A document store kept in process memory.
///
/// `fail_create_on` makes the n-th create call (1-based) fail; `fail_updates`
/// makes every update fail until cleared. `delay_status_patches` holds back
/// patches that only change the status, the shape overdue corrections take.
/// `fail_lists` makes every record and catalog listing fail with the given
/// kind until cleared.
#[derive(Default)]
pub struct MemoryStore {
  records:        Mutex<Vec<BorrowRecord>>,
  items:          Mutex<Vec<CatalogItem>>,
  users:          Mutex<Vec<UserProfile>>,
  accounts:       Mutex<BTreeMap<String, (String, String)>>,
  sessions:       Mutex<BTreeMap<String, String>>,
  next_id:        AtomicUsize,
  creates:        AtomicUsize,
  pub updates:    AtomicUsize,
  fail_create_on: Mutex<Option<usize>>,
  fail_updates:   Mutex<bool>,
  fail_profiles:  Mutex<bool>,
  status_delay:   Mutex<Option<Duration>>,
  fail_lists:     Mutex<Option<FailureKind>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_records(records: Vec<BorrowRecord>) -> Self {
    let store = Self::default();
    store.next_id.store(records.len(), Ordering::SeqCst);
    *store.records.lock().unwrap() = records;
    store
  }

  pub fn fail_create_on(&self, n: usize) { *self.fail_create_on.lock().unwrap() = Some(n); }

  pub fn fail_updates(&self, fail: bool) { *self.fail_updates.lock().unwrap() = fail; }

  pub fn fail_lists(&self, kind: Option<FailureKind>) { *self.fail_lists.lock().unwrap() = kind; }

  pub fn delay_status_patches(&self, delay: Duration) { *self.status_delay.lock().unwrap() = Some(delay); }

  pub fn fail_profile_writes(&self, fail: bool) { *self.fail_profiles.lock().unwrap() = fail; }

  pub fn stored(&self) -> Vec<BorrowRecord> { self.records.lock().unwrap().clone() }

  pub fn create_calls(&self) -> usize { self.creates.load(Ordering::SeqCst) }

  fn fresh_id(&self, prefix: &str) -> String {
    let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    format!("{prefix}{n}")
  }
}

impl RecordStore for MemoryStore {
  type Error = MemoryError;

  async fn list_records(&self) -> Result<Vec<BorrowRecord>, MemoryError> {
    if let Some(kind) = *self.fail_lists.lock().unwrap() {
      return Err(fail(kind));
    }
    Ok(self.stored())
  }

  async fn create_record(&self, fields: NewBorrowRecord) -> Result<BorrowRecord, MemoryError> {
    let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
    if *self.fail_create_on.lock().unwrap() == Some(n) {
      return Err(fail(FailureKind::Unavailable));
    }
    let record = fields.into_record(RecordId::new(self.fresh_id("r")));
    self.records.lock().unwrap().push(record.clone());
    Ok(record)
  }

  async fn update_record(&self, id: RecordId, patch: RecordPatch) -> Result<(), MemoryError> {
    self.updates.fetch_add(1, Ordering::SeqCst);
    let status_only = patch.status.is_some_and(|s| patch == RecordPatch::status(s));
    let delay = *self.status_delay.lock().unwrap();
    if let Some(delay) = delay.filter(|_| status_only) {
      tokio::time::sleep(delay).await;
    }
    if *self.fail_updates.lock().unwrap() {
      return Err(fail(FailureKind::Unavailable));
    }
    let mut records = self.records.lock().unwrap();
    let slot = records
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or(fail(FailureKind::NotFound))?;
    *slot = slot.merged(&patch);
    Ok(())
  }

  async fn delete_record(&self, id: RecordId) -> Result<(), MemoryError> {
    let mut records = self.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
      return Err(fail(FailureKind::NotFound));
    }
    Ok(())
  }
}

impl CatalogStore for MemoryStore {
  type Error = MemoryError;

  async fn list_items(&self) -> Result<Vec<CatalogItem>, MemoryError> {
    if let Some(kind) = *self.fail_lists.lock().unwrap() {
      return Err(fail(kind));
    }
    Ok(self.items.lock().unwrap().clone())
  }

  async fn create_item(&self, name: String) -> Result<CatalogItem, MemoryError> {
    let item = CatalogItem { item_id: self.fresh_id("i"), name };
    self.items.lock().unwrap().push(item.clone());
    Ok(item)
  }

  async fn delete_item(&self, item_id: String) -> Result<(), MemoryError> {
    let mut items = self.items.lock().unwrap();
    let before = items.len();
    items.retain(|i| i.item_id != item_id);
    if items.len() == before {
      return Err(fail(FailureKind::NotFound));
    }
    Ok(())
  }
}

impl UserStore for MemoryStore {
  type Error = MemoryError;

  async fn list_users(&self) -> Result<Vec<UserProfile>, MemoryError> {
    Ok(self.users.lock().unwrap().clone())
  }

  async fn create_user(&self, profile: UserProfile) -> Result<(), MemoryError> {
    if *self.fail_profiles.lock().unwrap() {
      return Err(fail(FailureKind::Unavailable));
    }
    self.users.lock().unwrap().push(profile);
    Ok(())
  }

  async fn delete_user(&self, uid: String) -> Result<(), MemoryError> {
    if *self.fail_profiles.lock().unwrap() {
      return Err(fail(FailureKind::Unavailable));
    }
    let mut users = self.users.lock().unwrap();
    let before = users.len();
    users.retain(|u| u.uid != uid);
    if users.len() == before {
      return Err(fail(FailureKind::NotFound));
    }
    Ok(())
  }
}

impl Authenticator for MemoryStore {
  type Error = MemoryError;

  async fn register(&self, email: String, password: String) -> Result<String, MemoryError> {
    let mut accounts = self.accounts.lock().unwrap();
    if accounts.values().any(|(e, _)| *e == email) {
      return Err(fail(FailureKind::Conflict));
    }
    let uid = self.fresh_id("u");
    accounts.insert(uid.clone(), (email, password));
    Ok(uid)
  }

  async fn sign_in(&self, email: String, password: String) -> Result<Session, MemoryError> {
    let uid = self
      .accounts
      .lock()
      .unwrap()
      .iter()
      .find(|(_, (e, p))| *e == email && *p == password)
      .map(|(uid, _)| uid.clone())
      .ok_or(fail(FailureKind::Unauthorized))?;
    let token = self.fresh_id("t");
    self.sessions.lock().unwrap().insert(token.clone(), uid.clone());
    Ok(Session { token, uid, email })
  }

  async fn verify(&self, token: String) -> Result<String, MemoryError> {
    self
      .sessions
      .lock()
      .unwrap()
      .get(&token)
      .cloned()
      .ok_or(fail(FailureKind::Unauthorized))
  }

  async fn sign_out(&self, token: String) -> Result<(), MemoryError> {
    self.sessions.lock().unwrap().remove(&token);
    Ok(())
  }

  async fn delete_account(&self, uid: String) -> Result<(), MemoryError> {
    if self.accounts.lock().unwrap().remove(&uid).is_none() {
      return Err(fail(FailureKind::NotFound));
    }
    self.sessions.lock().unwrap().retain(|_, u| *u != uid);
    Ok(())
  }
}
