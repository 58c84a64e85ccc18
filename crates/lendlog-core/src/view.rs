//! [`RecordViewModel`]: the canonical in-memory record list and the views
//! derived from it.
//!
//! Every mutation goes to the store first and is applied locally only once
//! the store accepts it, so a failed call leaves the canonical list
//! untouched. Overdue corrections are the exception: they are applied locally
//! at once and persisted in the background (see
//! [`RecordViewModel::apply_overdue_corrections`]). Writes to one record are
//! serialised: an edit waits for that record's in-flight correction to land,
//! so the edit is always the last write.
//!
//! Filtering, sorting and pagination are plain in-memory transformations;
//! record volumes are those of an administrative tool.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, BTreeSet},
  fmt,
  str::FromStr,
  sync::{Arc, Mutex},
};

use strum::{Display, EnumString};
use tokio::{sync::Mutex as WriteLock, task::JoinSet};

use crate::{
  Error, Result,
  client::RecordStoreClient,
  clock::{Clock, SystemClock},
  overdue::{self, StatusChange},
  record::{BorrowRecord, BorrowStatus, NewBorrowRecord, RecordId, RecordPatch},
  stats::{self, Summary},
  store::RecordStore,
  submission::{Submission, SubmissionError},
};

// ─── Filters ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
  #[default]
  All,
  Only(BorrowStatus),
}

impl StatusFilter {
  pub fn matches(self, status: BorrowStatus) -> bool {
    match self {
      Self::All => true,
      Self::Only(s) => s == status,
    }
  }
}

impl FromStr for StatusFilter {
  type Err = strum::ParseError;

  /// `""`, `"all"` and `"view all"` mean no filter; anything else must name a
  /// status.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("view all") {
      return Ok(Self::All);
    }
    s.parse().map(Self::Only)
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Only(s) => write!(f, "{s}"),
    }
  }
}

fn name_matches(record: &BorrowRecord, term: &str) -> bool {
  term.is_empty() || record.full_name.to_lowercase().contains(term)
}

// ─── Sorting & paging ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortField {
  FullName,
  Email,
  ItemName,
  AssetTag,
  DateBorrowed,
  DaysBorrowed,
  Reason,
  Status,
  DateToBeReturned,
  DateReturned,
}

impl SortField {
  fn compare(self, a: &BorrowRecord, b: &BorrowRecord) -> Ordering {
    match self {
      Self::FullName => a.full_name.cmp(&b.full_name),
      Self::Email => a.email.cmp(&b.email),
      Self::ItemName => a.item_name.cmp(&b.item_name),
      Self::AssetTag => a.asset_tag.cmp(&b.asset_tag),
      Self::DateBorrowed => a.date_borrowed.cmp(&b.date_borrowed),
      Self::DaysBorrowed => a.days_borrowed.cmp(&b.days_borrowed),
      Self::Reason => a.reason.cmp(&b.reason),
      Self::Status => a.status.as_ref().cmp(b.status.as_ref()),
      Self::DateToBeReturned => a.date_to_be_returned.cmp(&b.date_to_be_returned),
      Self::DateReturned => a.date_returned.cmp(&b.date_returned),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
  pub field: SortField,
  pub order: SortOrder,
}

impl Default for SortSpec {
  /// Most recently borrowed first.
  fn default() -> Self { Self { field: SortField::DateBorrowed, order: SortOrder::Descending } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  /// 1-based; `0` is treated as `1`.
  pub page:     usize,
  /// Clamped to at least `1`.
  pub per_page: usize,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: 1, per_page: 10 } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
  pub items:       Vec<&'a BorrowRecord>,
  pub page:        usize,
  pub per_page:    usize,
  /// Number of records across all pages.
  pub total:       usize,
  pub total_pages: usize,
}

// ─── Overdue corrections ─────────────────────────────────────────────────────

/// Results of one sweep's remote writes.
#[derive(Debug, Default)]
pub struct CorrectionReport {
  pub applied: Vec<RecordId>,
  pub failed:  Vec<(RecordId, Error)>,
}

/// Remote status updates issued by a sweep and still in flight.
///
/// Dropping this detaches the updates; they keep running to completion.
pub struct PendingCorrections {
  ids: Vec<RecordId>,
  set: JoinSet<(RecordId, Result<()>)>,
}

impl PendingCorrections {
  /// The records this sweep is persisting.
  pub fn ids(&self) -> &[RecordId] { &self.ids }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }

  /// Wait for every update and collect the outcomes in completion order.
  pub async fn settle(mut self) -> CorrectionReport {
    let mut report = CorrectionReport::default();
    while let Some(joined) = self.set.join_next().await {
      match joined {
        Ok((id, Ok(()))) => report.applied.push(id),
        Ok((id, Err(e))) => report.failed.push((id, e)),
        Err(e) => tracing::error!(error = %e, "overdue correction task panicked"),
      }
    }
    report
  }
}

impl Drop for PendingCorrections {
  fn drop(&mut self) { self.set.detach_all(); }
}

// ─── View-model ──────────────────────────────────────────────────────────────

pub struct RecordViewModel<S, C = SystemClock> {
  client:   RecordStoreClient<S>,
  clock:    C,
  records:  Vec<BorrowRecord>,
  search:   String,
  filter:   StatusFilter,
  /// Overdue corrections whose remote write failed; re-sent on the next sweep.
  unsynced: Arc<Mutex<BTreeSet<RecordId>>>,
  /// One lock per record, held for the duration of each remote write.
  writes:   Mutex<BTreeMap<RecordId, Arc<WriteLock<()>>>>,
}

impl<S: RecordStore + 'static> RecordViewModel<S, SystemClock> {
  pub fn new(client: RecordStoreClient<S>) -> Self { Self::with_clock(client, SystemClock) }
}

impl<S, C> RecordViewModel<S, C>
where
  S: RecordStore + 'static,
  C: Clock,
{
  pub fn with_clock(client: RecordStoreClient<S>, clock: C) -> Self {
    Self {
      client,
      clock,
      records: Vec::new(),
      search: String::new(),
      filter: StatusFilter::All,
      unsynced: Arc::default(),
      writes: Mutex::default(),
    }
  }

  pub fn client(&self) -> &RecordStoreClient<S> { &self.client }

  /// The canonical list, in insertion order.
  pub fn records(&self) -> &[BorrowRecord] { &self.records }

  pub fn get(&self, id: &RecordId) -> Option<&BorrowRecord> { self.records.iter().find(|r| r.id == *id) }

  fn position(&self, id: &RecordId) -> Result<usize> {
    self
      .records
      .iter()
      .position(|r| r.id == *id)
      .ok_or_else(|| Error::RecordNotFound(id.clone()))
  }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Replace the canonical list with a fresh fetch, then run an overdue
  /// sweep. Must be called from within a tokio runtime.
  pub async fn load(&mut self) -> Result<PendingCorrections> {
    self.records = self.client.list().await?;
    tracing::info!(count = self.records.len(), "loaded records");
    Ok(self.apply_overdue_corrections())
  }

  // ── Filtering ─────────────────────────────────────────────────────────────

  pub fn search_term(&self) -> &str { &self.search }

  pub fn status_filter(&self) -> StatusFilter { self.filter }

  pub fn set_search_term(&mut self, term: impl Into<String>) { self.search = term.into(); }

  pub fn set_status_filter(&mut self, filter: StatusFilter) { self.filter = filter; }

  /// Records whose borrower name contains the search term (ignoring case)
  /// and whose status passes the filter, in canonical order.
  pub fn visible(&self) -> Vec<&BorrowRecord> {
    let term = self.search.to_lowercase();
    self
      .records
      .iter()
      .filter(|r| name_matches(r, &term) && self.filter.matches(r.status))
      .collect()
  }

  /// The visible records, sorted. Ties keep canonical order.
  pub fn sorted(&self, spec: SortSpec) -> Vec<&BorrowRecord> {
    let mut out = self.visible();
    out.sort_by(|a, b| {
      let ord = spec.field.compare(a, b);
      match spec.order {
        SortOrder::Ascending => ord,
        SortOrder::Descending => ord.reverse(),
      }
    });
    out
  }

  pub fn page(&self, spec: SortSpec, req: PageRequest) -> Page<'_> {
    let per_page = req.per_page.max(1);
    let page = req.page.max(1);
    let sorted = self.sorted(spec);
    let total = sorted.len();
    let items = sorted
      .into_iter()
      .skip((page - 1).saturating_mul(per_page))
      .take(per_page)
      .collect();
    Page { items, page, per_page, total, total_pages: total.div_ceil(per_page) }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  pub async fn add(&mut self, fields: NewBorrowRecord) -> Result<BorrowRecord> {
    let fields = fields.with_return_date_defaulted(self.clock.today());
    let record = self.client.create(fields).await?;
    self.records.push(record.clone());
    Ok(record)
  }

  /// Replace a record with the caller's edited copy.
  ///
  /// The status change must follow the lifecycle; a record becoming Returned
  /// without a return date gets today's date.
  pub async fn update(&mut self, record: BorrowRecord) -> Result<BorrowRecord> {
    let idx = self.position(&record.id)?;
    let next = self.records[idx].transition_to(record, self.clock.today())?;

    let lock = self.write_lock(&next.id);
    let _guard = lock.lock().await;
    self.client.update(&next.id, RecordPatch::from(&next)).await?;
    self.lock_unsynced().remove(&next.id);

    self.records[idx] = next.clone();
    Ok(next)
  }

  /// [`update`](Self::update) starting from the current record with `patch`
  /// merged in.
  pub async fn update_fields(&mut self, id: &RecordId, patch: RecordPatch) -> Result<BorrowRecord> {
    let idx = self.position(id)?;
    let edited = self.records[idx].merged(&patch);
    self.update(edited).await
  }

  /// Delete a record. Deleting an id the store no longer has fails with
  /// [`Error::RecordNotFound`] and changes nothing.
  pub async fn remove(&mut self, id: &RecordId) -> Result<()> {
    let lock = self.write_lock(id);
    let _guard = lock.lock().await;
    self.client.delete(id).await?;

    self.records.retain(|r| r.id != *id);
    self.lock_unsynced().remove(id);
    self.lock_writes().remove(id);
    Ok(())
  }

  /// Create one record per submitted item, in order, stopping at the first
  /// failure. Records created before the failure stay in the store and in the
  /// canonical list.
  pub async fn submit(&mut self, submission: Submission) -> Result<Vec<BorrowRecord>, SubmissionError> {
    if let Err(e) = submission.validate() {
      return Err(SubmissionError {
        created:       Vec::new(),
        failed:        None,
        not_attempted: submission.items,
        source:        e.into(),
      });
    }

    let today = self.clock.today();
    let mut created = Vec::with_capacity(submission.items.len());
    let mut pending = submission.items.iter().cloned().zip(submission.records());

    while let Some((item, fields)) = pending.next() {
      match self.client.create(fields.with_return_date_defaulted(today)).await {
        Ok(record) => {
          self.records.push(record.clone());
          created.push(record);
        }
        Err(source) => {
          tracing::warn!(
            item = %item.item_name,
            created = created.len(),
            error = %source,
            "submission stopped partway"
          );
          return Err(SubmissionError {
            created,
            failed: Some(item),
            not_attempted: pending.map(|(i, _)| i).collect(),
            source,
          });
        }
      }
    }

    Ok(created)
  }

  // ── Overdue ───────────────────────────────────────────────────────────────

  /// Flag past-due Borrowed records as Overdue.
  ///
  /// The canonical list is updated immediately; each status change is then
  /// written to the store by its own task, without waiting for the others.
  /// Writes that failed in an earlier sweep are re-sent. A record whose
  /// previous correction is still in flight is not written twice. Must be
  /// called from within a tokio runtime.
  pub fn apply_overdue_corrections(&mut self) -> PendingCorrections {
    let eval = overdue::evaluate(&self.records, self.clock.today());
    self.records = eval.records;

    let mut changes = eval.changed;
    let retries = std::mem::take(&mut *self.lock_unsynced());
    for id in retries {
      let still_overdue = self
        .get(&id)
        .is_some_and(|r| r.status == BorrowStatus::Overdue);
      if still_overdue && !changes.iter().any(|c| c.id == id) {
        changes.push(StatusChange { id, status: BorrowStatus::Overdue });
      }
    }

    if !changes.is_empty() {
      tracing::info!(count = changes.len(), "marking records overdue");
    }

    let mut set = JoinSet::new();
    let mut ids = Vec::with_capacity(changes.len());
    for change in changes {
      let Ok(guard) = self.write_lock(&change.id).try_lock_owned() else {
        tracing::debug!(id = %change.id, "correction already in flight");
        continue;
      };
      ids.push(change.id.clone());
      let client = self.client.clone();
      let unsynced = Arc::clone(&self.unsynced);
      set.spawn(async move {
        let _guard = guard;
        let result = client.update(&change.id, RecordPatch::status(change.status)).await;
        if let Err(e) = &result {
          tracing::warn!(id = %change.id, error = %e, "overdue correction failed; retrying next sweep");
          if !e.is_not_found() {
            unsynced
              .lock()
              .unwrap_or_else(|poisoned| poisoned.into_inner())
              .insert(change.id.clone());
          }
        }
        (change.id, result)
      });
    }

    PendingCorrections { ids, set }
  }

  fn lock_unsynced(&self) -> std::sync::MutexGuard<'_, BTreeSet<RecordId>> {
    self.unsynced.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn lock_writes(&self) -> std::sync::MutexGuard<'_, BTreeMap<RecordId, Arc<WriteLock<()>>>> {
    self.writes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write_lock(&self, id: &RecordId) -> Arc<WriteLock<()>> {
    Arc::clone(self.lock_writes().entry(id.clone()).or_default())
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  pub fn summary(&self, top_n: usize) -> Summary { stats::summarize(&self.records, top_n) }
}
