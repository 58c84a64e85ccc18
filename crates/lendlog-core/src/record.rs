//! Borrow records: one row per item lent to a person.
//!
//! A record moves through a small status machine:
//!
//! ```text
//! Borrowed ──► Overdue ──► Returned
//!     └──────────────────────▲
//! ```
//!
//! `Returned` is terminal. `date_returned` is empty exactly while the record
//! is open (Borrowed or Overdue).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result, ValidationError};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque identifier assigned by the store when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum BorrowStatus {
  Borrowed,
  Overdue,
  Returned,
}

impl BorrowStatus {
  /// Whether the item is still out.
  pub fn is_open(self) -> bool { !matches!(self, Self::Returned) }

  /// Whether a record may move from `self` to `next`. Staying put is always
  /// allowed.
  pub fn can_transition_to(self, next: BorrowStatus) -> bool {
    use BorrowStatus::*;
    self == next
      || matches!(
        (self, next),
        (Borrowed, Overdue) | (Borrowed, Returned) | (Overdue, Returned)
      )
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted borrow transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
  pub id:                  RecordId,
  pub full_name:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:               Option<String>,
  pub item_name:           String,
  pub asset_tag:           String,
  pub date_borrowed:       NaiveDate,
  pub days_borrowed:       u32,
  pub reason:              String,
  pub status:              BorrowStatus,
  pub date_to_be_returned: NaiveDate,
  #[serde(default)]
  pub date_returned:       Option<NaiveDate>,
}

/// Every [`BorrowRecord`] field except the store-assigned `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrowRecord {
  pub full_name:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:               Option<String>,
  pub item_name:           String,
  pub asset_tag:           String,
  pub date_borrowed:       NaiveDate,
  pub days_borrowed:       u32,
  pub reason:              String,
  pub status:              BorrowStatus,
  pub date_to_be_returned: NaiveDate,
  #[serde(default)]
  pub date_returned:       Option<NaiveDate>,
}

/// A partial update; `None` leaves the stored field untouched.
///
/// The optional columns take a nested option so a patch can clear them:
/// `Some(None)` travels as JSON `null` and empties the field, while an absent
/// key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_with::rust::double_option")]
  pub email:               Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item_name:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub asset_tag:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_borrowed:       Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub days_borrowed:       Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:              Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:              Option<BorrowStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_to_be_returned: Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_with::rust::double_option")]
  pub date_returned:       Option<Option<NaiveDate>>,
}

impl RecordPatch {
  /// A patch that only changes the status.
  pub fn status(status: BorrowStatus) -> Self {
    Self { status: Some(status), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

impl From<&BorrowRecord> for RecordPatch {
  /// A patch that overwrites every field with the record's values.
  fn from(r: &BorrowRecord) -> Self {
    Self {
      full_name:           Some(r.full_name.clone()),
      email:               Some(r.email.clone()),
      item_name:           Some(r.item_name.clone()),
      asset_tag:           Some(r.asset_tag.clone()),
      date_borrowed:       Some(r.date_borrowed),
      days_borrowed:       Some(r.days_borrowed),
      reason:              Some(r.reason.clone()),
      status:              Some(r.status),
      date_to_be_returned: Some(r.date_to_be_returned),
      date_returned:       Some(r.date_returned),
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    Err(ValidationError::MissingField(field))
  } else {
    Ok(())
  }
}

pub(crate) fn check_email(email: &str) -> Result<(), ValidationError> {
  let trimmed = email.trim();
  if trimmed.is_empty() || !trimmed.contains('@') {
    return Err(ValidationError::InvalidEmail(email.to_owned()));
  }
  Ok(())
}

/// Field checks shared by new and updated records.
#[allow(clippy::too_many_arguments)]
fn check_fields(
  full_name:     &str,
  email:         Option<&str>,
  item_name:     &str,
  asset_tag:     &str,
  reason:        &str,
  date_borrowed: NaiveDate,
  due:           NaiveDate,
  status:        BorrowStatus,
  date_returned: Option<NaiveDate>,
) -> Result<(), ValidationError> {
  require("full_name", full_name)?;
  require("item_name", item_name)?;
  require("asset_tag", asset_tag)?;
  require("reason", reason)?;
  if let Some(email) = email {
    check_email(email)?;
  }
  if due < date_borrowed {
    return Err(ValidationError::DueBeforeBorrowed { borrowed: date_borrowed, due });
  }
  if status.is_open() && date_returned.is_some() {
    return Err(ValidationError::ReturnDateOnOpenRecord(status));
  }
  Ok(())
}

impl NewBorrowRecord {
  /// Reject records with missing required fields or inconsistent dates.
  pub fn validate(&self) -> Result<(), ValidationError> {
    check_fields(
      &self.full_name,
      self.email.as_deref(),
      &self.item_name,
      &self.asset_tag,
      &self.reason,
      self.date_borrowed,
      self.date_to_be_returned,
      self.status,
      self.date_returned,
    )
  }

  /// Fill `date_returned` with `today` when the record starts out returned.
  pub fn with_return_date_defaulted(mut self, today: NaiveDate) -> Self {
    if self.status == BorrowStatus::Returned && self.date_returned.is_none() {
      self.date_returned = Some(today);
    }
    self
  }

  /// Attach a store-assigned identifier.
  pub fn into_record(self, id: RecordId) -> BorrowRecord {
    BorrowRecord {
      id,
      full_name: self.full_name,
      email: self.email,
      item_name: self.item_name,
      asset_tag: self.asset_tag,
      date_borrowed: self.date_borrowed,
      days_borrowed: self.days_borrowed,
      reason: self.reason,
      status: self.status,
      date_to_be_returned: self.date_to_be_returned,
      date_returned: self.date_returned,
    }
  }
}

impl BorrowRecord {
  /// `true` if the item is still marked Borrowed and its due date lies
  /// strictly before `today`.
  pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
    self.status == BorrowStatus::Borrowed && self.date_to_be_returned < today
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    check_fields(
      &self.full_name,
      self.email.as_deref(),
      &self.item_name,
      &self.asset_tag,
      &self.reason,
      self.date_borrowed,
      self.date_to_be_returned,
      self.status,
      self.date_returned,
    )
  }

  /// Merge `patch` into a copy of this record without any lifecycle checks.
  pub fn merged(&self, patch: &RecordPatch) -> BorrowRecord {
    let mut out = self.clone();
    if let Some(v) = &patch.full_name {
      out.full_name = v.clone();
    }
    if let Some(v) = &patch.email {
      out.email = v.clone();
    }
    if let Some(v) = &patch.item_name {
      out.item_name = v.clone();
    }
    if let Some(v) = &patch.asset_tag {
      out.asset_tag = v.clone();
    }
    if let Some(v) = patch.date_borrowed {
      out.date_borrowed = v;
    }
    if let Some(v) = patch.days_borrowed {
      out.days_borrowed = v;
    }
    if let Some(v) = &patch.reason {
      out.reason = v.clone();
    }
    if let Some(v) = patch.status {
      out.status = v;
    }
    if let Some(v) = patch.date_to_be_returned {
      out.date_to_be_returned = v;
    }
    if let Some(v) = patch.date_returned {
      out.date_returned = v;
    }
    out
  }

  /// Produce the successor of this record given the caller's desired state.
  ///
  /// Enforces the status machine, auto-fills `date_returned` with `today`
  /// when the record becomes Returned without one, and validates the result.
  pub fn transition_to(&self, mut next: BorrowRecord, today: NaiveDate) -> Result<BorrowRecord> {
    if !self.status.can_transition_to(next.status) {
      return Err(Error::InvalidTransition { from: self.status, to: next.status });
    }
    if next.status == BorrowStatus::Returned && next.date_returned.is_none() {
      next.date_returned = Some(today);
    }
    next.id = self.id.clone();
    next.validate()?;
    Ok(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn record(status: BorrowStatus) -> BorrowRecord {
    BorrowRecord {
      id:                  RecordId::from("r1"),
      full_name:           "Jane Doe".into(),
      email:               None,
      item_name:           "Laptop-07".into(),
      asset_tag:           "AT-102".into(),
      date_borrowed:       date("2024-01-01"),
      days_borrowed:       5,
      reason:              "fieldwork".into(),
      status,
      date_to_be_returned: date("2024-01-06"),
      date_returned:       None,
    }
  }

  #[test]
  fn allowed_transitions() {
    use BorrowStatus::*;
    assert!(Borrowed.can_transition_to(Overdue));
    assert!(Borrowed.can_transition_to(Returned));
    assert!(Overdue.can_transition_to(Returned));
    assert!(Returned.can_transition_to(Returned));

    assert!(!Overdue.can_transition_to(Borrowed));
    assert!(!Returned.can_transition_to(Borrowed));
    assert!(!Returned.can_transition_to(Overdue));
  }

  #[test]
  fn status_parses_case_insensitively() {
    assert_eq!("overdue".parse::<BorrowStatus>().unwrap(), BorrowStatus::Overdue);
    assert_eq!(BorrowStatus::Returned.to_string(), "Returned");
    assert!("lost".parse::<BorrowStatus>().is_err());
  }

  #[test]
  fn status_serialises_with_capitalised_names() {
    let json = serde_json::to_string(&BorrowStatus::Borrowed).unwrap();
    assert_eq!(json, "\"Borrowed\"");
  }

  #[test]
  fn returning_fills_in_todays_date() {
    let current = record(BorrowStatus::Overdue);
    let mut next = current.clone();
    next.status = BorrowStatus::Returned;

    let out = current.transition_to(next, date("2024-01-10")).unwrap();
    assert_eq!(out.date_returned, Some(date("2024-01-10")));
  }

  #[test]
  fn returning_keeps_a_supplied_date() {
    let current = record(BorrowStatus::Borrowed);
    let mut next = current.clone();
    next.status = BorrowStatus::Returned;
    next.date_returned = Some(date("2024-01-04"));

    let out = current.transition_to(next, date("2024-01-10")).unwrap();
    assert_eq!(out.date_returned, Some(date("2024-01-04")));
  }

  #[test]
  fn reopening_a_returned_record_is_rejected() {
    let mut current = record(BorrowStatus::Returned);
    current.date_returned = Some(date("2024-01-05"));
    let mut next = current.clone();
    next.status = BorrowStatus::Borrowed;

    let err = current.transition_to(next, date("2024-01-10")).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { from: BorrowStatus::Returned, to: BorrowStatus::Borrowed }
    ));
  }

  #[test]
  fn open_record_with_return_date_is_invalid() {
    let mut r = record(BorrowStatus::Borrowed);
    r.date_returned = Some(date("2024-01-03"));
    assert_eq!(
      r.validate(),
      Err(ValidationError::ReturnDateOnOpenRecord(BorrowStatus::Borrowed))
    );
  }

  #[test]
  fn blank_fields_are_reported_by_name() {
    let mut r = record(BorrowStatus::Borrowed);
    r.asset_tag = "   ".into();
    assert_eq!(r.validate(), Err(ValidationError::MissingField("asset_tag")));
  }

  #[test]
  fn due_date_before_borrow_date_is_invalid() {
    let mut r = record(BorrowStatus::Borrowed);
    r.date_to_be_returned = date("2023-12-31");
    assert!(matches!(r.validate(), Err(ValidationError::DueBeforeBorrowed { .. })));
  }

  #[test]
  fn merged_only_touches_patched_fields() {
    let r = record(BorrowStatus::Borrowed);
    let patch = RecordPatch {
      reason: Some("conference".into()),
      ..RecordPatch::default()
    };
    let out = r.merged(&patch);
    assert_eq!(out.reason, "conference");
    assert_eq!(out.item_name, r.item_name);
    assert_eq!(out.status, r.status);
  }

  #[test]
  fn null_in_a_patch_clears_the_field() {
    let mut r = record(BorrowStatus::Returned);
    r.email = Some("jane@example.com".into());
    r.date_returned = Some(date("2024-01-05"));

    let clear: RecordPatch = serde_json::from_str(r#"{"email":null,"date_returned":null}"#).unwrap();
    assert_eq!(clear.email, Some(None));
    assert_eq!(clear.date_returned, Some(None));
    let out = r.merged(&clear);
    assert_eq!(out.email, None);
    assert_eq!(out.date_returned, None);

    let untouched: RecordPatch = serde_json::from_str(r#"{"reason":"audit"}"#).unwrap();
    assert_eq!(untouched.email, None);
    assert_eq!(r.merged(&untouched).email, r.email);

    let json = serde_json::to_value(&clear).unwrap();
    assert_eq!(json, serde_json::json!({ "email": null, "date_returned": null }));
    assert!(!clear.is_empty());
  }

  #[test]
  fn overdue_predicate_is_strict() {
    let r = record(BorrowStatus::Borrowed);
    assert!(!r.is_overdue_on(date("2024-01-06")));
    assert!(r.is_overdue_on(date("2024-01-07")));
    assert!(!record(BorrowStatus::Returned).is_overdue_on(date("2024-02-01")));
  }
}
