//! Multi-item borrow submissions.
//!
//! One borrow action can cover several catalog items; each item becomes its
//! own record. Records are created one at a time and there is no rollback,
//! so a failure partway through leaves the earlier records in place.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, ValidationError,
  record::{BorrowRecord, BorrowStatus, NewBorrowRecord},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionItem {
  pub item_name: String,
  pub asset_tag: String,
}

/// The shared borrower details plus one entry per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  pub full_name:           String,
  #[serde(default)]
  pub email:               Option<String>,
  pub date_borrowed:       NaiveDate,
  pub days_borrowed:       u32,
  pub reason:              String,
  pub status:              BorrowStatus,
  pub date_to_be_returned: NaiveDate,
  pub items:               Vec<SubmissionItem>,
}

impl Submission {
  /// One new record per item, in item order.
  pub fn records(&self) -> Vec<NewBorrowRecord> {
    self
      .items
      .iter()
      .map(|item| NewBorrowRecord {
        full_name:           self.full_name.clone(),
        email:               self.email.clone(),
        item_name:           item.item_name.clone(),
        asset_tag:           item.asset_tag.clone(),
        date_borrowed:       self.date_borrowed,
        days_borrowed:       self.days_borrowed,
        reason:              self.reason.clone(),
        status:              self.status,
        date_to_be_returned: self.date_to_be_returned,
        date_returned:       None,
      })
      .collect()
  }

  /// Check every expanded record before anything is sent.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.items.is_empty() {
      return Err(ValidationError::EmptySubmission);
    }
    self.records().iter().try_for_each(NewBorrowRecord::validate)
  }
}

/// How much of a failed submission reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  /// Nothing was persisted.
  None,
  /// Some records were persisted before the failure.
  Partial,
}

/// A submission stopped at its first failure.
#[derive(Debug)]
pub struct SubmissionError {
  /// Records that were persisted (and added to the canonical list).
  pub created:       Vec<BorrowRecord>,
  /// The item whose create call failed; `None` if validation failed first.
  pub failed:        Option<SubmissionItem>,
  /// Items after the failure, never sent.
  pub not_attempted: Vec<SubmissionItem>,
  pub source:        Error,
}

impl fmt::Display for SubmissionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let total = self.created.len() + self.not_attempted.len() + usize::from(self.failed.is_some());
    match &self.failed {
      Some(item) => write!(
        f,
        "submission stopped at {:?} after {} of {} records: {}",
        item.item_name,
        self.created.len(),
        total,
        self.source
      ),
      None => write!(f, "submission rejected: {}", self.source),
    }
  }
}

impl std::error::Error for SubmissionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { Some(&self.source) }
}

impl SubmissionError {
  pub fn applied(&self) -> Applied {
    if self.created.is_empty() { Applied::None } else { Applied::Partial }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::date;

  fn submission(items: &[(&str, &str)]) -> Submission {
    Submission {
      full_name:           "Jane Doe".into(),
      email:               Some("jane@example.com".into()),
      date_borrowed:       date("2024-01-01"),
      days_borrowed:       5,
      reason:              "fieldwork".into(),
      status:              BorrowStatus::Borrowed,
      date_to_be_returned: date("2024-01-06"),
      items:               items
        .iter()
        .map(|(n, t)| SubmissionItem { item_name: (*n).into(), asset_tag: (*t).into() })
        .collect(),
    }
  }

  #[test]
  fn expands_one_record_per_item() {
    let recs = submission(&[("Laptop", "AT-1"), ("Charger", "AT-2")]).records();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].item_name, "Charger");
    assert_eq!(recs[1].asset_tag, "AT-2");
    assert_eq!(recs[1].full_name, "Jane Doe");
  }

  #[test]
  fn empty_submission_is_invalid() {
    assert_eq!(submission(&[]).validate(), Err(ValidationError::EmptySubmission));
  }

  #[test]
  fn missing_asset_tag_is_invalid() {
    let s = submission(&[("Laptop", "AT-1"), ("Charger", "")]);
    assert_eq!(s.validate(), Err(ValidationError::MissingField("asset_tag")));
  }
}
