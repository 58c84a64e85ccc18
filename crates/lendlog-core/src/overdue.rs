//! Overdue detection.
//!
//! The store never computes overdue status itself, so the client re-runs
//! [`evaluate`] after every load and then periodically (see
//! [`SWEEP_INTERVAL`]).

use std::time::Duration;

use chrono::NaiveDate;

use crate::record::{BorrowRecord, BorrowStatus, RecordId};

/// How often a long-lived client should re-evaluate overdue status.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A status change the caller must persist remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
  pub id:     RecordId,
  pub status: BorrowStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
  /// The input list with overdue records corrected, in input order.
  pub records: Vec<BorrowRecord>,
  /// Exactly the records whose status changed.
  pub changed: Vec<StatusChange>,
}

/// Mark every Borrowed record whose due date is strictly before `today` as
/// Overdue. A record due today is not overdue.
pub fn evaluate(records: &[BorrowRecord], today: NaiveDate) -> Evaluation {
  let mut changed = Vec::new();
  let records = records
    .iter()
    .map(|r| {
      if r.is_overdue_on(today) {
        changed.push(StatusChange { id: r.id.clone(), status: BorrowStatus::Overdue });
        BorrowRecord { status: BorrowStatus::Overdue, ..r.clone() }
      } else {
        r.clone()
      }
    })
    .collect();

  Evaluation { records, changed }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{date, record};

  #[test]
  fn past_due_borrowed_records_become_overdue() {
    let records = vec![
      record("a", "Jane Doe", "Laptop", "2024-01-01", "2024-01-05", BorrowStatus::Borrowed),
      record("b", "Sam Roe", "Tripod", "2024-01-02", "2024-01-09", BorrowStatus::Borrowed),
    ];

    let out = evaluate(&records, date("2024-01-08"));

    assert_eq!(out.records[0].status, BorrowStatus::Overdue);
    assert_eq!(out.records[1].status, BorrowStatus::Borrowed);
    assert_eq!(out.changed, vec![StatusChange {
      id:     RecordId::from("a"),
      status: BorrowStatus::Overdue,
    }]);
  }

  #[test]
  fn due_today_is_not_overdue() {
    let records =
      vec![record("a", "Jane Doe", "Laptop", "2024-01-01", "2024-01-08", BorrowStatus::Borrowed)];
    let out = evaluate(&records, date("2024-01-08"));
    assert!(out.changed.is_empty());
    assert_eq!(out.records, records);
  }

  #[test]
  fn returned_and_overdue_records_pass_through() {
    let mut returned =
      record("a", "Jane Doe", "Laptop", "2024-01-01", "2024-01-02", BorrowStatus::Returned);
    returned.date_returned = Some(date("2024-01-03"));
    let overdue = record("b", "Sam Roe", "Tripod", "2024-01-01", "2024-01-02", BorrowStatus::Overdue);
    let records = vec![returned, overdue];

    let out = evaluate(&records, date("2024-03-01"));
    assert!(out.changed.is_empty());
    assert_eq!(out.records, records);
  }

  #[test]
  fn due_date_is_never_modified() {
    let records =
      vec![record("a", "Jane Doe", "Laptop", "2024-01-01", "2024-01-05", BorrowStatus::Borrowed)];
    let out = evaluate(&records, date("2024-02-01"));
    assert_eq!(out.records[0].date_to_be_returned, date("2024-01-05"));
    assert_eq!(out.records[0].date_returned, None);
  }

  #[test]
  fn evaluating_twice_is_stable() {
    let records =
      vec![record("a", "Jane Doe", "Laptop", "2024-01-01", "2024-01-05", BorrowStatus::Borrowed)];
    let once = evaluate(&records, date("2024-02-01"));
    let twice = evaluate(&once.records, date("2024-02-01"));
    assert_eq!(once.records, twice.records);
    assert!(twice.changed.is_empty());
  }
}
