//! Conversions between domain values and their SQLite column text.

use chrono::{DateTime, NaiveDate, Utc};
use lendlog_core::record::{BorrowRecord, BorrowStatus, RecordId};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(column: &'static str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: BorrowStatus) -> &'static str {
  match s {
    BorrowStatus::Borrowed => "Borrowed",
    BorrowStatus::Overdue => "Overdue",
    BorrowStatus::Returned => "Returned",
  }
}

pub fn decode_status(s: &str) -> Result<BorrowStatus> {
  match s {
    "Borrowed" => Ok(BorrowStatus::Borrowed),
    "Overdue" => Ok(BorrowStatus::Overdue),
    "Returned" => Ok(BorrowStatus::Returned),
    other => Err(Error::Decode { column: "status", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "record_id, full_name, email, item_name, asset_tag, \
                                  date_borrowed, days_borrowed, reason, status, \
                                  date_to_be_returned, date_returned";

/// Raw values read directly from a `borrow_records` row.
pub struct RawRecord {
  pub record_id:           String,
  pub full_name:           String,
  pub email:               Option<String>,
  pub item_name:           String,
  pub asset_tag:           String,
  pub date_borrowed:       String,
  pub days_borrowed:       u32,
  pub reason:              String,
  pub status:              String,
  pub date_to_be_returned: String,
  pub date_returned:       Option<String>,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:           row.get(0)?,
      full_name:           row.get(1)?,
      email:               row.get(2)?,
      item_name:           row.get(3)?,
      asset_tag:           row.get(4)?,
      date_borrowed:       row.get(5)?,
      days_borrowed:       row.get(6)?,
      reason:              row.get(7)?,
      status:              row.get(8)?,
      date_to_be_returned: row.get(9)?,
      date_returned:       row.get(10)?,
    })
  }

  pub fn into_record(self) -> Result<BorrowRecord> {
    Ok(BorrowRecord {
      id:                  RecordId::new(self.record_id),
      full_name:           self.full_name,
      email:               self.email,
      item_name:           self.item_name,
      asset_tag:           self.asset_tag,
      date_borrowed:       decode_date("date_borrowed", &self.date_borrowed)?,
      days_borrowed:       self.days_borrowed,
      reason:              self.reason,
      status:              decode_status(&self.status)?,
      date_to_be_returned: decode_date("date_to_be_returned", &self.date_to_be_returned)?,
      date_returned:       self
        .date_returned
        .as_deref()
        .map(|s| decode_date("date_returned", s))
        .transpose()?,
    })
  }
}
