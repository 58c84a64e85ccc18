//! Summary statistics derived from the canonical record list.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::record::{BorrowRecord, BorrowStatus};

/// How many ranked entries the dashboard shows.
pub const DISPLAY_TOP_N: usize = 3;

/// Record count per status. Every status is present, absent ones as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<BorrowStatus, usize>);

impl StatusCounts {
  pub fn get(&self, status: BorrowStatus) -> usize { self.0.get(&status).copied().unwrap_or(0) }

  pub fn total(&self) -> usize { self.0.values().sum() }

  pub fn iter(&self) -> impl Iterator<Item = (BorrowStatus, usize)> + '_ {
    self.0.iter().map(|(s, n)| (*s, *n))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
  pub name:  String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub status_counts: StatusCounts,
  pub top_items:     Vec<Ranked>,
  pub top_borrowers: Vec<Ranked>,
}

pub fn status_counts(records: &[BorrowRecord]) -> StatusCounts {
  let mut counts: BTreeMap<_, _> = BorrowStatus::iter().map(|s| (s, 0)).collect();
  for r in records {
    *counts.entry(r.status).or_insert(0) += 1;
  }
  StatusCounts(counts)
}

/// The `n` most frequent keys, most frequent first. Ties keep the order in
/// which the keys first appear in `records`.
pub fn top_n<'a>(
  records: &'a [BorrowRecord],
  n: usize,
  key: impl Fn(&'a BorrowRecord) -> &'a str,
) -> Vec<Ranked> {
  let mut order: Vec<&str> = Vec::new();
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for r in records {
    let k = key(r);
    let c = counts.entry(k).or_insert_with(|| {
      order.push(k);
      0
    });
    *c += 1;
  }

  let mut ranked: Vec<Ranked> = order
    .into_iter()
    .map(|name| Ranked { name: name.to_owned(), count: counts[name] })
    .collect();
  // Stable: equal counts stay in first-seen order.
  ranked.sort_by(|a, b| b.count.cmp(&a.count));
  ranked.truncate(n);
  ranked
}

pub fn summarize(records: &[BorrowRecord], n: usize) -> Summary {
  Summary {
    status_counts: status_counts(records),
    top_items:     top_n(records, n, |r| &r.item_name),
    top_borrowers: top_n(records, n, |r| &r.full_name),
  }
}
