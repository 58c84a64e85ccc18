//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use lendlog_core::{
  catalog::CatalogItem,
  record::BorrowRecord,
  stats::{Ranked, Summary},
  user::UserProfile,
  view::Page,
};

const RECORD_HEADERS: [&str; 8] = ["ID", "NAME", "ITEM", "TAG", "BORROWED", "DUE", "STATUS", "RETURNED"];

fn record_row(r: &BorrowRecord) -> [String; 8] {
  [
    r.id.to_string(),
    r.full_name.clone(),
    r.item_name.clone(),
    r.asset_tag.clone(),
    r.date_borrowed.to_string(),
    r.date_to_be_returned.to_string(),
    r.status.to_string(),
    r.date_returned.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
  ]
}

/// Left-aligned columns, each as wide as its widest cell.
fn table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
  let mut widths = headers.map(str::len);
  for row in rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  let mut out = String::new();
  let mut line = |cells: &mut dyn Iterator<Item = &str>| {
    let padded: Vec<String> = cells.zip(widths).map(|(c, w)| format!("{c:<w$}")).collect();
    let _ = writeln!(out, "{}", padded.join("  ").trim_end());
  };
  line(&mut headers.iter().copied());
  for row in rows {
    line(&mut row.iter().map(String::as_str));
  }
  out
}

pub fn record(r: &BorrowRecord) -> String {
  let rows = [record_row(r)];
  table(RECORD_HEADERS, &rows)
}

pub fn records_page(page: &Page<'_>) -> String {
  if page.total == 0 {
    return "no records\n".into();
  }
  let rows: Vec<_> = page.items.iter().map(|r| record_row(r)).collect();
  let mut out = table(RECORD_HEADERS, &rows);
  let _ = writeln!(
    out,
    "page {} of {} ({} records)",
    page.page,
    page.total_pages.max(1),
    page.total
  );
  out
}

pub fn items(items: &[CatalogItem]) -> String {
  if items.is_empty() {
    return "no catalog items\n".into();
  }
  let rows: Vec<_> = items.iter().map(|i| [i.name.clone(), i.item_id.clone()]).collect();
  table(["NAME", "ID"], &rows)
}

pub fn users(users: &[UserProfile]) -> String {
  if users.is_empty() {
    return "no users\n".into();
  }
  let rows: Vec<_> = users
    .iter()
    .map(|u| [u.uid.clone(), u.display_name(), u.email.clone()])
    .collect();
  table(["UID", "NAME", "EMAIL"], &rows)
}

fn ranking(out: &mut String, title: &str, ranked: &[Ranked]) {
  let _ = writeln!(out, "\n{title}:");
  if ranked.is_empty() {
    let _ = writeln!(out, "  (none)");
  }
  for (i, r) in ranked.iter().enumerate() {
    let _ = writeln!(out, "  {}. {} ({})", i + 1, r.name, r.count);
  }
}

pub fn summary(s: &Summary) -> String {
  let mut out = String::new();
  for (status, count) in s.status_counts.iter() {
    let _ = writeln!(out, "{:<9} {count}", format!("{status}:"));
  }
  let _ = writeln!(out, "{:<9} {}", "Total:", s.status_counts.total());
  ranking(&mut out, "Most borrowed items", &s.top_items);
  ranking(&mut out, "Top borrowers", &s.top_borrowers);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn columns_align_to_the_widest_cell() {
    let rows = [
      ["a".to_string(), "long value".to_string()],
      ["bbbb".to_string(), "x".to_string()],
    ];
    let out = table(["K", "V"], &rows);
    assert_eq!(out, "K     V\na     long value\nbbbb  x\n");
  }

  #[test]
  fn empty_summary_lists_every_status() {
    let out = summary(&lendlog_core::stats::summarize(&[], 3));
    assert!(out.contains("Borrowed: 0"));
    assert!(out.contains("Overdue:  0"));
    assert!(out.contains("Returned: 0"));
    assert!(out.contains("Total:    0"));
    assert!(out.contains("(none)"));
  }
}
