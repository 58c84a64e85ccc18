//! SQL schema for the lendlog SQLite store.
//!
//! Executed once at connection startup. Dates are ISO 8601 calendar dates
//! (`YYYY-MM-DD`); timestamps are RFC 3339 UTC.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Listed in rowid order, i.e. insertion order.
CREATE TABLE IF NOT EXISTS borrow_records (
    record_id           TEXT PRIMARY KEY,
    full_name           TEXT NOT NULL,
    email               TEXT,
    item_name           TEXT NOT NULL,
    asset_tag           TEXT NOT NULL,
    date_borrowed       TEXT NOT NULL,
    days_borrowed       INTEGER NOT NULL CHECK (days_borrowed >= 0),
    reason              TEXT NOT NULL,
    status              TEXT NOT NULL,   -- 'Borrowed' | 'Overdue' | 'Returned'
    date_to_be_returned TEXT NOT NULL,
    date_returned       TEXT
);

CREATE TABLE IF NOT EXISTS catalog_items (
    item_id TEXT PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS user_profiles (
    uid        TEXT PRIMARY KEY,
    email      TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    uid        TEXT NOT NULL REFERENCES accounts(uid) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_uid_idx ON sessions(uid);

PRAGMA user_version = 1;
";
