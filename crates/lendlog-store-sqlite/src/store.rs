//! [`SqliteStore`]: the SQLite implementation of the lendlog store traits.

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use lendlog_core::{
  catalog::CatalogItem,
  record::{BorrowRecord, NewBorrowRecord, RecordId, RecordPatch},
  session::Session,
  store::{Authenticator, CatalogStore, RecordStore, UserStore},
  user::UserProfile,
};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawRecord, encode_date, encode_dt, encode_status},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lendlog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }

// ─── Passwords & tokens ──────────────────────────────────────────────────────

fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn password_matches(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
    .is_ok()
}

/// 256 random bits, hex-encoded.
fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn list_records(&self) -> Result<Vec<BorrowRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM borrow_records ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn create_record(&self, fields: NewBorrowRecord) -> Result<BorrowRecord> {
    let record = fields.into_record(RecordId::new(new_id()));
    let r = record.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO borrow_records (
             record_id, full_name, email, item_name, asset_tag,
             date_borrowed, days_borrowed, reason, status,
             date_to_be_returned, date_returned
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            r.id.as_str(),
            r.full_name,
            r.email,
            r.item_name,
            r.asset_tag,
            encode_date(r.date_borrowed),
            r.days_borrowed,
            r.reason,
            encode_status(r.status),
            encode_date(r.date_to_be_returned),
            r.date_returned.map(encode_date),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn update_record(&self, id: RecordId, patch: RecordPatch) -> Result<()> {
    let id_str = id.as_str().to_owned();
    // Nullable columns are written whenever the patch names them, even as NULL.
    let set_email = patch.email.is_some();
    let set_returned = patch.date_returned.is_some();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE borrow_records SET
             full_name           = COALESCE(?2,  full_name),
             email               = CASE WHEN ?12 THEN ?3 ELSE email END,
             item_name           = COALESCE(?4,  item_name),
             asset_tag           = COALESCE(?5,  asset_tag),
             date_borrowed       = COALESCE(?6,  date_borrowed),
             days_borrowed       = COALESCE(?7,  days_borrowed),
             reason              = COALESCE(?8,  reason),
             status              = COALESCE(?9,  status),
             date_to_be_returned = COALESCE(?10, date_to_be_returned),
             date_returned       = CASE WHEN ?13 THEN ?11 ELSE date_returned END
           WHERE record_id = ?1",
          rusqlite::params![
            id_str,
            patch.full_name,
            patch.email.flatten(),
            patch.item_name,
            patch.asset_tag,
            patch.date_borrowed.map(encode_date),
            patch.days_borrowed,
            patch.reason,
            patch.status.map(encode_status),
            patch.date_to_be_returned.map(encode_date),
            patch.date_returned.flatten().map(encode_date),
            set_email,
            set_returned,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::RecordNotFound(id.to_string()));
    }
    Ok(())
  }

  async fn delete_record(&self, id: RecordId) -> Result<()> {
    let id_str = id.as_str().to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM borrow_records WHERE record_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::RecordNotFound(id.to_string()));
    }
    Ok(())
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  async fn list_items(&self) -> Result<Vec<CatalogItem>> {
    let items = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT item_id, name FROM catalog_items ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| Ok(CatalogItem { item_id: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(items)
  }

  async fn create_item(&self, name: String) -> Result<CatalogItem> {
    let item = CatalogItem { item_id: new_id(), name };
    let (id, n) = (item.item_id.clone(), item.name.clone());
    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO catalog_items (item_id, name) VALUES (?1, ?2)",
          rusqlite::params![id, n],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    if !inserted {
      return Err(Error::DuplicateItem(item.name));
    }
    Ok(item)
  }

  async fn delete_item(&self, item_id: String) -> Result<()> {
    let id = item_id.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM catalog_items WHERE item_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::ItemNotFound(item_id));
    }
    Ok(())
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn list_users(&self) -> Result<Vec<UserProfile>> {
    let users = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT uid, email, first_name, last_name FROM user_profiles ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(UserProfile {
              uid:        row.get(0)?,
              email:      row.get(1)?,
              first_name: row.get(2)?,
              last_name:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(users)
  }

  /// Writes are keyed by `uid`; writing an existing uid replaces the profile.
  async fn create_user(&self, profile: UserProfile) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_profiles (uid, email, first_name, last_name)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(uid) DO UPDATE SET
             email      = excluded.email,
             first_name = excluded.first_name,
             last_name  = excluded.last_name",
          rusqlite::params![profile.uid, profile.email, profile.first_name, profile.last_name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_user(&self, uid: String) -> Result<()> {
    let id = uid.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM user_profiles WHERE uid = ?1", rusqlite::params![id])?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::ProfileNotFound(uid));
    }
    Ok(())
  }
}

// ─── Authenticator impl ──────────────────────────────────────────────────────

impl Authenticator for SqliteStore {
  type Error = Error;

  async fn register(&self, email: String, password: String) -> Result<String> {
    let uid = new_id();
    let hash = hash_password(&password)?;
    let (id, addr, created_at) = (uid.clone(), email.clone(), encode_dt(Utc::now()));
    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO accounts (uid, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id, addr, hash, created_at],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    if !inserted {
      return Err(Error::EmailTaken(email));
    }
    Ok(uid)
  }

  async fn sign_in(&self, email: String, password: String) -> Result<Session> {
    let lookup = email.clone();
    let account: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT uid, password_hash FROM accounts WHERE email = ?1",
            rusqlite::params![lookup],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    let Some((uid, phc)) = account else {
      return Err(Error::InvalidCredentials);
    };
    if !password_matches(&password, &phc) {
      return Err(Error::InvalidCredentials);
    }

    let token = new_token();
    let (t, id, created_at) = (token.clone(), uid.clone(), encode_dt(Utc::now()));
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, uid, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![t, id, created_at],
        )?;
        Ok(())
      })
      .await?;

    Ok(Session { token, uid, email })
  }

  async fn verify(&self, token: String) -> Result<String> {
    let uid: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT uid FROM sessions WHERE token = ?1",
            rusqlite::params![token],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    uid.ok_or(Error::InvalidToken)
  }

  /// Unknown tokens are ignored.
  async fn sign_out(&self, token: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![token])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_account(&self, uid: String) -> Result<()> {
    let id = uid.clone();
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sessions WHERE uid = ?1", rusqlite::params![id])?;
        let changed = tx.execute("DELETE FROM accounts WHERE uid = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    if changed == 0 {
      return Err(Error::AccountNotFound(uid));
    }
    Ok(())
  }
}
