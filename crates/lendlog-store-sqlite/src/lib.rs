//! SQLite backend for the lendlog borrow tracker.
//!
//! One [`SqliteStore`] implements every collection trait from
//! [`lendlog_core::store`] plus the [`Authenticator`](lendlog_core::store::Authenticator).
//! Access goes through [`tokio_rusqlite`] so queries run on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
