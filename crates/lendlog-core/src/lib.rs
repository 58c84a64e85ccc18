//! Core types and trait definitions for the lendlog borrow tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement the traits in [`store`]; front ends drive the
//! [`view::RecordViewModel`].

pub mod accounts;
pub mod catalog;
pub mod client;
pub mod clock;
pub mod error;
pub mod overdue;
pub mod record;
pub mod session;
pub mod stats;
pub mod store;
pub mod submission;
pub mod sweep;
pub mod user;
pub mod view;

pub use error::{Error, Result, ValidationError};

#[cfg(test)]
mod testing;
