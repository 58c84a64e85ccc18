//! Route handlers, one module per resource.

pub mod accounts;
pub mod items;
pub mod records;
pub mod session;
pub mod users;
