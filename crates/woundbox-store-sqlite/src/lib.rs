//! SQLite backend for the Woundbox store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Because every statement funnels
//! through that single connection, mutating operations are serialised — the
//! delete-then-insert replace in `save_annotations` can never interleave
//! with another writer.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
