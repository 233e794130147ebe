//! SQLite backend for the Weft table store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every logical operation ships
//! one closure to that thread and runs inside one transaction, which is what
//! makes schema changes and the projection views they invalidate atomic.
//!
//! The generated projection for a logical table is a SQL view published
//! under the table's own name; the physical partition and metadata store
//! names are in [`weft_core::schema::reserved`].

mod catalog;
mod encode;
mod schema;
mod store;
mod values;
mod view;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
