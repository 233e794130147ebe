//! Core types and trait definitions for the Weft table store.
//!
//! Weft is a schema-on-write layer: logical tables gain columns at any time,
//! every cell value lives in a type-specific partition with full version
//! history, and each table is read back through a generated row-per-entity
//! projection. This crate is deliberately free of database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod plan;
pub mod row;
pub mod schema;
pub mod store;
pub mod value;

pub use error::{Error, Result};
