//! The `TableStore` trait and supporting record types.
//!
//! The trait is implemented by storage backends (e.g. `weft-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  row::RowId,
  schema::{ColumnDef, TableDef},
  value::{Value, ValueType},
};

// ─── Operation modifiers ─────────────────────────────────────────────────────

/// How to delete a table or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
  /// Hide the entity; values and history are retained.
  #[default]
  Soft,
  /// Remove the entity and purge every value it ever held.
  Hard,
}

impl DeleteMode {
  pub fn is_hard(self) -> bool {
    matches!(self, Self::Hard)
  }
}

/// How `upsert` resolves the row to write over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertKey {
  /// Write to this exact row, creating it if absent.
  RowId(RowId),
  /// Match the row whose current values in these columns equal the supplied
  /// data. Zero matches inserts; more than one is an error.
  Columns(Vec<String>),
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// One materialised row of a table's projection: identity, row timestamps,
/// and the current value of every active column in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
  pub row_id:     RowId,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub values:     Vec<(String, Value)>,
}

impl Record {
  /// Current value of `column`, by name (case-insensitive). `None` means
  /// the column is not part of the projection; a present-but-null cell is
  /// `Some(&Value::Null)`.
  pub fn get(&self, column: &str) -> Option<&Value> {
    self
      .values
      .iter()
      .find(|(name, _)| name.eq_ignore_ascii_case(column))
      .map(|(_, value)| value)
  }
}

/// One entry of a cell's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueVersion {
  /// 1 for the first write, strictly increasing per (row, column).
  pub version:    i64,
  pub value:      Value,
  pub is_current: bool,
  pub created_at: DateTime<Utc>,
  /// Set when a later version superseded this one.
  pub updated_at: Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Weft table store backend.
///
/// Writes are append-only at the cell level: a new value for a (row, column)
/// pair supersedes the previous version, it never overwrites it. Schema
/// mutations and the projection they invalidate commit atomically — a query
/// issued immediately after a schema change sees the whole change or none
/// of it.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait TableStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tables ────────────────────────────────────────────────────────────

  /// Create a logical table. Fails if the name is reserved or an active
  /// table with that name (case-insensitively) exists.
  fn create_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<TableDef, Self::Error>> + Send + 'a;

  /// Soft- or hard-delete a table. Hard deletion cascades to all owned
  /// columns and purges every value partition.
  fn delete_table<'a>(
    &'a self,
    name: &'a str,
    mode: DeleteMode,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// List active tables, oldest first.
  fn list_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<TableDef>, Self::Error>> + Send + '_;

  // ── Columns ───────────────────────────────────────────────────────────

  /// Add one column. Fails if the name is reserved, or an active column
  /// with that name exists on the table.
  fn add_column<'a>(
    &'a self,
    table: &'a str,
    name: &'a str,
    data_type: ValueType,
  ) -> impl Future<Output = Result<ColumnDef, Self::Error>> + Send + 'a;

  /// Bulk [`add_column`](Self::add_column): all columns are added, or —
  /// on the first conflict — none are.
  fn add_columns<'a>(
    &'a self,
    table: &'a str,
    columns: Vec<(String, ValueType)>,
  ) -> impl Future<Output = Result<Vec<ColumnDef>, Self::Error>> + Send + 'a;

  /// Rename a column in place. The column id and all value history are
  /// preserved; the same naming rules as creation apply to `to`.
  fn rename_column<'a>(
    &'a self,
    table: &'a str,
    from: &'a str,
    to: &'a str,
  ) -> impl Future<Output = Result<ColumnDef, Self::Error>> + Send + 'a;

  /// Soft- or hard-delete a column. Hard deletion purges the column's
  /// entries from its partition in the same transaction and also accepts a
  /// previously soft-deleted column.
  fn delete_column<'a>(
    &'a self,
    table: &'a str,
    name: &'a str,
    mode: DeleteMode,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// List a table's columns in creation order. Soft-deleted columns are
  /// included only when `include_deleted` is set.
  fn list_columns<'a>(
    &'a self,
    table: &'a str,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<ColumnDef>, Self::Error>> + Send + 'a;

  // ── Rows ──────────────────────────────────────────────────────────────

  /// Insert values for a new or existing row.
  ///
  /// Columns that don't exist yet are created with inferred types, in the
  /// same transaction as the value writes. With an explicit `row_id`, a
  /// (row, column) pair that already holds a current value is a
  /// duplicate-id error — use [`upsert`](Self::upsert) to write new
  /// versions.
  fn insert<'a>(
    &'a self,
    table: &'a str,
    values: Vec<(String, Value)>,
    row_id: Option<RowId>,
  ) -> impl Future<Output = Result<RowId, Self::Error>> + Send + 'a;

  /// Insert-or-update. Resolves the target row per `key`; when a row is
  /// found, every supplied column gets a new version over it, otherwise
  /// this behaves like [`insert`](Self::insert).
  fn upsert<'a>(
    &'a self,
    table: &'a str,
    values: Vec<(String, Value)>,
    key: UpsertKey,
  ) -> impl Future<Output = Result<RowId, Self::Error>> + Send + 'a;

  /// Execute the table's projection, optionally filtered by a raw `WHERE`
  /// body evaluated against the projection's fields. A filter naming a
  /// column outside the active set is an error, not a no-op.
  fn query<'a>(
    &'a self,
    table: &'a str,
    filter: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  // ── Cell history ──────────────────────────────────────────────────────

  /// Current value of one cell, or `None` if the row has never had one.
  fn get_current<'a>(
    &'a self,
    table: &'a str,
    row_id: RowId,
    column: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Full version history of one cell, oldest first.
  fn get_history<'a>(
    &'a self,
    table: &'a str,
    row_id: RowId,
    column: &'a str,
  ) -> impl Future<Output = Result<Vec<ValueVersion>, Self::Error>> + Send + 'a;

  // ── Bulk bootstrap ────────────────────────────────────────────────────

  /// Create a table whose columns are inferred from sample rows, then
  /// insert those rows. Column order follows first appearance in the data.
  fn create_table_from_rows<'a>(
    &'a self,
    name: &'a str,
    rows: Vec<Vec<(String, Value)>>,
  ) -> impl Future<Output = Result<TableDef, Self::Error>> + Send + 'a;
}
