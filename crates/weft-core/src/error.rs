//! Error types for `weft-core`.

use thiserror::Error;

use crate::{row::RowId, value::ValueType};

#[derive(Debug, Error)]
pub enum Error {
  #[error("name {0:?} is reserved for internal use")]
  NameProtected(String),

  #[error("a table named {0:?} already exists")]
  TableExists(String),

  #[error("column {column:?} already exists on table {table:?}")]
  ColumnExists { table: String, column: String },

  #[error("table not found: {0:?}")]
  TableNotFound(String),

  #[error("column {column:?} not found in table {table:?}")]
  ColumnNotFound { table: String, column: String },

  /// Strict insert targeted a (row, column) pair that already holds a
  /// current value. Upsert is the update path.
  #[error(
    "row {row_id} already has a value for column {column:?} in table {table:?}"
  )]
  DuplicateValue {
    table:  String,
    column: String,
    row_id: RowId,
  },

  #[error("cannot interpret {value} as {target}")]
  TypeMismatch { value: String, target: ValueType },

  #[error("{value} is out of range for {target}")]
  Overflow { value: String, target: ValueType },

  /// Upsert key columns resolved to more than one row; refusing to pick one.
  #[error("upsert key {columns:?} matches more than one row in table {table:?}")]
  AmbiguousKey {
    table:   String,
    columns: Vec<String>,
  },

  #[error("upsert key column {0:?} is missing from the supplied data")]
  KeyColumnMissing(String),

  #[error("unknown data type {0:?}")]
  UnknownDataType(String),

  #[error("invalid row id {0:?}: row ids are UUIDs")]
  InvalidRowId(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
