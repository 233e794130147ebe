//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, row ids as hyphenated
//! lowercase UUIDs, and data types via their lowercase names. Raw row
//! structs cross the connection-thread boundary as plain strings and are
//! decoded on the caller side.

use chrono::{DateTime, Utc};
use weft_core::{
  row::RowId,
  schema::{ColumnDef, Lifecycle, TableDef},
  value::{StoredValue, ValueType},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_row_id(id: RowId) -> String {
  id.to_string()
}

fn lifecycle_of(deleted_at: &Option<String>) -> Lifecycle {
  if deleted_at.is_some() {
    Lifecycle::SoftDeleted
  } else {
    Lifecycle::Active
  }
}

// ─── Stored values ───────────────────────────────────────────────────────────

/// Physical representation → SQL parameter.
pub fn to_sql_value(v: &StoredValue) -> rusqlite::types::Value {
  use rusqlite::types::Value as Sql;
  match v {
    StoredValue::Null => Sql::Null,
    StoredValue::Text(s) => Sql::Text(s.clone()),
    StoredValue::Integer(i) => Sql::Integer(*i),
    StoredValue::Real(x) => Sql::Real(*x),
    StoredValue::Timestamp(dt) => Sql::Text(encode_dt(*dt)),
  }
}

/// SQL column → physical representation. Timestamp partitions come back as
/// text; [`StoredValue::into_value`] re-parses them against the column type.
pub fn from_sql_value(v: rusqlite::types::Value) -> Result<StoredValue> {
  use rusqlite::types::Value as Sql;
  match v {
    Sql::Null => Ok(StoredValue::Null),
    Sql::Text(s) => Ok(StoredValue::Text(s)),
    Sql::Integer(i) => Ok(StoredValue::Integer(i)),
    Sql::Real(x) => Ok(StoredValue::Real(x)),
    Sql::Blob(_) => {
      Err(Error::Decode("unexpected blob in value partition".into()))
    }
  }
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Raw strings read directly from a `table_definitions` row.
#[derive(Debug, Clone)]
pub struct RawTableDef {
  pub id:         i64,
  pub name:       String,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawTableDef {
  pub fn into_def(self) -> Result<TableDef> {
    Ok(TableDef {
      table_id:   self.id,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
      lifecycle:  lifecycle_of(&self.deleted_at),
    })
  }
}

/// Raw strings read directly from a `column_definitions` row.
#[derive(Debug, Clone)]
pub struct RawColumnDef {
  pub id:         i64,
  pub table_id:   i64,
  pub name:       String,
  pub data_type:  String,
  pub created_at: String,
  pub updated_at: String,
  pub deleted_at: Option<String>,
}

impl RawColumnDef {
  pub fn into_def(self) -> Result<ColumnDef> {
    Ok(ColumnDef {
      column_id:  self.id,
      table_id:   self.table_id,
      name:       self.name,
      data_type:  ValueType::parse(&self.data_type)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      lifecycle:  lifecycle_of(&self.deleted_at),
    })
  }
}

/// One partition entry, read raw from a value store.
#[derive(Debug)]
pub struct RawVersion {
  pub version:    i64,
  pub value:      rusqlite::types::Value,
  pub is_current: bool,
  pub created_at: String,
  pub updated_at: Option<String>,
}
