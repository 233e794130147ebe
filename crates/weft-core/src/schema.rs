//! Catalog vocabulary: table and column definitions, entity lifecycle, and
//! the reserved physical names users may never claim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, value::ValueType};

// ─── Reserved names ──────────────────────────────────────────────────────────

/// Physical names owned by the engine. User tables and columns must not
/// collide with any of these, case-insensitively — this is the persisted
/// layout contract the external safe-query layer routes against.
pub mod reserved {
  pub const TABLE_DEFINITIONS: &str = "table_definitions";
  pub const COLUMN_DEFINITIONS: &str = "column_definitions";
  pub const ROW_METADATA: &str = "row_metadata";

  /// The row-identity field every generated view exposes.
  pub const ROW_ID: &str = "row_id";
  pub const CREATED_AT: &str = "created_at";
  pub const UPDATED_AT: &str = "updated_at";

  /// Metadata stores plus the four value partitions.
  /// Must stay in sync with [`crate::value::Partition::table_name`].
  pub const TABLES: [&str; 7] = [
    TABLE_DEFINITIONS,
    COLUMN_DEFINITIONS,
    ROW_METADATA,
    "text_values",
    "integer_values",
    "real_values",
    "timestamp_values",
  ];

  /// Field names the generated view claims for itself.
  pub const COLUMNS: [&str; 3] = [ROW_ID, CREATED_AT, UPDATED_AT];
}

/// Reject table names that collide with an internal store.
pub fn validate_table_name(name: &str) -> Result<()> {
  if reserved::TABLES.iter().any(|t| t.eq_ignore_ascii_case(name)) {
    return Err(Error::NameProtected(name.to_owned()));
  }
  Ok(())
}

/// Reject column names the generated view reserves for identity and
/// timestamp fields.
pub fn validate_column_name(name: &str) -> Result<()> {
  if reserved::COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name)) {
    return Err(Error::NameProtected(name.to_owned()));
  }
  Ok(())
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Deletion state of a catalog entity. Soft deletion hides an entity while
/// retaining its data; it is terminal unless followed by a hard delete,
/// which removes the record entirely and is therefore not representable as
/// a state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
  Active,
  SoftDeleted,
}

impl Lifecycle {
  pub fn is_active(self) -> bool {
    matches!(self, Self::Active)
  }
}

// ─── Definitions ─────────────────────────────────────────────────────────────

/// One logical table. Owns nothing but a name — the shape of the table is
/// whatever its active columns say it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
  pub table_id:   i64,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub lifecycle:  Lifecycle,
}

/// One attribute of a logical table. Values for it live in the partition
/// matching `data_type`; renames keep the id, so history survives them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
  pub column_id:  i64,
  pub table_id:   i64,
  pub name:       String,
  pub data_type:  ValueType,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub lifecycle:  Lifecycle,
}
