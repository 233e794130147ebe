//! Schema catalog operations.
//!
//! Synchronous helpers over a live connection, composed inside the
//! connection-thread closures in [`crate::store`]. Name lookups are
//! case-insensitive (`COLLATE NOCASE`) and, unless stated otherwise, see
//! only active entities — soft-deleted ones are invisible to conflicts and
//! resolution alike.

use rusqlite::{Connection, OptionalExtension as _, params};
use weft_core::{
  schema::{validate_column_name, validate_table_name},
  value::ValueType,
};

use crate::{
  encode::{RawColumnDef, RawTableDef},
  error::OpError,
};

const TABLE_COLS: &str = "id, name, created_at, deleted_at";
const COLUMN_COLS: &str =
  "id, table_id, name, data_type, created_at, updated_at, deleted_at";

fn map_table(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTableDef> {
  Ok(RawTableDef {
    id:         row.get(0)?,
    name:       row.get(1)?,
    created_at: row.get(2)?,
    deleted_at: row.get(3)?,
  })
}

fn map_column(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawColumnDef> {
  Ok(RawColumnDef {
    id:         row.get(0)?,
    table_id:   row.get(1)?,
    name:       row.get(2)?,
    data_type:  row.get(3)?,
    created_at: row.get(4)?,
    updated_at: row.get(5)?,
    deleted_at: row.get(6)?,
  })
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub(crate) fn find_table(
  conn: &Connection,
  name: &str,
  include_deleted: bool,
) -> Result<Option<RawTableDef>, OpError> {
  let sql = if include_deleted {
    format!(
      "SELECT {TABLE_COLS} FROM table_definitions
       WHERE name = ?1 COLLATE NOCASE
       ORDER BY deleted_at IS NOT NULL LIMIT 1"
    )
  } else {
    format!(
      "SELECT {TABLE_COLS} FROM table_definitions
       WHERE name = ?1 COLLATE NOCASE AND deleted_at IS NULL"
    )
  };
  Ok(conn.query_row(&sql, params![name], map_table).optional()?)
}

/// Resolve an active table or fail with `TableNotFound`.
pub(crate) fn require_table(
  conn: &Connection,
  name: &str,
) -> Result<RawTableDef, OpError> {
  find_table(conn, name, false)?.ok_or_else(|| {
    OpError::Domain(weft_core::Error::TableNotFound(name.to_owned()))
  })
}

pub(crate) fn list_tables(
  conn: &Connection,
) -> Result<Vec<RawTableDef>, OpError> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {TABLE_COLS} FROM table_definitions
     WHERE deleted_at IS NULL ORDER BY id"
  ))?;
  let rows = stmt
    .query_map([], map_table)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Validate and persist a new table definition.
pub(crate) fn insert_table(
  conn: &Connection,
  name: &str,
  now: &str,
) -> Result<RawTableDef, OpError> {
  validate_table_name(name)?;
  if find_table(conn, name, false)?.is_some() {
    return Err(weft_core::Error::TableExists(name.to_owned()).into());
  }

  conn.execute(
    "INSERT INTO table_definitions (name, created_at) VALUES (?1, ?2)",
    params![name, now],
  )?;
  Ok(RawTableDef {
    id:         conn.last_insert_rowid(),
    name:       name.to_owned(),
    created_at: now.to_owned(),
    deleted_at: None,
  })
}

pub(crate) fn soft_delete_table(
  conn: &Connection,
  table_id: i64,
  now: &str,
) -> Result<(), OpError> {
  conn.execute(
    "UPDATE table_definitions SET deleted_at = ?1 WHERE id = ?2",
    params![now, table_id],
  )?;
  Ok(())
}

/// Remove the table and all its column definitions. Value purging is the
/// caller's job (same transaction).
pub(crate) fn hard_delete_table(
  conn: &Connection,
  table_id: i64,
) -> Result<(), OpError> {
  conn.execute(
    "DELETE FROM column_definitions WHERE table_id = ?1",
    params![table_id],
  )?;
  conn.execute(
    "DELETE FROM table_definitions WHERE id = ?1",
    params![table_id],
  )?;
  Ok(())
}

// ─── Columns ─────────────────────────────────────────────────────────────────

pub(crate) fn find_column(
  conn: &Connection,
  table_id: i64,
  name: &str,
  include_deleted: bool,
) -> Result<Option<RawColumnDef>, OpError> {
  let sql = if include_deleted {
    format!(
      "SELECT {COLUMN_COLS} FROM column_definitions
       WHERE table_id = ?1 AND name = ?2 COLLATE NOCASE
       ORDER BY deleted_at IS NOT NULL LIMIT 1"
    )
  } else {
    format!(
      "SELECT {COLUMN_COLS} FROM column_definitions
       WHERE table_id = ?1 AND name = ?2 COLLATE NOCASE
         AND deleted_at IS NULL"
    )
  };
  Ok(
    conn
      .query_row(&sql, params![table_id, name], map_column)
      .optional()?,
  )
}

/// Resolve an active column or fail with `ColumnNotFound`.
pub(crate) fn require_column(
  conn: &Connection,
  table: &RawTableDef,
  name: &str,
) -> Result<RawColumnDef, OpError> {
  find_column(conn, table.id, name, false)?.ok_or_else(|| {
    OpError::Domain(weft_core::Error::ColumnNotFound {
      table:  table.name.clone(),
      column: name.to_owned(),
    })
  })
}

pub(crate) fn columns(
  conn: &Connection,
  table_id: i64,
  include_deleted: bool,
) -> Result<Vec<RawColumnDef>, OpError> {
  let filter = if include_deleted {
    ""
  } else {
    "AND deleted_at IS NULL"
  };
  let mut stmt = conn.prepare(&format!(
    "SELECT {COLUMN_COLS} FROM column_definitions
     WHERE table_id = ?1 {filter} ORDER BY id"
  ))?;
  let rows = stmt
    .query_map(params![table_id], map_column)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Validate and persist a new column definition.
pub(crate) fn insert_column(
  conn: &Connection,
  table: &RawTableDef,
  name: &str,
  data_type: ValueType,
  now: &str,
) -> Result<RawColumnDef, OpError> {
  validate_column_name(name)?;
  if find_column(conn, table.id, name, false)?.is_some() {
    return Err(
      weft_core::Error::ColumnExists {
        table:  table.name.clone(),
        column: name.to_owned(),
      }
      .into(),
    );
  }

  conn.execute(
    "INSERT INTO column_definitions
       (table_id, name, data_type, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?4)",
    params![table.id, name, data_type.to_string(), now],
  )?;
  Ok(RawColumnDef {
    id:         conn.last_insert_rowid(),
    table_id:   table.id,
    name:       name.to_owned(),
    data_type:  data_type.to_string(),
    created_at: now.to_owned(),
    updated_at: now.to_owned(),
    deleted_at: None,
  })
}

/// Rename in place — same id, same values, new name.
pub(crate) fn rename_column(
  conn: &Connection,
  table: &RawTableDef,
  from: &str,
  to: &str,
  now: &str,
) -> Result<RawColumnDef, OpError> {
  validate_column_name(to)?;
  let column = require_column(conn, table, from)?;
  if let Some(conflict) = find_column(conn, table.id, to, false)? {
    // A hit on the column itself means a case-only rename; allow it.
    if conflict.id != column.id {
      return Err(
        weft_core::Error::ColumnExists {
          table:  table.name.clone(),
          column: to.to_owned(),
        }
        .into(),
      );
    }
  }

  conn.execute(
    "UPDATE column_definitions SET name = ?1, updated_at = ?2 WHERE id = ?3",
    params![to, now, column.id],
  )?;
  Ok(RawColumnDef {
    name: to.to_owned(),
    updated_at: now.to_owned(),
    ..column
  })
}

pub(crate) fn soft_delete_column(
  conn: &Connection,
  column_id: i64,
  now: &str,
) -> Result<(), OpError> {
  conn.execute(
    "UPDATE column_definitions SET deleted_at = ?1, updated_at = ?1
     WHERE id = ?2",
    params![now, column_id],
  )?;
  Ok(())
}

/// Drop the definition row. Value purging is the caller's job (same
/// transaction).
pub(crate) fn hard_delete_column(
  conn: &Connection,
  column_id: i64,
) -> Result<(), OpError> {
  conn.execute(
    "DELETE FROM column_definitions WHERE id = ?1",
    params![column_id],
  )?;
  Ok(())
}
