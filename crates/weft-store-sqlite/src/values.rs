//! The versioned value store.
//!
//! Synchronous helpers over the four type partitions, composed inside the
//! connection-thread closures in [`crate::store`]. Writes are append-only:
//! `put` flips the prior current entry and inserts the next version; the
//! only deletes are the purge paths backing hard schema deletion.
//!
//! Partition names come from [`Partition::table_name`] — a closed, trusted
//! set — so interpolating them into SQL text is safe.

use rusqlite::{Connection, OptionalExtension as _, params};
use weft_core::value::{Partition, StoredValue};

use crate::{
  encode::{RawVersion, to_sql_value},
  error::OpError,
};

// ─── Row anchors ─────────────────────────────────────────────────────────────

/// Make sure `row_metadata` anchors this row, bumping `updated_at` when it
/// already does. First write wins `created_at`.
pub(crate) fn ensure_row(
  conn: &Connection,
  table_id: i64,
  row_id: &str,
  now: &str,
) -> Result<(), OpError> {
  conn.execute(
    "INSERT INTO row_metadata (row_id, table_id, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?3)
     ON CONFLICT (row_id, table_id) DO UPDATE SET updated_at = ?3",
    params![row_id, table_id, now],
  )?;
  Ok(())
}

/// Whether the row is anchored (and not soft-deleted) in this table.
pub(crate) fn row_exists(
  conn: &Connection,
  table_id: i64,
  row_id: &str,
) -> Result<bool, OpError> {
  let hit: Option<i64> = conn
    .query_row(
      "SELECT 1 FROM row_metadata
       WHERE row_id = ?1 AND table_id = ?2 AND deleted_at IS NULL",
      params![row_id, table_id],
      |row| row.get(0),
    )
    .optional()?;
  Ok(hit.is_some())
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Append a new version for one cell and return its version number.
/// Must run inside the caller's transaction together with [`ensure_row`].
pub(crate) fn put(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
  row_id: &str,
  value: &StoredValue,
  now: &str,
) -> Result<i64, OpError> {
  let store = partition.table_name();

  conn.execute(
    &format!(
      "UPDATE {store} SET is_current = 0, updated_at = ?1
       WHERE row_id = ?2 AND table_id = ?3 AND column_id = ?4
         AND is_current = 1"
    ),
    params![now, row_id, table_id, column_id],
  )?;

  let version: i64 = conn.query_row(
    &format!(
      "SELECT COALESCE(MAX(version), 0) + 1 FROM {store}
       WHERE row_id = ?1 AND table_id = ?2 AND column_id = ?3"
    ),
    params![row_id, table_id, column_id],
    |row| row.get(0),
  )?;

  conn.execute(
    &format!(
      "INSERT INTO {store}
         (row_id, table_id, column_id, version, value, is_current, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)"
    ),
    params![row_id, table_id, column_id, version, to_sql_value(value), now],
  )?;

  Ok(version)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Whether the cell currently holds a value. Used by strict insert to
/// detect explicit-id collisions.
pub(crate) fn current_exists(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
  row_id: &str,
) -> Result<bool, OpError> {
  let hit: Option<i64> = conn
    .query_row(
      &format!(
        "SELECT 1 FROM {} WHERE row_id = ?1 AND table_id = ?2
           AND column_id = ?3 AND is_current = 1",
        partition.table_name()
      ),
      params![row_id, table_id, column_id],
      |row| row.get(0),
    )
    .optional()?;
  Ok(hit.is_some())
}

pub(crate) fn current(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
  row_id: &str,
) -> Result<Option<rusqlite::types::Value>, OpError> {
  Ok(
    conn
      .query_row(
        &format!(
          "SELECT value FROM {} WHERE row_id = ?1 AND table_id = ?2
             AND column_id = ?3 AND is_current = 1",
          partition.table_name()
        ),
        params![row_id, table_id, column_id],
        |row| row.get(0),
      )
      .optional()?,
  )
}

/// Full history of one cell, oldest version first.
pub(crate) fn history(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
  row_id: &str,
) -> Result<Vec<RawVersion>, OpError> {
  let mut stmt = conn.prepare(&format!(
    "SELECT version, value, is_current, created_at, updated_at
     FROM {} WHERE row_id = ?1 AND table_id = ?2 AND column_id = ?3
     ORDER BY version",
    partition.table_name()
  ))?;
  let rows = stmt
    .query_map(params![row_id, table_id, column_id], |row| {
      Ok(RawVersion {
        version:    row.get(0)?,
        value:      row.get(1)?,
        is_current: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Row ids whose current value in one column equals `value`. Feeds upsert
/// key resolution; the caller intersects across key columns.
pub(crate) fn rows_matching(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
  value: &StoredValue,
) -> Result<Vec<String>, OpError> {
  let mut stmt = conn.prepare(&format!(
    "SELECT v.row_id FROM {} v
     JOIN row_metadata rm
       ON rm.row_id = v.row_id AND rm.table_id = v.table_id
     WHERE v.table_id = ?1 AND v.column_id = ?2 AND v.is_current = 1
       AND v.value = ?3 AND rm.deleted_at IS NULL
     ORDER BY rm.created_at, v.row_id",
    partition.table_name()
  ))?;
  let rows = stmt
    .query_map(params![table_id, column_id, to_sql_value(value)], |row| {
      row.get(0)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Purging ─────────────────────────────────────────────────────────────────

/// Hard-delete every entry a column ever held, history included. Runs in
/// the same transaction as the catalog's hard delete.
pub(crate) fn purge_column(
  conn: &Connection,
  partition: Partition,
  table_id: i64,
  column_id: i64,
) -> Result<usize, OpError> {
  let purged = conn.execute(
    &format!(
      "DELETE FROM {} WHERE table_id = ?1 AND column_id = ?2",
      partition.table_name()
    ),
    params![table_id, column_id],
  )?;
  Ok(purged)
}

/// Hard-delete everything a table ever stored: all partitions, then the row
/// anchors.
pub(crate) fn purge_table(
  conn: &Connection,
  table_id: i64,
) -> Result<(), OpError> {
  for partition in Partition::all() {
    conn.execute(
      &format!("DELETE FROM {} WHERE table_id = ?1", partition.table_name()),
      params![table_id],
    )?;
  }
  conn.execute(
    "DELETE FROM row_metadata WHERE table_id = ?1",
    params![table_id],
  )?;
  Ok(())
}
