//! [`SqliteStore`] — the SQLite implementation of [`TableStore`].
//!
//! Every operation ships one closure to the connection thread; mutating
//! operations open a transaction there, so multi-step work (catalog change +
//! value writes + view refresh) commits atomically or rolls back wholesale.
//! That single-connection discipline is also what serialises concurrent
//! writers: version numbers per cell are assigned under the same
//! transaction that flips the prior current entry.

use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use weft_core::{
  plan::{PlannedColumn, ProjectionPlan},
  row::RowId,
  schema::{ColumnDef, TableDef, validate_column_name},
  store::{DeleteMode, Record, TableStore, UpsertKey, ValueVersion},
  value::{Partition, StoredValue, Value, ValueType},
};

use crate::{
  Error, Result, catalog,
  encode::{
    RawColumnDef, RawTableDef, decode_dt, encode_dt, encode_row_id,
    from_sql_value,
  },
  error::{OpError, reclaim},
  schema::SCHEMA,
  values, view,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Weft table store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The store
/// is bound to exactly one storage target; branch management swaps files
/// and opens a fresh store, never rebinds this one.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, translating closure-side errors back
  /// into crate errors (domain errors survive the trip boxed).
  async fn call<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> std::result::Result<T, OpError>
      + Send
      + 'static,
  {
    self
      .conn
      .call(move |conn| f(conn).map_err(tokio_rusqlite::Error::from))
      .await
      .map_err(reclaim)
  }
}

// ─── Closure-side helpers ────────────────────────────────────────────────────

fn plan_for(
  table: &RawTableDef,
  columns: &[RawColumnDef],
) -> std::result::Result<ProjectionPlan, OpError> {
  let mut planned = Vec::with_capacity(columns.len());
  for col in columns {
    let ty = ValueType::parse(&col.data_type)?;
    planned.push(PlannedColumn {
      column_id: col.id,
      name:      col.name.clone(),
      data_type: ty,
      partition: ty.partition(),
    });
  }
  Ok(ProjectionPlan::from_parts(
    table.id,
    table.name.clone(),
    planned,
  ))
}

/// Rebuild the table's view from its current active column set. Callers run
/// this inside the transaction that mutated the schema.
fn refresh_view(
  conn: &Connection,
  table: &RawTableDef,
) -> std::result::Result<(), OpError> {
  let columns = catalog::columns(conn, table.id, false)?;
  let plan = plan_for(table, &columns)?;
  view::refresh(conn, &plan)
}

/// One cell write, resolved and coerced but not yet applied.
struct PreparedWrite {
  column_id: i64,
  name:      String,
  partition: Partition,
  stored:    StoredValue,
}

/// Resolve each named column — auto-creating missing ones with inferred
/// types — and coerce the values. Returns the writes plus whether the
/// schema changed (i.e. the view needs a refresh before commit).
fn prepare_writes(
  conn: &Connection,
  table: &RawTableDef,
  values: &[(String, Value)],
  now: &str,
) -> std::result::Result<(Vec<PreparedWrite>, bool), OpError> {
  let mut writes = Vec::with_capacity(values.len());
  let mut schema_changed = false;

  for (name, value) in values {
    let raw = match catalog::find_column(conn, table.id, name, false)? {
      Some(existing) => existing,
      None => {
        schema_changed = true;
        catalog::insert_column(conn, table, name, value.infer_type(), now)?
      }
    };
    let ty = ValueType::parse(&raw.data_type)?;
    writes.push(PreparedWrite {
      column_id: raw.id,
      name:      raw.name,
      partition: ty.partition(),
      stored:    value.coerce(ty)?,
    });
  }

  Ok((writes, schema_changed))
}

/// Rewrite the engine's "no such column" failure from a user filter into
/// the domain error the caller can act on.
fn map_no_such_column(err: Error, table: &str) -> Error {
  let message = match &err {
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(_, Some(message)),
    )) => message.clone(),
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqlInputError { msg, .. },
    )) => msg.clone(),
    _ => return err,
  };
  match message.strip_prefix("no such column: ") {
    Some(column) => Error::Core(weft_core::Error::ColumnNotFound {
      table:  table.to_owned(),
      column: column.to_owned(),
    }),
    None => err,
  }
}

fn text_of(v: rusqlite::types::Value) -> Result<String> {
  match v {
    rusqlite::types::Value::Text(s) => Ok(s),
    other => Err(Error::Decode(format!("expected text, got {other:?}"))),
  }
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  // ── Tables ────────────────────────────────────────────────────────────────

  async fn create_table(&self, name: &str) -> Result<TableDef> {
    let name_owned = name.to_owned();
    let now = encode_dt(Utc::now());

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::insert_table(&tx, &name_owned, &now)?;
        // Even a column-less table publishes its identity fields.
        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(table)
      })
      .await?;

    tracing::info!(table = %raw.name, id = raw.id, "created table");
    raw.into_def()
  }

  async fn delete_table(&self, name: &str, mode: DeleteMode) -> Result<()> {
    let name_owned = name.to_owned();
    let now = encode_dt(Utc::now());

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Hard deletion also accepts a table that was soft-deleted first.
        let table = catalog::find_table(&tx, &name_owned, mode.is_hard())?
          .ok_or_else(|| {
            OpError::Domain(weft_core::Error::TableNotFound(name_owned.clone()))
          })?;

        if mode.is_hard() {
          values::purge_table(&tx, table.id)?;
          catalog::hard_delete_table(&tx, table.id)?;
        } else {
          catalog::soft_delete_table(&tx, table.id, &now)?;
        }
        view::drop_view(&tx, &table.name)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(table = name, ?mode, "deleted table");
    Ok(())
  }

  async fn list_tables(&self) -> Result<Vec<TableDef>> {
    let raws = self.call(|conn| catalog::list_tables(conn)).await?;
    raws.into_iter().map(RawTableDef::into_def).collect()
  }

  // ── Columns ───────────────────────────────────────────────────────────────

  async fn add_column(
    &self,
    table: &str,
    name: &str,
    data_type: ValueType,
  ) -> Result<ColumnDef> {
    let table_name = table.to_owned();
    let name_owned = name.to_owned();
    let now = encode_dt(Utc::now());

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;
        let column =
          catalog::insert_column(&tx, &table, &name_owned, data_type, &now)?;
        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(column)
      })
      .await?;

    tracing::debug!(table, column = name, %data_type, "added column");
    raw.into_def()
  }

  async fn add_columns(
    &self,
    table: &str,
    columns: Vec<(String, ValueType)>,
  ) -> Result<Vec<ColumnDef>> {
    let table_name = table.to_owned();
    let now = encode_dt(Utc::now());
    let count = columns.len();

    let raws = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;
        let mut added = Vec::with_capacity(columns.len());
        // First conflict aborts the transaction; nothing is added.
        for (name, data_type) in &columns {
          added.push(catalog::insert_column(
            &tx, &table, name, *data_type, &now,
          )?);
        }
        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(added)
      })
      .await?;

    tracing::debug!(table, count, "added columns");
    raws.into_iter().map(RawColumnDef::into_def).collect()
  }

  async fn rename_column(
    &self,
    table: &str,
    from: &str,
    to: &str,
  ) -> Result<ColumnDef> {
    let table_name = table.to_owned();
    let from_owned = from.to_owned();
    let to_owned = to.to_owned();
    let now = encode_dt(Utc::now());

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;
        let column =
          catalog::rename_column(&tx, &table, &from_owned, &to_owned, &now)?;
        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(column)
      })
      .await?;

    tracing::debug!(table, from, to, "renamed column");
    raw.into_def()
  }

  async fn delete_column(
    &self,
    table: &str,
    name: &str,
    mode: DeleteMode,
  ) -> Result<()> {
    let table_name = table.to_owned();
    let name_owned = name.to_owned();
    let now = encode_dt(Utc::now());

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;

        if mode.is_hard() {
          // Also accepts a column that was soft-deleted first.
          let column = catalog::find_column(&tx, table.id, &name_owned, true)?
            .ok_or_else(|| {
              OpError::Domain(weft_core::Error::ColumnNotFound {
                table:  table.name.clone(),
                column: name_owned.clone(),
              })
            })?;
          let ty = ValueType::parse(&column.data_type)?;
          values::purge_column(&tx, ty.partition(), table.id, column.id)?;
          catalog::hard_delete_column(&tx, column.id)?;
        } else {
          let column = catalog::require_column(&tx, &table, &name_owned)?;
          catalog::soft_delete_column(&tx, column.id, &now)?;
        }

        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(table, column = name, ?mode, "deleted column");
    Ok(())
  }

  async fn list_columns(
    &self,
    table: &str,
    include_deleted: bool,
  ) -> Result<Vec<ColumnDef>> {
    let table_name = table.to_owned();

    let raws = self
      .call(move |conn| {
        let table = catalog::require_table(conn, &table_name)?;
        catalog::columns(conn, table.id, include_deleted)
      })
      .await?;

    raws.into_iter().map(RawColumnDef::into_def).collect()
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  async fn insert(
    &self,
    table: &str,
    values: Vec<(String, Value)>,
    row_id: Option<RowId>,
  ) -> Result<RowId> {
    for (name, _) in &values {
      validate_column_name(name)?;
    }

    let explicit = row_id.is_some();
    let row = row_id.unwrap_or_else(RowId::generate);
    let row_str = encode_row_id(row);
    let table_name = table.to_owned();
    let now = encode_dt(Utc::now());

    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;
        let (writes, schema_changed) =
          prepare_writes(&tx, &table, &values, &now)?;

        // Strict-insert semantics: an explicit id may extend a row with new
        // columns but never silently overwrite a cell.
        if explicit {
          for write in &writes {
            if values::current_exists(
              &tx,
              write.partition,
              table.id,
              write.column_id,
              &row_str,
            )? {
              return Err(
                weft_core::Error::DuplicateValue {
                  table:  table.name.clone(),
                  column: write.name.clone(),
                  row_id: row,
                }
                .into(),
              );
            }
          }
        }

        values::ensure_row(&tx, table.id, &row_str, &now)?;
        for write in &writes {
          values::put(
            &tx,
            write.partition,
            table.id,
            write.column_id,
            &row_str,
            &write.stored,
            &now,
          )?;
        }
        if schema_changed {
          refresh_view(&tx, &table)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(table, row = %row, "inserted row");
    Ok(row)
  }

  async fn upsert(
    &self,
    table: &str,
    values: Vec<(String, Value)>,
    key: UpsertKey,
  ) -> Result<RowId> {
    for (name, _) in &values {
      validate_column_name(name)?;
    }

    let table_name = table.to_owned();
    let now = encode_dt(Utc::now());
    // Pre-generated id for the insert path, so the closure stays pure.
    let fallback = RowId::generate();
    let fallback_str = encode_row_id(fallback);

    let resolved = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::require_table(&tx, &table_name)?;

        let row_str = match &key {
          UpsertKey::RowId(row) => encode_row_id(*row),
          UpsertKey::Columns(keys) => {
            resolve_key_row(&tx, &table, keys, &values, &fallback_str)?
          }
        };

        let (writes, schema_changed) =
          prepare_writes(&tx, &table, &values, &now)?;

        values::ensure_row(&tx, table.id, &row_str, &now)?;
        for write in &writes {
          values::put(
            &tx,
            write.partition,
            table.id,
            write.column_id,
            &row_str,
            &write.stored,
            &now,
          )?;
        }
        if schema_changed {
          refresh_view(&tx, &table)?;
        }
        tx.commit()?;
        Ok(row_str)
      })
      .await?;

    let row = RowId::parse(&resolved).map_err(Error::Core)?;
    tracing::debug!(table, row = %row, "upserted row");
    Ok(row)
  }

  async fn query(
    &self,
    table: &str,
    filter: Option<&str>,
  ) -> Result<Vec<Record>> {
    let table_name = table.to_owned();
    let filter = filter.map(str::to_owned);

    let (columns, rows) = self
      .call(move |conn| {
        let table = catalog::require_table(conn, &table_name)?;
        let columns = catalog::columns(conn, table.id, false)?;

        let mut sql =
          format!("SELECT * FROM {}", view::quote_ident(&table.name));
        if let Some(body) = &filter {
          sql.push_str(" WHERE ");
          sql.push_str(body);
        }

        let mut stmt = conn.prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt
          .query_map([], |row| {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
              cells.push(row.get::<_, rusqlite::types::Value>(i)?);
            }
            Ok(cells)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((columns, rows))
      })
      .await
      .map_err(|e| map_no_such_column(e, table))?;

    // View layout: row_id, one field per active column, created_at,
    // updated_at. The view was rebuilt with the catalog in the same
    // transaction as every schema change, so the shapes agree.
    let mut records = Vec::with_capacity(rows.len());
    for raw in rows {
      if raw.len() != columns.len() + 3 {
        return Err(Error::Decode(format!(
          "projection width {} does not match {} columns",
          raw.len(),
          columns.len()
        )));
      }

      let mut cells = raw.into_iter();
      let missing =
        || Error::Decode("projection row ended early".into());

      let row_id = RowId::parse(&text_of(cells.next().ok_or_else(missing)?)?)
        .map_err(Error::Core)?;

      let mut fields = Vec::with_capacity(columns.len());
      for column in &columns {
        let ty = ValueType::parse(&column.data_type).map_err(Error::Core)?;
        let stored = from_sql_value(cells.next().ok_or_else(missing)?)?;
        fields.push((
          column.name.clone(),
          stored.into_value(ty).map_err(Error::Core)?,
        ));
      }

      let created_at = decode_dt(&text_of(cells.next().ok_or_else(missing)?)?)?;
      let updated_at = decode_dt(&text_of(cells.next().ok_or_else(missing)?)?)?;

      records.push(Record {
        row_id,
        created_at,
        updated_at,
        values: fields,
      });
    }
    Ok(records)
  }

  // ── Cell history ──────────────────────────────────────────────────────────

  async fn get_current(
    &self,
    table: &str,
    row_id: RowId,
    column: &str,
  ) -> Result<Option<Value>> {
    let table_name = table.to_owned();
    let column_name = column.to_owned();
    let row_str = encode_row_id(row_id);

    let (data_type, cell) = self
      .call(move |conn| {
        let table = catalog::require_table(conn, &table_name)?;
        // Soft deletion keeps history readable; only a hard delete makes
        // the column unknown here.
        let column = catalog::find_column(conn, table.id, &column_name, true)?
          .ok_or_else(|| {
            OpError::Domain(weft_core::Error::ColumnNotFound {
              table:  table.name.clone(),
              column: column_name.clone(),
            })
          })?;
        let ty = ValueType::parse(&column.data_type)?;
        let cell =
          values::current(conn, ty.partition(), table.id, column.id, &row_str)?;
        Ok((column.data_type, cell))
      })
      .await?;

    match cell {
      None => Ok(None),
      Some(raw) => {
        let ty = ValueType::parse(&data_type).map_err(Error::Core)?;
        Ok(Some(from_sql_value(raw)?.into_value(ty).map_err(Error::Core)?))
      }
    }
  }

  async fn get_history(
    &self,
    table: &str,
    row_id: RowId,
    column: &str,
  ) -> Result<Vec<ValueVersion>> {
    let table_name = table.to_owned();
    let column_name = column.to_owned();
    let row_str = encode_row_id(row_id);

    let (data_type, raws) = self
      .call(move |conn| {
        let table = catalog::require_table(conn, &table_name)?;
        let column = catalog::find_column(conn, table.id, &column_name, true)?
          .ok_or_else(|| {
            OpError::Domain(weft_core::Error::ColumnNotFound {
              table:  table.name.clone(),
              column: column_name.clone(),
            })
          })?;
        let ty = ValueType::parse(&column.data_type)?;
        let raws =
          values::history(conn, ty.partition(), table.id, column.id, &row_str)?;
        Ok((column.data_type, raws))
      })
      .await?;

    let ty = ValueType::parse(&data_type).map_err(Error::Core)?;
    raws
      .into_iter()
      .map(|raw| {
        Ok(ValueVersion {
          version:    raw.version,
          value:      from_sql_value(raw.value)?
            .into_value(ty)
            .map_err(Error::Core)?,
          is_current: raw.is_current,
          created_at: decode_dt(&raw.created_at)?,
          updated_at: raw.updated_at.as_deref().map(decode_dt).transpose()?,
        })
      })
      .collect()
  }

  // ── Bulk bootstrap ────────────────────────────────────────────────────────

  async fn create_table_from_rows(
    &self,
    name: &str,
    rows: Vec<Vec<(String, Value)>>,
  ) -> Result<TableDef> {
    // Column specs: first-appearance order, types voted over the sample.
    let specs: Vec<(String, ValueType)> = {
      let mut names: Vec<String> = Vec::new();
      let mut samples: Vec<Vec<&Value>> = Vec::new();
      for row in &rows {
        for (column, value) in row {
          match names.iter().position(|n| n.eq_ignore_ascii_case(column)) {
            Some(slot) => samples[slot].push(value),
            None => {
              names.push(column.clone());
              samples.push(vec![value]);
            }
          }
        }
      }
      names
        .into_iter()
        .zip(&samples)
        .map(|(n, vs)| (n, ValueType::infer_many(vs.iter().copied())))
        .collect()
    };
    for (column, _) in &specs {
      validate_column_name(column)?;
    }

    let name_owned = name.to_owned();
    let now = encode_dt(Utc::now());
    let row_ids: Vec<String> = rows
      .iter()
      .map(|_| encode_row_id(RowId::generate()))
      .collect();
    let row_count = rows.len();

    let raw = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let table = catalog::insert_table(&tx, &name_owned, &now)?;

        let mut columns = Vec::with_capacity(specs.len());
        for (column, data_type) in &specs {
          columns.push(catalog::insert_column(
            &tx, &table, column, *data_type, &now,
          )?);
        }

        for (row, row_str) in rows.iter().zip(&row_ids) {
          values::ensure_row(&tx, table.id, row_str, &now)?;
          for (column, value) in row {
            let def = columns
              .iter()
              .find(|c| c.name.eq_ignore_ascii_case(column))
              .ok_or_else(|| {
                OpError::Domain(weft_core::Error::ColumnNotFound {
                  table:  table.name.clone(),
                  column: column.clone(),
                })
              })?;
            let ty = ValueType::parse(&def.data_type)?;
            values::put(
              &tx,
              ty.partition(),
              table.id,
              def.id,
              row_str,
              &value.coerce(ty)?,
              &now,
            )?;
          }
        }

        refresh_view(&tx, &table)?;
        tx.commit()?;
        Ok(table)
      })
      .await?;

    tracing::info!(table = %raw.name, rows = row_count, "created table from rows");
    raw.into_def()
  }
}

// ─── Upsert key resolution ───────────────────────────────────────────────────

/// Find the row whose current values match the key columns. Zero matches
/// hands back the caller's fallback id (insert path); more than one is an
/// ambiguity error. A key column that doesn't exist yet can't match
/// anything, so it forces the insert path too.
fn resolve_key_row(
  conn: &Connection,
  table: &RawTableDef,
  keys: &[String],
  values: &[(String, Value)],
  fallback: &str,
) -> std::result::Result<String, OpError> {
  let mut candidates: Option<Vec<String>> = None;
  let mut unmatchable = false;

  for key in keys {
    let (_, key_value) = values
      .iter()
      .find(|(name, _)| name.eq_ignore_ascii_case(key))
      .ok_or_else(|| {
        OpError::Domain(weft_core::Error::KeyColumnMissing(key.clone()))
      })?;

    match catalog::find_column(conn, table.id, key, false)? {
      Some(column) => {
        let ty = ValueType::parse(&column.data_type)?;
        let stored = key_value.coerce(ty)?;
        let rows = values::rows_matching(
          conn,
          ty.partition(),
          table.id,
          column.id,
          &stored,
        )?;
        candidates = Some(match candidates {
          None => rows,
          Some(prev) => {
            prev.into_iter().filter(|r| rows.contains(r)).collect()
          }
        });
      }
      None => unmatchable = true,
    }
  }

  let matched = if unmatchable {
    Vec::new()
  } else {
    candidates.unwrap_or_default()
  };

  match matched.as_slice() {
    [] => Ok(fallback.to_owned()),
    [row] => Ok(row.clone()),
    _ => Err(
      weft_core::Error::AmbiguousKey {
        table:   table.name.clone(),
        columns: keys.to_vec(),
      }
      .into(),
    ),
  }
}
