//! View synthesis — rendering a [`ProjectionPlan`] to SQL and keeping the
//! published view in lockstep with the catalog.
//!
//! Every schema-mutating operation calls [`refresh`] (or [`drop_view`])
//! inside its own transaction, so a query can never observe a view that
//! disagrees with the catalog: the view change and the schema change commit
//! together or not at all.

use rusqlite::Connection;
use weft_core::plan::ProjectionPlan;

use crate::error::OpError;

/// Double-quote an identifier for SQL text, escaping embedded quotes.
/// User table and column names are arbitrary strings; they only ever enter
/// statements through this.
pub(crate) fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render the `CREATE VIEW` statement for a plan.
///
/// One `LEFT JOIN` per column pivots that column's partition entries back
/// onto the row anchor: rows missing a value for some column come back with
/// NULL there, and soft-deleted rows are filtered at the anchor. Numeric
/// ids are engine-assigned and embedded as literals.
pub(crate) fn render(plan: &ProjectionPlan) -> String {
  let mut selects = vec!["rm.row_id".to_owned()];
  let mut joins = String::new();

  for col in &plan.columns {
    let alias = col.join_alias();
    selects.push(format!("{alias}.value AS {}", quote_ident(&col.name)));
    joins.push_str(&format!(
      "\nLEFT JOIN {partition} {alias} ON {alias}.row_id = rm.row_id\
       \n  AND {alias}.table_id = {table_id}\
       \n  AND {alias}.column_id = {column_id}\
       \n  AND {alias}.is_current = 1",
      partition = col.partition.table_name(),
      table_id = plan.table_id,
      column_id = col.column_id,
    ));
  }

  selects.push("rm.created_at".to_owned());
  selects.push("rm.updated_at".to_owned());

  format!(
    "CREATE VIEW {view} AS\nSELECT {selects}\nFROM row_metadata rm{joins}\n\
     WHERE rm.table_id = {table_id} AND rm.deleted_at IS NULL",
    view = quote_ident(&plan.view_name),
    selects = selects.join(", "),
    table_id = plan.table_id,
  )
}

/// Drop and re-create the view for `plan`. Runs inside the caller's
/// transaction.
pub(crate) fn refresh(
  conn: &Connection,
  plan: &ProjectionPlan,
) -> Result<(), OpError> {
  drop_view(conn, &plan.view_name)?;
  conn.execute_batch(&render(plan))?;
  tracing::debug!(
    view = %plan.view_name,
    columns = plan.columns.len(),
    "refreshed projection view"
  );
  Ok(())
}

pub(crate) fn drop_view(
  conn: &Connection,
  name: &str,
) -> Result<(), OpError> {
  conn.execute_batch(&format!("DROP VIEW IF EXISTS {}", quote_ident(name)))?;
  Ok(())
}
