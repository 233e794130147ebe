//! Projection planning — the engine-agnostic half of view synthesis.
//!
//! A [`ProjectionPlan`] describes how to pivot the type partitions back into
//! one row per entity for a table's current column set: which partition each
//! column reads from, under what alias, in what order. It is a pure value —
//! no SQL text, no storage handle — so any backend can render and execute
//! it. Backends must rebuild it whenever the column set changes; the plan
//! itself is never authoritative.

use serde::{Deserialize, Serialize};

use crate::{
  schema::{ColumnDef, TableDef},
  value::{Partition, ValueType},
};

/// One column's slot in the pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedColumn {
  pub column_id: i64,
  pub name:      String,
  pub data_type: ValueType,
  pub partition: Partition,
}

impl PlannedColumn {
  /// Alias for this column's partition join, unique within the plan.
  pub fn join_alias(&self) -> String {
    format!("{}_{}", self.partition.table_name(), self.column_id)
  }
}

/// The full pivot description for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPlan {
  pub table_id:  i64,
  /// The projection is published under the table's own name.
  pub view_name: String,
  /// Active columns in column-id (creation) order.
  pub columns:   Vec<PlannedColumn>,
}

impl ProjectionPlan {
  /// Plan the projection for `table` given its column definitions.
  /// Soft-deleted columns and columns of other tables are ignored; a table
  /// with no active columns still plans the identity/timestamp fields.
  pub fn build(table: &TableDef, columns: &[ColumnDef]) -> Self {
    let planned = columns
      .iter()
      .filter(|c| c.table_id == table.table_id && c.lifecycle.is_active())
      .map(|c| PlannedColumn {
        column_id: c.column_id,
        name:      c.name.clone(),
        data_type: c.data_type,
        partition: c.data_type.partition(),
      })
      .collect();
    Self::from_parts(table.table_id, table.name.clone(), planned)
  }

  /// Assemble a plan from already-filtered columns, restoring creation
  /// order.
  pub fn from_parts(
    table_id: i64,
    view_name: String,
    mut columns: Vec<PlannedColumn>,
  ) -> Self {
    columns.sort_by_key(|c| c.column_id);
    Self {
      table_id,
      view_name,
      columns,
    }
  }

  /// Look up a planned column by name (case-insensitive, like the catalog).
  pub fn column(&self, name: &str) -> Option<&PlannedColumn> {
    self
      .columns
      .iter()
      .find(|c| c.name.eq_ignore_ascii_case(name))
  }
}
