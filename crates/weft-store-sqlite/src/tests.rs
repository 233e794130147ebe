//! Integration tests for `SqliteStore` against an in-memory database.

use weft_core::{
  row::RowId,
  store::{DeleteMode, TableStore, UpsertKey},
  value::{Value, ValueType},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
  pairs
    .iter()
    .map(|(name, value)| ((*name).to_owned(), value.clone()))
    .collect()
}

fn core_err(err: &Error) -> Option<&weft_core::Error> {
  match err {
    Error::Core(e) => Some(e),
    _ => None,
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_tables() {
  let s = store().await;

  let users = s.create_table("users").await.unwrap();
  s.create_table("orders").await.unwrap();

  let tables = s.list_tables().await.unwrap();
  assert_eq!(tables.len(), 2);
  assert_eq!(tables[0].table_id, users.table_id);
  assert_eq!(tables[0].name, "users");
  assert!(tables[0].lifecycle.is_active());
}

#[tokio::test]
async fn create_table_name_conflict_is_case_insensitive() {
  let s = store().await;
  s.create_table("users").await.unwrap();

  let err = s.create_table("Users").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::TableExists(_))
  ));
}

#[tokio::test]
async fn protected_table_names_rejected_without_partial_state() {
  let s = store().await;

  for name in ["table_definitions", "Text_Values", "ROW_METADATA"] {
    let err = s.create_table(name).await.unwrap_err();
    assert!(
      matches!(core_err(&err), Some(weft_core::Error::NameProtected(_))),
      "{name} should be protected, got {err:?}"
    );
  }
  assert!(s.list_tables().await.unwrap().is_empty());
}

#[tokio::test]
async fn soft_deleted_table_frees_its_name() {
  let s = store().await;
  s.create_table("staging").await.unwrap();
  s.delete_table("staging", DeleteMode::Soft).await.unwrap();

  assert!(s.list_tables().await.unwrap().is_empty());
  let err = s.query("staging", None).await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::TableNotFound(_))
  ));

  // The name is free again; only active tables conflict.
  s.create_table("staging").await.unwrap();
}

#[tokio::test]
async fn hard_delete_table_purges_values() {
  let s = store().await;
  s.create_table("scratch").await.unwrap();
  let row = s
    .insert("scratch", record(&[("note", Value::from("temp"))]), None)
    .await
    .unwrap();
  s.delete_table("scratch", DeleteMode::Hard).await.unwrap();

  // Recreating the table starts from nothing: no rows, no columns.
  s.create_table("scratch").await.unwrap();
  assert!(s.query("scratch", None).await.unwrap().is_empty());
  assert!(s.list_columns("scratch", true).await.unwrap().is_empty());

  let err = s.get_history("scratch", row, "note").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));
}

#[tokio::test]
async fn unknown_table_errors() {
  let s = store().await;

  let err = s
    .add_column("missing", "a", ValueType::Text)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::TableNotFound(_))
  ));

  let err = s.insert("missing", record(&[]), None).await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::TableNotFound(_))
  ));
}

// ─── Columns ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_columns() {
  let s = store().await;
  s.create_table("users").await.unwrap();

  let name = s.add_column("users", "name", ValueType::Text).await.unwrap();
  s.add_column("users", "age", ValueType::Integer)
    .await
    .unwrap();

  let columns = s.list_columns("users", false).await.unwrap();
  assert_eq!(columns.len(), 2);
  assert_eq!(columns[0].column_id, name.column_id);
  assert_eq!(columns[0].data_type, ValueType::Text);
}

#[tokio::test]
async fn add_column_rejects_conflicts_and_protected_names() {
  let s = store().await;
  s.create_table("users").await.unwrap();
  s.add_column("users", "name", ValueType::Text).await.unwrap();

  let err = s
    .add_column("users", "NAME", ValueType::Text)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnExists { .. })
  ));

  for reserved in ["row_id", "Created_At", "UPDATED_AT"] {
    let err = s
      .add_column("users", reserved, ValueType::Text)
      .await
      .unwrap_err();
    assert!(
      matches!(core_err(&err), Some(weft_core::Error::NameProtected(_))),
      "{reserved} should be protected"
    );
  }
}

#[tokio::test]
async fn add_columns_is_atomic() {
  let s = store().await;
  s.create_table("users").await.unwrap();
  s.add_column("users", "email", ValueType::Text).await.unwrap();

  // The batch conflicts on its second entry: nothing from it may land.
  let err = s
    .add_columns(
      "users",
      vec![
        ("age".to_owned(), ValueType::Integer),
        ("email".to_owned(), ValueType::Text),
      ],
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnExists { .. })
  ));

  let names: Vec<_> = s
    .list_columns("users", true)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, ["email"]);
}

// ─── Rename ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rename_column_preserves_id_and_data() {
  let s = store().await;
  s.create_table("users").await.unwrap();
  let before = s
    .add_column("users", "username", ValueType::Text)
    .await
    .unwrap();
  let row = s
    .insert("users", record(&[("username", Value::from("john"))]), None)
    .await
    .unwrap();

  let renamed = s
    .rename_column("users", "username", "display_name")
    .await
    .unwrap();
  assert_eq!(renamed.column_id, before.column_id);

  let records = s.query("users", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("display_name"), Some(&Value::from("john")));
  assert_eq!(records[0].get("username"), None);

  // History rides along with the column id.
  let history = s.get_history("users", row, "display_name").await.unwrap();
  assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn rename_there_and_back_restores_the_catalog() {
  let s = store().await;
  s.create_table("users").await.unwrap();
  let original = s
    .add_column("users", "status", ValueType::Text)
    .await
    .unwrap();
  s.insert("users", record(&[("status", Value::from("ok"))]), None)
    .await
    .unwrap();

  s.rename_column("users", "status", "state").await.unwrap();
  let restored = s.rename_column("users", "state", "status").await.unwrap();

  assert_eq!(restored.column_id, original.column_id);
  assert_eq!(restored.data_type, original.data_type);
  assert_eq!(restored.name, "status");

  let records = s.query("users", None).await.unwrap();
  assert_eq!(records[0].get("status"), Some(&Value::from("ok")));
}

#[tokio::test]
async fn rename_column_error_cases() {
  let s = store().await;
  s.create_table("users").await.unwrap();
  s.add_columns(
    "users",
    vec![
      ("name".to_owned(), ValueType::Text),
      ("email".to_owned(), ValueType::Text),
    ],
  )
  .await
  .unwrap();

  let err = s
    .rename_column("users", "missing", "anything")
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));

  let err = s.rename_column("users", "name", "email").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnExists { .. })
  ));

  let err = s.rename_column("users", "name", "row_id").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::NameProtected(_))
  ));
}

// ─── Insert & query ──────────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_with_predeclared_columns() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_columns(
    "t",
    vec![
      ("a".to_owned(), ValueType::Text),
      ("b".to_owned(), ValueType::Integer),
    ],
  )
  .await
  .unwrap();

  let row = s
    .insert(
      "t",
      record(&[("a", Value::from("x")), ("b", Value::Int(5))]),
      None,
    )
    .await
    .unwrap();

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].row_id, row);
  assert_eq!(records[0].get("a"), Some(&Value::from("x")));
  assert_eq!(records[0].get("b"), Some(&Value::Int(5)));
}

#[tokio::test]
async fn round_trip_with_auto_created_columns() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  s.insert(
    "t",
    record(&[("a", Value::from("x")), ("b", Value::Int(5))]),
    None,
  )
  .await
  .unwrap();

  let columns = s.list_columns("t", false).await.unwrap();
  let specs: Vec<_> = columns
    .iter()
    .map(|c| (c.name.as_str(), c.data_type))
    .collect();
  assert_eq!(
    specs,
    [("a", ValueType::Text), ("b", ValueType::Integer)]
  );

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("a"), Some(&Value::from("x")));
  assert_eq!(records[0].get("b"), Some(&Value::Int(5)));
}

#[tokio::test]
async fn single_pair_insert_and_distinct_auto_ids() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  let first = s
    .insert("t", record(&[("email", Value::from("a@example.com"))]), None)
    .await
    .unwrap();
  let second = s
    .insert("t", record(&[("email", Value::from("b@example.com"))]), None)
    .await
    .unwrap();

  // No central sequence: independent inserts still get distinct rows.
  assert_ne!(first, second);
  assert_eq!(s.query("t", None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn explicit_id_builds_rows_column_by_column() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  let id = RowId::generate();
  s.insert("t", record(&[("a", Value::from("x"))]), Some(id))
    .await
    .unwrap();
  // A different column for the same row merges into it.
  s.insert("t", record(&[("b", Value::Int(1))]), Some(id))
    .await
    .unwrap();

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("a"), Some(&Value::from("x")));
  assert_eq!(records[0].get("b"), Some(&Value::Int(1)));

  // The same cell again is a duplicate under strict insert.
  let err = s
    .insert("t", record(&[("a", Value::from("y"))]), Some(id))
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::DuplicateValue { .. })
  ));
  assert_eq!(s.get_current("t", id, "a").await.unwrap(), Some(Value::from("x")));
}

#[tokio::test]
async fn insert_rejects_protected_column_names() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  let err = s
    .insert("t", record(&[("row_id", Value::from("boom"))]), None)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::NameProtected(_))
  ));
}

#[tokio::test]
async fn type_mismatch_writes_nothing() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_column("t", "n", ValueType::Integer).await.unwrap();

  let err = s
    .insert(
      "t",
      record(&[("n", Value::from("abc")), ("extra", Value::Int(1))]),
      None,
    )
    .await
    .unwrap_err();
  let msg = err.to_string();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::TypeMismatch { .. })
  ));
  assert!(msg.contains("abc") && msg.contains("integer"), "got {msg:?}");

  // The whole operation rolled back: no row, and no auto-created column.
  assert!(s.query("t", None).await.unwrap().is_empty());
  let names: Vec<_> = s
    .list_columns("t", true)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, ["n"]);
}

#[tokio::test]
async fn null_cells_round_trip() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_column("t", "maybe", ValueType::Integer).await.unwrap();

  s.insert("t", record(&[("maybe", Value::Null)]), None)
    .await
    .unwrap();

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records[0].get("maybe"), Some(&Value::Null));
}

// ─── View completeness ───────────────────────────────────────────────────────

#[tokio::test]
async fn products_scenario() {
  let s = store().await;
  s.create_table("products").await.unwrap();
  s.add_columns(
    "products",
    vec![
      ("name".to_owned(), ValueType::Text),
      ("price".to_owned(), ValueType::Real),
    ],
  )
  .await
  .unwrap();

  s.insert(
    "products",
    record(&[("name", Value::from("Widget")), ("price", Value::Float(19.99))]),
    None,
  )
  .await
  .unwrap();

  let records = s.query("products", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("name"), Some(&Value::from("Widget")));
  assert_eq!(records[0].get("price"), Some(&Value::Float(19.99)));

  // The very next query after a column add must see the column.
  s.add_column("products", "qty", ValueType::Integer)
    .await
    .unwrap();
  let records = s.query("products", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("qty"), Some(&Value::Null));
  assert_eq!(records[0].get("price"), Some(&Value::Float(19.99)));
}

#[tokio::test]
async fn query_filter_and_unknown_column() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.insert("t", record(&[("b", Value::Int(5))]), None)
    .await
    .unwrap();
  s.insert("t", record(&[("b", Value::Int(7))]), None)
    .await
    .unwrap();

  let hits = s.query("t", Some("b = 5")).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].get("b"), Some(&Value::Int(5)));

  // Filters may not reference columns outside the active set.
  let err = s.query("t", Some("ghost = 1")).await.unwrap_err();
  assert!(
    matches!(
      core_err(&err),
      Some(weft_core::Error::ColumnNotFound { column, .. }) if column == "ghost"
    ),
    "got {err:?}"
  );
}

// ─── Versioning ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn version_numbers_are_monotonic_with_one_current() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  let id = RowId::generate();

  for k in 1..=3 {
    s.upsert(
      "t",
      record(&[("counter", Value::Int(k))]),
      UpsertKey::RowId(id),
    )
    .await
    .unwrap();
  }

  let history = s.get_history("t", id, "counter").await.unwrap();
  assert_eq!(history.len(), 3);
  for (i, entry) in history.iter().enumerate() {
    assert_eq!(entry.version, i as i64 + 1);
    assert_eq!(entry.value, Value::Int(i as i64 + 1));
    assert_eq!(entry.is_current, i == 2);
    // Superseded entries are stamped; the current one is not.
    assert_eq!(entry.updated_at.is_some(), i != 2);
  }

  assert_eq!(
    s.get_current("t", id, "counter").await.unwrap(),
    Some(Value::Int(3))
  );
}

#[tokio::test]
async fn get_current_missing_cell_is_none() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_column("t", "a", ValueType::Text).await.unwrap();

  let current = s
    .get_current("t", RowId::generate(), "a")
    .await
    .unwrap();
  assert_eq!(current, None);
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_by_row_id_updates_or_creates() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  let id = RowId::generate();

  // Not found: behaves like insert.
  s.upsert("t", record(&[("a", Value::Int(1))]), UpsertKey::RowId(id))
    .await
    .unwrap();
  // Found: writes a new version over the same row.
  s.upsert("t", record(&[("a", Value::Int(2))]), UpsertKey::RowId(id))
    .await
    .unwrap();

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("a"), Some(&Value::Int(2)));
}

#[tokio::test]
async fn upsert_by_key_columns() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  let first = s
    .upsert(
      "t",
      record(&[("k", Value::from("v1")), ("val", Value::Int(1))]),
      UpsertKey::Columns(vec!["k".to_owned()]),
    )
    .await
    .unwrap();
  let second = s
    .upsert(
      "t",
      record(&[("k", Value::from("v1")), ("val", Value::Int(2))]),
      UpsertKey::Columns(vec!["k".to_owned()]),
    )
    .await
    .unwrap();

  assert_eq!(first, second);
  let records = s.query("t", None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].get("val"), Some(&Value::Int(2)));

  let history = s.get_history("t", first, "val").await.unwrap();
  assert_eq!(history.len(), 2);

  // A different key value starts a new row.
  s.upsert(
    "t",
    record(&[("k", Value::from("v2")), ("val", Value::Int(9))]),
    UpsertKey::Columns(vec!["k".to_owned()]),
  )
  .await
  .unwrap();
  assert_eq!(s.query("t", None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn upsert_ambiguous_key_errors() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.insert("t", record(&[("k", Value::from("dup"))]), None)
    .await
    .unwrap();
  s.insert("t", record(&[("k", Value::from("dup"))]), None)
    .await
    .unwrap();

  let err = s
    .upsert(
      "t",
      record(&[("k", Value::from("dup")), ("val", Value::Int(1))]),
      UpsertKey::Columns(vec!["k".to_owned()]),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::AmbiguousKey { .. })
  ));
}

#[tokio::test]
async fn upsert_key_must_be_in_data() {
  let s = store().await;
  s.create_table("t").await.unwrap();

  let err = s
    .upsert(
      "t",
      record(&[("val", Value::Int(1))]),
      UpsertKey::Columns(vec!["k".to_owned()]),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::KeyColumnMissing(_))
  ));
}

// ─── Soft & hard column deletion ─────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_hides_column_but_keeps_history() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  let row = s
    .insert(
      "t",
      record(&[("keep", Value::Int(1)), ("drop_me", Value::from("old"))]),
      None,
    )
    .await
    .unwrap();

  s.delete_column("t", "drop_me", DeleteMode::Soft)
    .await
    .unwrap();

  let active: Vec<_> = s
    .list_columns("t", false)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(active, ["keep"]);

  let all = s.list_columns("t", true).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().any(|c| c.name == "drop_me" && !c.lifecycle.is_active()));

  // Gone from the projection...
  let records = s.query("t", None).await.unwrap();
  assert_eq!(records[0].get("drop_me"), None);
  // ...and from filters...
  let err = s.query("t", Some("drop_me = 'old'")).await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));
  // ...but its history is retained.
  let history = s.get_history("t", row, "drop_me").await.unwrap();
  assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn hard_delete_purges_history() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  let row = s
    .insert("t", record(&[("temp", Value::from("data"))]), None)
    .await
    .unwrap();

  s.delete_column("t", "temp", DeleteMode::Hard).await.unwrap();

  let err = s.get_history("t", row, "temp").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));
  let err = s.get_current("t", row, "temp").await.unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));

  // Not even the deleted listing remembers it.
  assert!(s.list_columns("t", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn hard_delete_accepts_soft_deleted_column() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.insert("t", record(&[("temp", Value::Int(1))]), None)
    .await
    .unwrap();

  s.delete_column("t", "temp", DeleteMode::Soft).await.unwrap();
  s.delete_column("t", "temp", DeleteMode::Hard).await.unwrap();
  assert!(s.list_columns("t", true).await.unwrap().is_empty());

  // Soft-deleting twice, though, is a miss.
  s.insert("t", record(&[("other", Value::Int(1))]), None)
    .await
    .unwrap();
  s.delete_column("t", "other", DeleteMode::Soft).await.unwrap();
  let err = s
    .delete_column("t", "other", DeleteMode::Soft)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(&err),
    Some(weft_core::Error::ColumnNotFound { .. })
  ));
}

// ─── Typed storage layering ──────────────────────────────────────────────────

#[tokio::test]
async fn boolean_and_json_round_trip_through_shared_partitions() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_columns(
    "t",
    vec![
      ("active".to_owned(), ValueType::Boolean),
      ("meta".to_owned(), ValueType::Json),
    ],
  )
  .await
  .unwrap();

  s.insert(
    "t",
    record(&[
      ("active", Value::Bool(true)),
      ("meta", Value::Json(serde_json::json!({"tags": ["a", "b"]}))),
    ]),
    None,
  )
  .await
  .unwrap();

  let records = s.query("t", None).await.unwrap();
  assert_eq!(records[0].get("active"), Some(&Value::Bool(true)));
  assert_eq!(
    records[0].get("meta"),
    Some(&Value::Json(serde_json::json!({"tags": ["a", "b"]})))
  );
}

#[tokio::test]
async fn timestamp_strings_coerce_into_timestamp_columns() {
  let s = store().await;
  s.create_table("t").await.unwrap();
  s.add_column("t", "due", ValueType::Timestamp).await.unwrap();

  s.insert("t", record(&[("due", Value::from("2023-12-25"))]), None)
    .await
    .unwrap();

  let records = s.query("t", None).await.unwrap();
  match records[0].get("due") {
    Some(Value::Timestamp(dt)) => {
      assert_eq!(dt.to_rfc3339(), "2023-12-25T00:00:00+00:00");
    }
    other => panic!("expected timestamp, got {other:?}"),
  }
}

// ─── Bulk bootstrap ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_table_from_rows_infers_and_loads() {
  let s = store().await;

  let rows = vec![
    record(&[
      ("name", Value::from("Widget")),
      ("price", Value::Float(19.99)),
      ("qty", Value::Int(3)),
    ]),
    record(&[
      ("name", Value::from("Gadget")),
      ("price", Value::Float(5.25)),
    ]),
  ];
  s.create_table_from_rows("products", rows).await.unwrap();

  let specs: Vec<_> = s
    .list_columns("products", false)
    .await
    .unwrap()
    .into_iter()
    .map(|c| (c.name, c.data_type))
    .collect();
  assert_eq!(
    specs,
    [
      ("name".to_owned(), ValueType::Text),
      ("price".to_owned(), ValueType::Real),
      ("qty".to_owned(), ValueType::Integer),
    ]
  );

  let records = s.query("products", None).await.unwrap();
  assert_eq!(records.len(), 2);
  let gadget = records
    .iter()
    .find(|r| r.get("name") == Some(&Value::from("Gadget")))
    .expect("gadget row");
  assert_eq!(gadget.get("qty"), Some(&Value::Null));
}
