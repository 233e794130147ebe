//! End-to-end tour of the store: schema-on-write, upserts, history, and the
//! generated projection.
//!
//! ```sh
//! cargo run -p weft-store-sqlite --example demo
//! ```

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weft_core::{
  store::{TableStore, UpsertKey},
  value::{Value, ValueType},
};
use weft_store_sqlite::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let store = SqliteStore::open_in_memory().await?;

  // A table starts empty; columns appear as data does.
  store.create_table("products").await?;
  store
    .insert(
      "products",
      vec![
        ("name".to_owned(), Value::from("Widget")),
        ("price".to_owned(), Value::Float(19.99)),
      ],
      None,
    )
    .await?;

  // Schema can also be declared up front.
  store
    .add_column("products", "qty", ValueType::Integer)
    .await?;

  // Upsert keyed on a column: second call writes a new version, not a row.
  for qty in [5_i64, 8] {
    store
      .upsert(
        "products",
        vec![
          ("name".to_owned(), Value::from("Widget")),
          ("qty".to_owned(), Value::Int(qty)),
        ],
        UpsertKey::Columns(vec!["name".to_owned()]),
      )
      .await?;
  }

  for rec in store.query("products", None).await? {
    println!("{} @ {}", rec.row_id, rec.created_at);
    for (column, value) in &rec.values {
      println!("  {column} = {value}");
    }
  }

  let rec = &store.query("products", Some("qty = 8")).await?[0];
  let history = store.get_history("products", rec.row_id, "qty").await?;
  println!(
    "qty went through {} versions: {:?}",
    history.len(),
    history.iter().map(|v| &v.value).collect::<Vec<_>>()
  );

  Ok(())
}
