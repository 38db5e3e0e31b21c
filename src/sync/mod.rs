//! Schema synchronization: converge a live MySQL table toward the declarative
//! field schema. Additive only; columns and indexes that exist live but are no
//! longer declared are left untouched.

mod plan;

pub use plan::{
    build_plan, column_sql_type, LiveColumn, LiveConstraint, LiveIndex, LiveMetadata, SyncInputs,
    SyncPlan, PLACEHOLDER_COLUMN,
};

use serde_json::Value;
use sqlx::Row;

use crate::error::StoreError;
use crate::request::Record;
use crate::schema::ResourceRegistry;
use crate::sql::{quoted, record_from_row};
use crate::store::SqlStore;

fn text_cell(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn u64_cell(record: &Record, key: &str) -> u64 {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

async fn load_live_metadata(store: &SqlStore) -> Result<LiveMetadata, StoreError> {
    let column_rows = sqlx::query(
        "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_KEY, EXTRA \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
         ORDER BY ORDINAL_POSITION",
    )
    .bind(store.table())
    .fetch_all(store.pool())
    .await?;
    let columns = column_rows
        .iter()
        .map(|row| {
            let record = record_from_row(row);
            LiveColumn {
                name: text_cell(&record, "COLUMN_NAME"),
                column_type: text_cell(&record, "COLUMN_TYPE"),
                nullable: text_cell(&record, "IS_NULLABLE") == "YES",
                primary_key: text_cell(&record, "COLUMN_KEY") == "PRI",
                auto_increment: text_cell(&record, "EXTRA").contains("auto_increment"),
            }
        })
        .collect();

    let index_rows = sqlx::query(&format!("SHOW INDEX FROM {}", quoted(store.table())))
        .fetch_all(store.pool())
        .await?;
    let indexes = index_rows
        .iter()
        .map(|row| {
            let record = record_from_row(row);
            LiveIndex {
                key_name: text_cell(&record, "Key_name"),
                column_name: text_cell(&record, "Column_name"),
                seq_in_index: u64_cell(&record, "Seq_in_index"),
            }
        })
        .collect();

    let constraint_rows = sqlx::query(
        "SELECT CONSTRAINT_NAME \
         FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind(store.table())
    .fetch_all(store.pool())
    .await?;
    let constraints = constraint_rows
        .iter()
        .map(|row| {
            let name: String = row.try_get("CONSTRAINT_NAME").unwrap_or_default();
            LiveConstraint { name }
        })
        .collect();

    Ok(LiveMetadata {
        columns,
        indexes,
        constraints,
    })
}

/// Create the table if missing, then diff and apply. Safe to run on every
/// startup; a converged table only gets no-op column restatements.
pub async fn sync_schema(
    store: &SqlStore,
    registry: &ResourceRegistry,
) -> Result<(), StoreError> {
    let exists = sqlx::query("SHOW TABLES LIKE ?")
        .bind(store.table())
        .fetch_optional(store.pool())
        .await?
        .is_some();
    if !exists {
        let create = format!(
            "CREATE TABLE {} ({} INT(1))",
            quoted(store.table()),
            quoted(PLACEHOLDER_COLUMN)
        );
        tracing::debug!(table = store.table(), sql = %create, "creating table");
        sqlx::query(&create).execute(store.pool()).await?;
    }

    let live = load_live_metadata(store).await?;
    let inputs = SyncInputs {
        table: store.table(),
        id_field: store.id_field(),
        schema: store.schema(),
        extra_indexes: store.extra_indexes(),
        registry,
    };
    let plan = build_plan(&inputs, &live)?;
    for statement in plan.statements() {
        tracing::debug!(table = store.table(), sql = %statement, "applying schema change");
        sqlx::query(statement).execute(store.pool()).await?;
    }
    Ok(())
}
