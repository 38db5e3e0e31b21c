//! Decode MySQL rows into field → scalar JSON records.

use crate::request::Record;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row};

/// Convert a row into a record keyed by result-set column name.
pub fn record_from_row(row: &MySqlRow) -> Record {
    let mut record = Record::new();
    for col in row.columns() {
        let name = col.name();
        record.insert(name.to_string(), cell_to_value(row, name));
    }
    record
}

fn cell_to_value(row: &MySqlRow, name: &str) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = v {
            if let Some(n) = serde_json::Number::from_f64(n) {
                return Value::Number(n);
            }
        }
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        if let Some(b) = v {
            return Value::Bool(b);
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.to_rfc3339());
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        if let Some(s) = v {
            return Value::String(s);
        }
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(name) {
        if let Some(j) = v {
            return j;
        }
    }
    // BLOB columns: keep printable content, drop the rest.
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(name) {
        if let Some(bytes) = v {
            if let Ok(s) = String::from_utf8(bytes) {
                return Value::String(s);
            }
        }
    }
    Value::Null
}
