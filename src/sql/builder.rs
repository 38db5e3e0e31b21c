//! Builds the parameterized statement shapes: select-one, paged select with a
//! sibling count, insert, update, and multi-table delete.
//!
//! Identifiers (table and column names) come from trusted schema/configuration
//! and are quoted inline; caller-supplied values are never interpolated — they
//! are always bound parameters.

use crate::request::{Record, SortDirection};
use serde_json::Value;

/// SQL text plus the bound parameters it carries so far.
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quote an identifier with MySQL backticks.
pub fn quoted(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Table-qualified, quoted column reference.
pub fn qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quoted(table), quoted(column))
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn join_clause(joins: &[String]) -> String {
    if joins.is_empty() {
        String::new()
    } else {
        format!(" {}", joins.join(" "))
    }
}

/// `SELECT <fields> FROM <table> <joins> [WHERE ...]` — the fetch shape.
pub fn select(table: &str, fields: &[String], joins: &[String], conditions: &[String]) -> String {
    format!(
        "SELECT {} FROM {}{}{}",
        fields.join(", "),
        quoted(table),
        join_clause(joins),
        where_clause(conditions)
    )
}

/// Paged select plus its sibling count query. The count shares joins and
/// conditions (and therefore arguments) but carries no sort or pagination.
pub fn select_page(
    table: &str,
    fields: &[String],
    joins: &[String],
    conditions: &[String],
    sort: &[String],
) -> (String, String) {
    let order = if sort.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", sort.join(", "))
    };
    let full = format!(
        "SELECT {} FROM {}{}{}{} LIMIT ?, ?",
        fields.join(", "),
        quoted(table),
        join_clause(joins),
        where_clause(conditions),
        order
    );
    let count = format!(
        "SELECT COUNT(*) AS grand_total FROM {}{}{}",
        quoted(table),
        join_clause(joins),
        where_clause(conditions)
    );
    (full, count)
}

/// Single-row insert: the value map expands into a quoted column list and one
/// placeholder per value.
pub fn insert(table: &str, record: &Record) -> SqlQuery {
    let mut cols = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (name, value) in record {
        cols.push(quoted(name));
        placeholders.push("?");
        params.push(value.clone());
    }
    SqlQuery {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(table),
            cols.join(", "),
            placeholders.join(", ")
        ),
        params,
    }
}

/// `UPDATE <table> <joins> SET <map> [WHERE ...]`. Set-value parameters come
/// first; the caller appends its condition arguments after them.
pub fn update(table: &str, record: &Record, joins: &[String], conditions: &[String]) -> SqlQuery {
    let mut sets = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (name, value) in record {
        sets.push(format!("{} = ?", quoted(name)));
        params.push(value.clone());
    }
    SqlQuery {
        sql: format!(
            "UPDATE {}{} SET {}{}",
            quoted(table),
            join_clause(joins),
            sets.join(", "),
            where_clause(conditions)
        ),
        params,
    }
}

/// Multi-table delete: `DELETE <tables> FROM <table> <joins> [WHERE ...]`.
/// The explicit `tables` list names which joined tables lose rows.
pub fn delete(tables: &[String], table: &str, joins: &[String], conditions: &[String]) -> String {
    let targets: Vec<String> = tables.iter().map(|t| quoted(t)).collect();
    format!(
        "DELETE {} FROM {}{}{}",
        targets.join(", "),
        quoted(table),
        join_clause(joins),
        where_clause(conditions)
    )
}

/// Render ORDER BY terms, qualifying bare field names with the owning table.
/// Already-qualified names keep their qualifier.
pub fn order_by(table: &str, sort: &[(String, SortDirection)]) -> Vec<String> {
    sort.iter()
        .map(|(field, direction)| {
            let column = match field.split_once('.') {
                Some((t, c)) => qualified(t, c),
                None => qualified(table, field),
            };
            format!("{} {}", column, direction.as_sql())
        })
        .collect()
}
