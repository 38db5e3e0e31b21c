//! CRUD Lifecycle Controller: the five end-to-end flows over the SQL builders,
//! the position algorithm, and the hook protocol. Backend errors propagate
//! unmodified; a missing row is a `None`, never an error.

use crate::error::StoreError;
use crate::hooks::{OpKind, ResultSet};
use crate::request::{BeforeId, Record, Request};
use crate::sql::{self, qualified, record_from_row, BindValue};
use crate::store::SqlStore;
use serde::Serialize;
use serde_json::Value;

const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 1000;

/// Collection result: one page of records plus the unpaged match count.
/// Serializes directly as the `{data, grand_total}` envelope.
#[derive(Clone, Debug, Serialize)]
pub struct QueryResult {
    pub data: Vec<Record>,
    pub grand_total: i64,
}

impl SqlStore {
    /// Fetch a single record scoped by the request params. Absence is a valid
    /// outcome. The permission hook runs after the record is loaded, so
    /// record-level authorization can inspect the data.
    pub async fn fetch(&self, req: &mut Request) -> Result<Option<Record>, StoreError> {
        let hooks = self.hooks();
        let fj = hooks.fetch_fields_and_joins(self, req).await;
        let mut conditions = hooks.fetch_conditions_and_args(self, req).await;
        conditions.extend(self.params_conditions(req));

        let sql = sql::select(self.table(), &fj.fields, &fj.joins, &conditions.conditions);
        tracing::debug!(sql = %sql, params = ?conditions.args, "fetch");
        let mut query = sqlx::query(&sql);
        for arg in &conditions.args {
            query = query.bind(BindValue::from_json(arg));
        }
        let row = query.fetch_optional(self.pool()).await?;
        req.record = row.as_ref().map(record_from_row);

        hooks.check_fetch_permissions(self, req).await?;

        let mut record = req.record.clone();
        if let Some(found) = &record {
            let transformed = hooks
                .transform_result(self, req, OpKind::Fetch, &ResultSet::One(found.clone()))
                .await?;
            if let Some(ResultSet::One(t)) = transformed {
                record = Some(t);
            }
        }
        Ok(record)
    }

    /// Query a collection: hook conditions plus mandatory param conditions,
    /// hook sort falling back to the position field, skip/limit pagination,
    /// and a sibling count sharing the same conditions.
    pub async fn query(&self, req: &mut Request) -> Result<QueryResult, StoreError> {
        let hooks = self.hooks();
        let fj = hooks.query_fields_and_joins(self, req).await;
        let mut conditions = hooks.query_conditions_and_args(self, req).await;
        let sort_spec = hooks.query_sort(self, req).await;
        conditions.extend(self.params_conditions(req));

        let mut sort = sort_spec.sort;
        if sort.is_empty() {
            if let Some(position_field) = self.position_field() {
                sort.push(qualified(self.table(), position_field));
            }
        }

        let (full, count) = sql::select_page(
            self.table(),
            &fj.fields,
            &fj.joins,
            &conditions.conditions,
            &sort,
        );

        let limit = req.options.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let mut page_args = conditions.args.clone();
        page_args.extend(sort_spec.args);
        page_args.push(Value::from(req.options.skip));
        page_args.push(Value::from(limit));

        tracing::debug!(sql = %full, params = ?page_args, "query");
        let mut query = sqlx::query(&full);
        for arg in &page_args {
            query = query.bind(BindValue::from_json(arg));
        }
        let rows = query.fetch_all(self.pool()).await?;
        let mut data: Vec<Record> = rows.iter().map(record_from_row).collect();

        tracing::debug!(sql = %count, params = ?conditions.args, "query count");
        let mut count_query = sqlx::query(&count);
        for arg in &conditions.args {
            count_query = count_query.bind(BindValue::from_json(arg));
        }
        let count_row = count_query.fetch_one(self.pool()).await?;
        let grand_total = record_from_row(&count_row)
            .get("grand_total")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        if !data.is_empty() {
            let transformed = hooks
                .transform_result(self, req, OpKind::Query, &ResultSet::Many(data.clone()))
                .await?;
            if let Some(ResultSet::Many(t)) = transformed {
                if !t.is_empty() {
                    data = t;
                }
            }
        }

        Ok(QueryResult { data, grand_total })
    }

    /// Insert a record and return its canonical state, re-fetched by the
    /// generated identifier so server-computed defaults and joins are present.
    pub async fn insert(&self, req: &mut Request) -> Result<Option<Record>, StoreError> {
        let hooks = self.hooks();
        self.calculate_position(req).await?;

        let record = hooks
            .prepare_insert_record(self, req, req.body.clone())
            .await?;
        let q = sql::insert(self.table(), &record);
        tracing::debug!(sql = %q.sql, params = ?q.params, "insert");
        let mut query = sqlx::query(&q.sql);
        for param in &q.params {
            query = query.bind(BindValue::from_json(param));
        }
        let result = query.execute(self.pool()).await?;

        // Generated key; a non-auto-increment identifier comes from the body.
        let id = match result.last_insert_id() {
            0 => record.get(self.id_field()).cloned().unwrap_or(Value::Null),
            generated => Value::from(generated),
        };
        let mut refetch = Request::new().with_param(self.id_field(), id);
        req.record = self.fetch(&mut refetch).await?;

        hooks.after_insert(self, req).await?;
        self.restore_before_id(req);
        Ok(req.record.clone())
    }

    /// Update the addressed record and return its re-fetched canonical state.
    /// Param-derived conditions always scope the statement.
    pub async fn update(&self, req: &mut Request) -> Result<Option<Record>, StoreError> {
        let hooks = self.hooks();
        self.calculate_position(req).await?;

        let record = hooks
            .prepare_update_record(self, req, req.body.clone())
            .await?;
        let joins = hooks.update_joins(self, req).await;
        let mut conditions = hooks.update_conditions_and_args(self, req).await;
        conditions.extend(self.params_conditions(req));

        let q = sql::update(self.table(), &record, &joins, &conditions.conditions);
        tracing::debug!(sql = %q.sql, params = ?q.params, "update");
        let mut query = sqlx::query(&q.sql);
        for param in &q.params {
            query = query.bind(BindValue::from_json(param));
        }
        for arg in &conditions.args {
            query = query.bind(BindValue::from_json(arg));
        }
        query.execute(self.pool()).await?;

        req.original_record = req.record.take();
        let fetched = self.fetch(req).await?;
        req.record = fetched;

        hooks.after_update(self, req).await?;
        self.restore_before_id(req);
        Ok(req.record.clone())
    }

    /// Delete the addressed record(s); the multi-table form lets joined rows
    /// cascade in the same statement. No re-fetch: the resource is gone.
    pub async fn delete(&self, req: &mut Request) -> Result<(), StoreError> {
        let hooks = self.hooks();
        let tj = hooks.delete_tables_and_joins(self, req).await;
        let mut conditions = hooks.delete_conditions_and_args(self, req).await;
        conditions.extend(self.params_conditions(req));

        let sql = sql::delete(&tj.tables, self.table(), &tj.joins, &conditions.conditions);
        tracing::debug!(sql = %sql, params = ?conditions.args, "delete");
        let mut query = sqlx::query(&sql);
        for arg in &conditions.args {
            query = query.bind(BindValue::from_json(arg));
        }
        query.execute(self.pool()).await?;

        hooks.after_delete(self, req).await?;
        Ok(())
    }

    /// Put the caller's anchor back on the result record so round-tripping
    /// clients see the placement they asked for.
    fn restore_before_id(&self, req: &mut Request) {
        if self.position_field().is_none() {
            return;
        }
        let anchor = match &req.before_id {
            BeforeId::Unspecified => return,
            BeforeId::Last => Value::Null,
            BeforeId::Before(id) => id.clone(),
        };
        if let Some(record) = req.record.as_mut() {
            record.insert("before_id".to_string(), anchor);
        }
    }
}
