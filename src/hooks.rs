//! Extension hook protocol: one typed method per hook, all defaulting to
//! permissive/empty behavior. A store composes its capability set by
//! implementing only the hooks it needs.

use crate::error::StoreError;
use crate::request::{Record, Request};
use crate::store::SqlStore;
use async_trait::async_trait;
use serde_json::Value;

/// Projection and join overrides for a read operation.
#[derive(Clone, Debug, Default)]
pub struct FieldsAndJoins {
    pub fields: Vec<String>,
    /// Each entry is a self-contained join clause,
    /// e.g. `LEFT JOIN authors ON authors.id = books.author_id`.
    pub joins: Vec<String>,
}

/// WHERE fragments and their bound arguments, kept in lockstep.
#[derive(Clone, Debug, Default)]
pub struct Conditions {
    pub conditions: Vec<String>,
    pub args: Vec<Value>,
}

impl Conditions {
    pub fn extend(&mut self, other: Conditions) {
        self.conditions.extend(other.conditions);
        self.args.extend(other.args);
    }
}

/// Delete targets: which tables lose rows, and the joins reaching them.
#[derive(Clone, Debug, Default)]
pub struct TablesAndJoins {
    pub tables: Vec<String>,
    pub joins: Vec<String>,
}

/// Rendered ORDER BY terms plus any arguments they bind.
#[derive(Clone, Debug, Default)]
pub struct SortSpec {
    pub sort: Vec<String>,
    pub args: Vec<Value>,
}

/// Which read flow a transform is running under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Fetch,
    Query,
}

/// Result payload handed to the transform hook.
#[derive(Clone, Debug)]
pub enum ResultSet {
    One(Record),
    Many(Vec<Record>),
}

/// Overridable extension points consulted by the lifecycle controller.
///
/// Every method has a permissive default, so an implementation overrides only
/// what it needs. Hooks receive the owning store for access to the pool, the
/// schema, and the condition/sort helpers.
#[async_trait]
pub trait StoreHooks: Send + Sync {
    async fn fetch_fields_and_joins(&self, store: &SqlStore, _req: &Request) -> FieldsAndJoins {
        store.common_fields_and_joins()
    }

    async fn query_fields_and_joins(&self, store: &SqlStore, _req: &Request) -> FieldsAndJoins {
        store.common_fields_and_joins()
    }

    async fn fetch_conditions_and_args(&self, _store: &SqlStore, _req: &Request) -> Conditions {
        Conditions::default()
    }

    /// Default: search conditions derived from the request's conditions hash
    /// over searchable schema fields.
    async fn query_conditions_and_args(&self, store: &SqlStore, req: &Request) -> Conditions {
        store.options_conditions_and_args(req)
    }

    async fn query_sort(&self, store: &SqlStore, req: &Request) -> SortSpec {
        store.options_sort(req)
    }

    async fn update_joins(&self, _store: &SqlStore, _req: &Request) -> Vec<String> {
        Vec::new()
    }

    async fn update_conditions_and_args(&self, _store: &SqlStore, _req: &Request) -> Conditions {
        Conditions::default()
    }

    async fn delete_tables_and_joins(&self, store: &SqlStore, _req: &Request) -> TablesAndJoins {
        TablesAndJoins {
            tables: vec![store.table().to_string()],
            joins: Vec::new(),
        }
    }

    async fn delete_conditions_and_args(&self, _store: &SqlStore, _req: &Request) -> Conditions {
        Conditions::default()
    }

    /// Shape the row-value map before insert (strip fields, add computed ones).
    async fn prepare_insert_record(
        &self,
        _store: &SqlStore,
        _req: &Request,
        record: Record,
    ) -> Result<Record, StoreError> {
        Ok(record)
    }

    /// Shape the row-value map before update.
    async fn prepare_update_record(
        &self,
        _store: &SqlStore,
        _req: &Request,
        record: Record,
    ) -> Result<Record, StoreError> {
        Ok(record)
    }

    /// Side-effect point after insert (e.g. related-table writes); sees the
    /// re-fetched canonical record in `req.record`.
    async fn after_insert(&self, _store: &SqlStore, _req: &mut Request) -> Result<(), StoreError> {
        Ok(())
    }

    async fn after_update(&self, _store: &SqlStore, _req: &mut Request) -> Result<(), StoreError> {
        Ok(())
    }

    async fn after_delete(&self, _store: &SqlStore, _req: &mut Request) -> Result<(), StoreError> {
        Ok(())
    }

    /// Record-level authorization, invoked after the fetched record has been
    /// placed in `req.record` (which may be `None`).
    async fn check_fetch_permissions(
        &self,
        _store: &SqlStore,
        _req: &Request,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    /// Cross-cutting result transform. Return `Some` to replace the result;
    /// `None` leaves it untouched. Query results are only replaced when the
    /// returned set is non-empty.
    async fn transform_result(
        &self,
        _store: &SqlStore,
        _req: &Request,
        _op: OpKind,
        _data: &ResultSet,
    ) -> Result<Option<ResultSet>, StoreError> {
        Ok(None)
    }
}

/// Hook set with every default left in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHooks;

#[async_trait]
impl StoreHooks for DefaultHooks {}
