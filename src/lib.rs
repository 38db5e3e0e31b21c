//! Relational data-access engine for JSON-shaped records over MySQL.
//!
//! A [`SqlStore`] owns a table, its declarative [`schema::FieldSchema`], and a
//! set of [`hooks::StoreHooks`] that shape every operation's SQL. On top of
//! that it offers:
//!
//! - CRUD with per-operation hook points ([`SqlStore::fetch`],
//!   [`SqlStore::query`], [`SqlStore::insert`], [`SqlStore::update`],
//!   [`SqlStore::delete`])
//! - transparent ordered-position maintenance via an integer position column
//! - startup schema synchronization ([`sync::sync_schema`]) that converges the
//!   live table toward the declared schema, additively
//!
//! Records are dynamic `serde_json` maps; values are bound as placeholders,
//! never interpolated. The connection pool is plain `sqlx::MySqlPool`, injected
//! at construction.

pub mod crud;
pub mod error;
pub mod hooks;
pub mod request;
pub mod schema;
pub mod sql;
pub mod store;
pub mod sync;

mod position;

pub use crud::QueryResult;
pub use error::{ConfigError, StoreError};
pub use hooks::{
    Conditions, DefaultHooks, FieldsAndJoins, OpKind, ResultSet, SortSpec, StoreHooks,
    TablesAndJoins,
};
pub use request::{BeforeId, QueryOptions, Record, Request, SortDirection};
pub use schema::{
    FieldDef, FieldSchema, FieldType, ForeignKeyRef, IndexSpec, ResourceRegistry, ResourceTarget,
};
pub use sql::{BindValue, SqlQuery};
pub use store::{SqlStore, StoreSpec};
pub use sync::sync_schema;
