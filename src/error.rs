//! Typed errors: fatal configuration errors vs passthrough backend errors.

use thiserror::Error;

/// Raised synchronously, before any I/O. Never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("store table name must not be empty")]
    MissingTable,
    #[error("identifier field '{0}' is not in the schema")]
    UnknownIdField(String),
    #[error("position field '{0}' is not in the schema")]
    UnknownPositionField(String),
    #[error("position filter field '{0}' is not in the schema")]
    UnknownPositionFilterField(String),
    #[error("fields '{first}' and '{second}' are both auto-increment; only one is allowed")]
    DuplicateAutoIncrement { first: String, second: String },
    #[error("field '{field}': type '{type_name}' has no SQL mapping; set db_type")]
    UnmappedType { field: String, type_name: String },
    #[error("field '{field}': foreign key names neither a target table nor a registered resource")]
    IncompleteForeignKey { field: String },
    #[error("field '{field}': foreign key resource '{resource}' is not registered")]
    UnresolvedResource { field: String, resource: String },
}

/// Backend errors pass through unmodified; this layer adds no retry, no
/// suppression, and no rewording of driver detail.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
