//! Request context: one instance per inbound operation, discarded afterwards.

use serde_json::{Map, Value};

/// A record is a plain field → scalar value snapshot, never a mapped object.
pub type Record = Map<String, Value>;

/// Placement instruction for ordered stores. Mirrors the caller's tri-state
/// anchor: no instruction, explicit "append", or "move before this record".
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BeforeId {
    /// No move requested: keep the current position, or append if there is none.
    #[default]
    Unspecified,
    /// Append to the end of the record's position group.
    Last,
    /// Move before the record with this identifier; a stale or foreign
    /// identifier degrades to `Last`.
    Before(Value),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Collection-query options: exact/search conditions, sort, pagination.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// Field → value pairs matched against searchable schema fields.
    pub conditions: Vec<(String, Value)>,
    pub sort: Vec<(String, SortDirection)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

/// Per-operation context. `params` become mandatory equality conditions on
/// every generated statement, scoping the operation to the addressed resource.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub params: Vec<(String, Value)>,
    pub body: Record,
    pub options: QueryOptions,
    pub before_id: BeforeId,
    /// Loaded by fetch; reused by update/position maintenance.
    pub record: Option<Record>,
    /// Pre-update snapshot, set by the update flow.
    pub original_record: Option<Record>,
}

impl Request {
    pub fn new() -> Self {
        Request::default()
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        self.params.push((name.to_string(), value));
        self
    }

    pub fn with_body(mut self, body: Record) -> Self {
        self.body = body;
        self
    }

    pub fn with_before_id(mut self, before_id: BeforeId) -> Self {
        self.before_id = before_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_lookup_keeps_first_match() {
        let req = Request::new()
            .with_param("a", json!(1))
            .with_param("b", json!(2));
        assert_eq!(req.param("b"), Some(&json!(2)));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn before_id_defaults_to_unspecified() {
        assert_eq!(Request::new().before_id, BeforeId::Unspecified);
    }
}
