//! Field Schema Adapter: a read-only, ordered view over the declarative field
//! descriptors consumed by the query builder, lifecycle controller, and schema
//! synchronizer. Pure data, no behavior beyond lookup.

use std::collections::HashMap;

/// Semantic field type. `Custom` carries a type name this engine cannot map to
/// SQL by itself; such fields must set `db_type` or schema sync fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Number,
    String,
    Boolean,
    Date,
    Timestamp,
    Blob,
    Custom(String),
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Blob => "blob",
            FieldType::Custom(name) => name,
        }
    }
}

/// Foreign key declaration on a field: either a direct `table`/`column` target,
/// or a `resource` name resolved through the [`ResourceRegistry`] (column then
/// defaults to that resource's identifier field).
#[derive(Clone, Debug, Default)]
pub struct ForeignKeyRef {
    pub table: Option<String>,
    pub column: Option<String>,
    pub resource: Option<String>,
    pub name: Option<String>,
}

/// One field descriptor. Constructed once at configuration time, immutable after.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// NULL vs NOT NULL in DDL.
    pub nullable: bool,
    /// Max length for string fields; DDL uses VARCHAR(trim), default 256.
    pub trim: Option<u32>,
    /// DB-level default, emitted as `DEFAULT '<value>'`.
    pub default_value: Option<String>,
    /// Explicit SQL type, overriding the semantic-type mapping.
    pub db_type: Option<String>,
    /// Number fields become FLOAT instead of BIGINT.
    pub float: bool,
    pub auto_increment: bool,
    pub indexed: bool,
    pub index_name: Option<String>,
    pub unique: bool,
    pub searchable: bool,
    /// Searchable via `LIKE %value%` instead of equality.
    pub full_search: bool,
    /// Excluded from default field projections.
    pub silent: bool,
    pub foreign_key: Option<ForeignKeyRef>,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            field_type,
            nullable: false,
            trim: None,
            default_value: None,
            db_type: None,
            float: false,
            auto_increment: false,
            indexed: false,
            index_name: None,
            unique: false,
            searchable: false,
            full_search: false,
            silent: false,
            foreign_key: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn trim(mut self, max: u32) -> Self {
        self.trim = Some(max);
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn db_type(mut self, sql_type: &str) -> Self {
        self.db_type = Some(sql_type.to_string());
        self
    }

    pub fn float(mut self) -> Self {
        self.float = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn index_name(mut self, name: &str) -> Self {
        self.index_name = Some(name.to_string());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn full_search(mut self) -> Self {
        self.searchable = true;
        self.full_search = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_key = Some(fk);
        self
    }
}

/// Ordered field-name → descriptor mapping. Iteration preserves declaration
/// order, which drives DDL column ordering.
#[derive(Clone, Debug, Default)]
pub struct FieldSchema {
    fields: Vec<FieldDef>,
}

impl FieldSchema {
    pub fn new() -> Self {
        FieldSchema { fields: Vec::new() }
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Engine-level index declaration beyond per-field flags; supports composite
/// columns and uniqueness.
#[derive(Clone, Debug)]
pub struct IndexSpec {
    pub columns: Vec<String>,
    pub unique: bool,
    pub name: Option<String>,
}

impl IndexSpec {
    pub fn new(columns: &[&str]) -> Self {
        IndexSpec {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
            name: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Target of a resource-named foreign key.
#[derive(Clone, Debug)]
pub struct ResourceTarget {
    pub table: String,
    pub id_field: String,
}

/// Sibling-resource registry: lets a field reference another store by resource
/// name instead of a raw table/column pair.
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    targets: HashMap<String, ResourceTarget>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry::default()
    }

    pub fn register(&mut self, resource: &str, table: &str, id_field: &str) {
        self.targets.insert(
            resource.to_string(),
            ResourceTarget {
                table: table.to_string(),
                id_field: id_field.to_string(),
            },
        );
    }

    pub fn get(&self, resource: &str) -> Option<&ResourceTarget> {
        self.targets.get(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_preserves_declaration_order() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number).auto_increment())
            .field(FieldDef::new("name", FieldType::String).trim(64))
            .field(FieldDef::new("created", FieldType::Timestamp));
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "created"]);
    }

    #[test]
    fn lookup_by_name() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("name", FieldType::String).silent());
        assert!(schema.get("name").unwrap().silent);
        assert!(schema.get("missing").is_none());
    }

    #[test]
    fn full_search_implies_searchable() {
        let f = FieldDef::new("name", FieldType::String).full_search();
        assert!(f.searchable && f.full_search);
    }
}
