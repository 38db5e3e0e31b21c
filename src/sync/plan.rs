//! Pure schema diff: declarative field schema vs live MySQL metadata → DDL.
//!
//! Every run re-states each column's full definition (type, nullability,
//! default, key flags, ordering), so running the same plan against a
//! converged table changes nothing observable.

use crate::error::ConfigError;
use crate::schema::{FieldDef, FieldSchema, FieldType, IndexSpec, ResourceRegistry};
use crate::sql::quoted;

/// Column added when a table is first created, dropped at the end of that run.
pub const PLACEHOLDER_COLUMN: &str = "__placeholder__";

/// Live column snapshot from INFORMATION_SCHEMA.COLUMNS.
#[derive(Clone, Debug)]
pub struct LiveColumn {
    pub name: String,
    /// Full SQL type as reported, e.g. `bigint` or `varchar(256)`.
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

/// Live index entry from SHOW INDEX (one row per indexed column).
#[derive(Clone, Debug)]
pub struct LiveIndex {
    pub key_name: String,
    pub column_name: String,
    pub seq_in_index: u64,
}

/// Live constraint name from INFORMATION_SCHEMA.TABLE_CONSTRAINTS.
#[derive(Clone, Debug)]
pub struct LiveConstraint {
    pub name: String,
}

/// Everything the diff needs to know about the live table.
#[derive(Clone, Debug, Default)]
pub struct LiveMetadata {
    pub columns: Vec<LiveColumn>,
    pub indexes: Vec<LiveIndex>,
    pub constraints: Vec<LiveConstraint>,
}

impl LiveMetadata {
    pub fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_column(&self) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.key_name == name)
    }

    /// A non-primary index whose leading column is `column`.
    fn has_index_on(&self, column: &str) -> bool {
        self.indexes
            .iter()
            .any(|i| i.key_name != "PRIMARY" && i.seq_in_index == 1 && i.column_name == column)
    }

    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.name == name)
    }
}

/// Inputs to the diff: the store's declarative side plus the sibling registry
/// for resource-named foreign keys.
pub struct SyncInputs<'a> {
    pub table: &'a str,
    pub id_field: &'a str,
    pub schema: &'a FieldSchema,
    pub extra_indexes: &'a [IndexSpec],
    pub registry: &'a ResourceRegistry,
}

/// The schema diff plan: ephemeral, computed once per run, discarded after
/// execution. `statements` yields DDL in dependency order.
#[derive(Clone, Debug, Default)]
pub struct SyncPlan {
    /// Primary-key migration: auto-increment strip, fallback index, key swap.
    pub primary_key: Vec<String>,
    /// One ADD COLUMN / CHANGE per schema field, in declaration order.
    pub columns: Vec<String>,
    pub drop_placeholder: Option<String>,
    pub indexes: Vec<String>,
    pub constraints: Vec<String>,
}

impl SyncPlan {
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.primary_key
            .iter()
            .chain(self.columns.iter())
            .chain(self.drop_placeholder.iter())
            .chain(self.indexes.iter())
            .chain(self.constraints.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.statements().next().is_none()
    }
}

/// SQL type for a field: explicit override, else the semantic-type mapping.
pub fn column_sql_type(field: &FieldDef) -> Result<String, ConfigError> {
    if let Some(db_type) = &field.db_type {
        return Ok(db_type.clone());
    }
    Ok(match &field.field_type {
        FieldType::Number => {
            if field.float {
                "FLOAT".to_string()
            } else {
                "BIGINT".to_string()
            }
        }
        FieldType::String => format!("VARCHAR({})", field.trim.unwrap_or(256)),
        FieldType::Boolean => "TINYINT".to_string(),
        FieldType::Date => "DATE".to_string(),
        FieldType::Timestamp => "TIMESTAMP".to_string(),
        FieldType::Blob => "BLOB".to_string(),
        FieldType::Custom(name) => {
            return Err(ConfigError::UnmappedType {
                field: field.name.clone(),
                type_name: name.clone(),
            })
        }
    })
}

fn column_definition(field: &FieldDef) -> Result<String, ConfigError> {
    let mut def = format!(
        "{} {} {}",
        quoted(&field.name),
        column_sql_type(field)?,
        if field.nullable { "NULL" } else { "NOT NULL" }
    );
    if let Some(default) = &field.default_value {
        def.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
    }
    Ok(def)
}

fn default_index_name(columns: &[String]) -> String {
    format!("rst_{}", columns.join("_"))
}

/// Diff the declarative schema against the live table.
pub fn build_plan(inputs: &SyncInputs<'_>, live: &LiveMetadata) -> Result<SyncPlan, ConfigError> {
    let mut plan = SyncPlan::default();
    let table = quoted(inputs.table);
    let newly_created = live.column(PLACEHOLDER_COLUMN).is_some();

    // Intended auto-increment column: the explicit flag wins, else the id.
    let auto_increment_field = inputs
        .schema
        .fields()
        .iter()
        .find(|f| f.auto_increment)
        .map(|f| f.name.as_str())
        .unwrap_or(inputs.id_field);

    if let Some(pk) = live.primary_key_column() {
        if pk.name != inputs.id_field {
            // A column cannot lose primary-key status while auto-incrementing.
            if pk.auto_increment {
                plan.primary_key.push("SET foreign_key_checks = 0".to_string());
                plan.primary_key.push(format!(
                    "ALTER TABLE {} CHANGE {} {} {} {}",
                    table,
                    quoted(&pk.name),
                    quoted(&pk.name),
                    pk.column_type,
                    if pk.nullable { "NULL" } else { "NOT NULL" }
                ));
                plan.primary_key.push("SET foreign_key_checks = 1".to_string());
            }
            // The old key must keep an index, or references to it break when
            // the primary key constraint is dropped.
            if !live.has_index_on(&pk.name) {
                let index_name = inputs
                    .schema
                    .get(&pk.name)
                    .and_then(|f| f.index_name.clone())
                    .unwrap_or_else(|| default_index_name(&[pk.name.clone()]));
                plan.primary_key.push(format!(
                    "ALTER TABLE {} ADD INDEX {} ({})",
                    table,
                    quoted(&index_name),
                    quoted(&pk.name)
                ));
            }
            plan.primary_key.push(format!(
                "ALTER TABLE {} DROP PRIMARY KEY, ADD PRIMARY KEY ({})",
                table,
                quoted(inputs.id_field)
            ));
        }
    }

    let mut index_requests: Vec<IndexSpec> = Vec::new();
    let mut constraint_requests: Vec<(String, crate::schema::ForeignKeyRef)> = Vec::new();
    let mut previous: Option<&str> = None;
    for field in inputs.schema.fields() {
        let creating = live.column(&field.name).is_none();
        let mut statement = format!(
            "ALTER TABLE {} {} {}",
            table,
            if creating {
                "ADD COLUMN".to_string()
            } else {
                format!("CHANGE {}", quoted(&field.name))
            },
            column_definition(field)?
        );
        // A brand-new identifier column must carry the key inline, since its
        // AUTO_INCREMENT below is invalid without one.
        if creating && field.name == inputs.id_field {
            statement.push_str(" PRIMARY KEY");
        }
        if field.name == auto_increment_field {
            statement.push_str(" AUTO_INCREMENT");
        }
        if let Some(prev) = previous {
            statement.push_str(&format!(" AFTER {}", quoted(prev)));
        }
        plan.columns.push(statement);
        previous = Some(&field.name);

        if (field.indexed || field.searchable) && field.name != inputs.id_field {
            index_requests.push(IndexSpec {
                columns: vec![field.name.clone()],
                unique: field.unique,
                name: field.index_name.clone(),
            });
        }
        if let Some(fk) = &field.foreign_key {
            constraint_requests.push((field.name.clone(), fk.clone()));
        }
    }
    index_requests.extend(inputs.extra_indexes.iter().cloned());

    if newly_created {
        plan.drop_placeholder = Some(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            table,
            quoted(PLACEHOLDER_COLUMN)
        ));
    }

    for request in index_requests {
        let name = request
            .name
            .unwrap_or_else(|| default_index_name(&request.columns));
        if live.has_index(&name) {
            continue;
        }
        let columns: Vec<String> = request.columns.iter().map(|c| quoted(c)).collect();
        plan.indexes.push(format!(
            "ALTER TABLE {} ADD {}INDEX {} ({})",
            table,
            if request.unique { "UNIQUE " } else { "" },
            quoted(&name),
            columns.join(", ")
        ));
    }

    for (source, fk) in constraint_requests {
        let resolved = match (&fk.table, &fk.resource) {
            (Some(t), _) => Some((t.clone(), fk.column.clone())),
            (None, Some(resource)) => {
                let target = inputs.registry.get(resource).ok_or_else(|| {
                    ConfigError::UnresolvedResource {
                        field: source.clone(),
                        resource: resource.clone(),
                    }
                })?;
                Some((
                    target.table.clone(),
                    fk.column.clone().or(Some(target.id_field.clone())),
                ))
            }
            (None, None) => None,
        };
        let Some((target_table, target_column)) = resolved else {
            return Err(ConfigError::IncompleteForeignKey { field: source });
        };
        let Some(target_column) = target_column else {
            return Err(ConfigError::IncompleteForeignKey { field: source });
        };
        let name = fk.name.clone().unwrap_or_else(|| {
            format!("rst_{}_to_{}_{}", source, target_table, target_column)
        });
        if live.has_constraint(&name) {
            continue;
        }
        plan.constraints.push(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) \
             ON DELETE NO ACTION ON UPDATE NO ACTION",
            table,
            quoted(&name),
            quoted(&source),
            quoted(&target_table),
            quoted(&target_column)
        ));
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType, ForeignKeyRef};

    fn schema() -> FieldSchema {
        FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number).auto_increment())
            .field(FieldDef::new("name", FieldType::String).trim(16).searchable())
    }

    fn inputs<'a>(
        schema: &'a FieldSchema,
        extra: &'a [IndexSpec],
        registry: &'a ResourceRegistry,
    ) -> SyncInputs<'a> {
        SyncInputs {
            table: "books",
            id_field: "id",
            schema,
            extra_indexes: extra,
            registry,
        }
    }

    fn placeholder_only() -> LiveMetadata {
        LiveMetadata {
            columns: vec![LiveColumn {
                name: PLACEHOLDER_COLUMN.to_string(),
                column_type: "int(1)".to_string(),
                nullable: true,
                primary_key: false,
                auto_increment: false,
            }],
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    fn converged() -> LiveMetadata {
        LiveMetadata {
            columns: vec![
                LiveColumn {
                    name: "id".to_string(),
                    column_type: "bigint".to_string(),
                    nullable: false,
                    primary_key: true,
                    auto_increment: true,
                },
                LiveColumn {
                    name: "name".to_string(),
                    column_type: "varchar(16)".to_string(),
                    nullable: false,
                    primary_key: false,
                    auto_increment: false,
                },
            ],
            indexes: vec![
                LiveIndex {
                    key_name: "PRIMARY".to_string(),
                    column_name: "id".to_string(),
                    seq_in_index: 1,
                },
                LiveIndex {
                    key_name: "rst_name".to_string(),
                    column_name: "name".to_string(),
                    seq_in_index: 1,
                },
            ],
            constraints: Vec::new(),
        }
    }

    #[test]
    fn new_table_builds_everything() {
        let schema = schema();
        let registry = ResourceRegistry::new();
        let plan = build_plan(&inputs(&schema, &[], &registry), &placeholder_only()).unwrap();
        assert!(plan.primary_key.is_empty());
        assert_eq!(
            plan.columns,
            vec![
                "ALTER TABLE `books` ADD COLUMN `id` BIGINT NOT NULL PRIMARY KEY AUTO_INCREMENT",
                "ALTER TABLE `books` ADD COLUMN `name` VARCHAR(16) NOT NULL AFTER `id`",
            ]
        );
        assert_eq!(
            plan.drop_placeholder.as_deref(),
            Some("ALTER TABLE `books` DROP COLUMN `__placeholder__`")
        );
        assert_eq!(
            plan.indexes,
            vec!["ALTER TABLE `books` ADD INDEX `rst_name` (`name`)"]
        );
    }

    #[test]
    fn empty_plan_reports_empty() {
        assert!(SyncPlan::default().is_empty());
        let schema = schema();
        let registry = ResourceRegistry::new();
        let plan = build_plan(&inputs(&schema, &[], &registry), &placeholder_only()).unwrap();
        assert!(!plan.is_empty());
    }

    #[test]
    fn converged_table_only_restates_columns() {
        let schema = schema();
        let registry = ResourceRegistry::new();
        let plan = build_plan(&inputs(&schema, &[], &registry), &converged()).unwrap();
        assert!(plan.primary_key.is_empty());
        assert!(plan.indexes.is_empty());
        assert!(plan.constraints.is_empty());
        assert!(plan.drop_placeholder.is_none());
        // Idempotent CHANGEs: full definition restated, nothing added.
        assert_eq!(
            plan.columns,
            vec![
                "ALTER TABLE `books` CHANGE `id` `id` BIGINT NOT NULL AUTO_INCREMENT",
                "ALTER TABLE `books` CHANGE `name` `name` VARCHAR(16) NOT NULL AFTER `id`",
            ]
        );
    }

    #[test]
    fn primary_key_migration_sequence() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number).auto_increment())
            .field(FieldDef::new("legacy_id", FieldType::Number));
        let registry = ResourceRegistry::new();
        let live = LiveMetadata {
            columns: vec![LiveColumn {
                name: "legacy_id".to_string(),
                column_type: "int".to_string(),
                nullable: false,
                primary_key: true,
                auto_increment: true,
            }],
            indexes: vec![LiveIndex {
                key_name: "PRIMARY".to_string(),
                column_name: "legacy_id".to_string(),
                seq_in_index: 1,
            }],
            constraints: Vec::new(),
        };
        let plan = build_plan(&inputs(&schema, &[], &registry), &live).unwrap();
        assert_eq!(
            plan.primary_key,
            vec![
                "SET foreign_key_checks = 0",
                "ALTER TABLE `books` CHANGE `legacy_id` `legacy_id` int NOT NULL",
                "SET foreign_key_checks = 1",
                "ALTER TABLE `books` ADD INDEX `rst_legacy_id` (`legacy_id`)",
                "ALTER TABLE `books` DROP PRIMARY KEY, ADD PRIMARY KEY (`id`)",
            ]
        );
    }

    #[test]
    fn pk_migration_skips_index_when_old_key_still_indexed() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number))
            .field(FieldDef::new("legacy_id", FieldType::Number));
        let registry = ResourceRegistry::new();
        let live = LiveMetadata {
            columns: vec![LiveColumn {
                name: "legacy_id".to_string(),
                column_type: "int".to_string(),
                nullable: false,
                primary_key: true,
                auto_increment: false,
            }],
            indexes: vec![LiveIndex {
                key_name: "rst_legacy_id".to_string(),
                column_name: "legacy_id".to_string(),
                seq_in_index: 1,
            }],
            constraints: Vec::new(),
        };
        let plan = build_plan(&inputs(&schema, &[], &registry), &live).unwrap();
        assert_eq!(
            plan.primary_key,
            vec!["ALTER TABLE `books` DROP PRIMARY KEY, ADD PRIMARY KEY (`id`)"]
        );
    }

    #[test]
    fn type_mapping_and_overrides() {
        assert_eq!(
            column_sql_type(&FieldDef::new("n", FieldType::Number)).unwrap(),
            "BIGINT"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("n", FieldType::Number).float()).unwrap(),
            "FLOAT"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("s", FieldType::String)).unwrap(),
            "VARCHAR(256)"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("b", FieldType::Boolean)).unwrap(),
            "TINYINT"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("d", FieldType::Date)).unwrap(),
            "DATE"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("t", FieldType::Timestamp)).unwrap(),
            "TIMESTAMP"
        );
        assert_eq!(
            column_sql_type(&FieldDef::new("z", FieldType::Blob)).unwrap(),
            "BLOB"
        );
        assert_eq!(
            column_sql_type(
                &FieldDef::new("p", FieldType::Custom("point".to_string())).db_type("POINT")
            )
            .unwrap(),
            "POINT"
        );
    }

    #[test]
    fn unmapped_custom_type_is_fatal() {
        let err = column_sql_type(&FieldDef::new("p", FieldType::Custom("point".to_string())));
        assert!(matches!(
            err,
            Err(ConfigError::UnmappedType { field, type_name })
                if field == "p" && type_name == "point"
        ));
    }

    #[test]
    fn default_value_is_quoted_into_ddl() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number))
            .field(FieldDef::new("state", FieldType::String).default_value("it's new"));
        let registry = ResourceRegistry::new();
        let plan = build_plan(&inputs(&schema, &[], &registry), &placeholder_only()).unwrap();
        assert!(plan.columns[1].contains("DEFAULT 'it''s new'"));
    }

    #[test]
    fn composite_unique_extra_index() {
        let schema = schema();
        let registry = ResourceRegistry::new();
        let extra = [IndexSpec::new(&["group_id", "pos"]).unique()];
        let plan = build_plan(&inputs(&schema, &extra, &registry), &placeholder_only()).unwrap();
        assert!(plan.indexes.contains(
            &"ALTER TABLE `books` ADD UNIQUE INDEX `rst_group_id_pos` (`group_id`, `pos`)"
                .to_string()
        ));
    }

    #[test]
    fn foreign_key_resolves_through_registry() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number))
            .field(FieldDef::new("author_id", FieldType::Number).foreign_key(ForeignKeyRef {
                resource: Some("authors".to_string()),
                ..ForeignKeyRef::default()
            }));
        let mut registry = ResourceRegistry::new();
        registry.register("authors", "authors", "id");
        let plan = build_plan(&inputs(&schema, &[], &registry), &placeholder_only()).unwrap();
        assert_eq!(
            plan.constraints,
            vec![
                "ALTER TABLE `books` ADD CONSTRAINT `rst_author_id_to_authors_id` \
                 FOREIGN KEY (`author_id`) REFERENCES `authors` (`id`) \
                 ON DELETE NO ACTION ON UPDATE NO ACTION"
            ]
        );
    }

    #[test]
    fn unregistered_resource_is_fatal() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number))
            .field(FieldDef::new("author_id", FieldType::Number).foreign_key(ForeignKeyRef {
                resource: Some("authors".to_string()),
                ..ForeignKeyRef::default()
            }));
        let registry = ResourceRegistry::new();
        let err = build_plan(&inputs(&schema, &[], &registry), &placeholder_only());
        assert!(matches!(
            err,
            Err(ConfigError::UnresolvedResource { resource, .. }) if resource == "authors"
        ));
    }

    #[test]
    fn existing_constraint_names_are_skipped() {
        let schema = FieldSchema::new()
            .field(FieldDef::new("id", FieldType::Number))
            .field(FieldDef::new("author_id", FieldType::Number).foreign_key(ForeignKeyRef {
                table: Some("authors".to_string()),
                column: Some("id".to_string()),
                ..ForeignKeyRef::default()
            }));
        let registry = ResourceRegistry::new();
        let mut live = converged();
        live.constraints.push(LiveConstraint {
            name: "rst_author_id_to_authors_id".to_string(),
        });
        let plan = build_plan(&inputs(&schema, &[], &registry), &live).unwrap();
        assert!(plan.constraints.is_empty());
    }
}
