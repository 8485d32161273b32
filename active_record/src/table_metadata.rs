//! Table metadata
//!
//! Describes the table a model maps to: its name and primary key, how other
//! tables name foreign keys pointing at it, an optional schema used to create
//! the table on demand, and which columns are stamped with the current time.

use crate::errors::{ActiveRecordError, Result};
use crate::validation::{validate_column_name, validate_table_name};
use serde::{Deserialize, Serialize};
use type_mapping::{column_definition_sql, FieldSpec};

/// Slot replaced by the referencing table's name in a foreign-key pattern
pub const TABLE_SLOT: &str = "{table}";
pub const DEFAULT_FOREIGN_KEY_PATTERN: &str = "{table}_id";

/// One schema column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub spec: FieldSpec,
}

/// Columns stamped with the execution time on insert and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestampable {
    #[serde(default)]
    pub on_insert: Vec<String>,
    #[serde(default)]
    pub on_update: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub primary_key: String,
    pub foreign_key_pattern: String,
    /// Column order is preserved in generated DDL
    #[serde(default)]
    pub schema: Vec<ColumnDef>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub timestamps: Timestampable,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            foreign_key_pattern: DEFAULT_FOREIGN_KEY_PATTERN.to_string(),
            schema: Vec::new(),
            engine: None,
            timestamps: Timestampable::default(),
        }
    }

    pub fn foreign_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.foreign_key_pattern = pattern.into();
        self
    }

    /// Append a schema column
    pub fn column(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.schema.push(ColumnDef {
            name: name.into(),
            spec,
        });
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn stamp_on_insert(mut self, column: impl Into<String>) -> Self {
        self.timestamps.on_insert.push(column.into());
        self
    }

    pub fn stamp_on_update(mut self, column: impl Into<String>) -> Self {
        self.timestamps.on_update.push(column.into());
        self
    }

    pub fn has_schema(&self) -> bool {
        !self.schema.is_empty()
    }

    /// Check the identifiers that end up in generated SQL
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ActiveRecordError::configuration("missing table name"));
        }
        if self.primary_key.is_empty() {
            return Err(ActiveRecordError::configuration(format!(
                "missing primary key name for table '{}'",
                self.name
            )));
        }
        if self.foreign_key_pattern.matches(TABLE_SLOT).count() != 1 {
            return Err(ActiveRecordError::configuration(format!(
                "foreign key pattern '{}' for table '{}' must contain {} exactly once",
                self.foreign_key_pattern, self.name, TABLE_SLOT
            )));
        }

        validate_table_name(&self.name)?;
        validate_column_name(&self.primary_key)?;
        for column in &self.schema {
            validate_column_name(&column.name)?;
        }
        for column in self
            .timestamps
            .on_insert
            .iter()
            .chain(self.timestamps.on_update.iter())
        {
            validate_column_name(column)?;
        }

        Ok(())
    }

    /// Foreign-key column name for a table referencing this one's pattern.
    ///
    /// Schema-qualified names use their last segment: `audit.events` gives `events_id`.
    pub fn foreign_key_for(&self, table: &str) -> String {
        let bare = table.rsplit('.').next().unwrap_or(table);
        self.foreign_key_pattern.replace(TABLE_SLOT, bare)
    }

    /// Idempotent DDL for the declared schema, `None` without one
    pub fn create_table_sql(&self) -> Option<String> {
        if self.schema.is_empty() {
            return None;
        }

        let columns = self
            .schema
            .iter()
            .map(|column| {
                column_definition_sql(
                    &column.name,
                    &column.spec,
                    column.name == self.primary_key,
                )
            })
            .collect::<Vec<_>>();

        Some(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use type_mapping::ColumnKind;

    fn users() -> TableMetadata {
        TableMetadata::new("users", "id")
            .column("id", FieldSpec::big_integer().auto_increment())
            .column("email", FieldSpec::varchar(255).not_null())
            .column("created_at", FieldSpec::timestamp())
            .stamp_on_insert("created_at")
            .stamp_on_update("updated_at")
    }

    #[test]
    fn test_defaults() {
        let table = TableMetadata::new("posts", "id");
        assert_eq!(table.foreign_key_pattern, "{table}_id");
        assert!(!table.has_schema());
        assert_eq!(table.create_table_sql(), None);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_foreign_key_for() {
        let table = TableMetadata::new("users", "id");
        assert_eq!(table.foreign_key_for("users"), "users_id");
        assert_eq!(table.foreign_key_for("audit.events"), "events_id");

        let table = table.foreign_key_pattern("fk_{table}");
        assert_eq!(table.foreign_key_for("users"), "fk_users");
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            users().create_table_sql().unwrap(),
            "CREATE TABLE IF NOT EXISTS users (id BIGSERIAL PRIMARY KEY, \
             email VARCHAR(255) NOT NULL, created_at TIMESTAMP WITH TIME ZONE)"
        );
    }

    #[test]
    fn test_validate_rejects_missing_names() {
        assert!(matches!(
            TableMetadata::new("", "id").validate(),
            Err(ActiveRecordError::Configuration(_))
        ));
        assert!(matches!(
            TableMetadata::new("users", "").validate(),
            Err(ActiveRecordError::Configuration(_))
        ));
        assert!(matches!(
            TableMetadata::new("users", "id")
                .foreign_key_pattern("owner_id")
                .validate(),
            Err(ActiveRecordError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let table = TableMetadata::new("users; DROP", "id");
        assert!(matches!(
            table.validate(),
            Err(ActiveRecordError::Validation(_))
        ));

        let table = TableMetadata::new("users", "id").column("bad-name", FieldSpec::new(ColumnKind::Text));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let table: TableMetadata = serde_json::from_value(serde_json::json!({
            "name": "users",
            "primary_key": "id",
            "foreign_key_pattern": "{table}_id",
            "timestamps": {"on_insert": ["created_at"]}
        }))
        .unwrap();
        assert_eq!(table.timestamps.on_insert, vec!["created_at"]);
        assert!(table.timestamps.on_update.is_empty());
        assert!(table.engine.is_none());
    }
}
