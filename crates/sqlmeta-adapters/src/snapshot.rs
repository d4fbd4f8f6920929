//! Schema snapshot files (JSON)
//!
//! A snapshot is the serialized form of one schema version:
//!
//! ```json
//! {
//!   "dialect": "postgresql",
//!   "tables": [{ "schema": "public", "name": "users", "columns": [...] }],
//!   "views": []
//! }
//! ```
//!
//! Tables and views that omit `dialect` inherit the snapshot's.

use serde::{Deserialize, Serialize};
use sqlmeta_core::{Dialect, SchemaError, Table, TableDef, View};
use std::collections::HashSet;
use std::path::Path;

/// Snapshot error types
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid table '{table}': {source}")]
    InvalidTable {
        table: String,
        #[source]
        source: SchemaError,
    },

    #[error("Duplicate table in snapshot: {0}")]
    DuplicateTable(String),
}

/// On-disk shape; tables are still unvalidated here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dialect: Option<Dialect>,

    #[serde(default)]
    tables: Vec<TableDef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    views: Vec<ViewDef>,
}

/// View as stored; `dialect` is optional so it can be inherited
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ViewDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dialect: Option<Dialect>,
    definition: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

/// One version of a schema: validated tables plus views
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSnapshot {
    pub dialect: Dialect,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
}

impl SchemaSnapshot {
    /// Create a snapshot, rejecting duplicate qualified table names
    pub fn new(
        dialect: Dialect,
        tables: Vec<Table>,
        views: Vec<View>,
    ) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name().clone()) {
                return Err(SnapshotError::DuplicateTable(table.name().to_string()));
            }
        }

        Ok(Self {
            dialect,
            tables,
            views,
        })
    }

    /// Parse snapshot JSON
    ///
    /// `default_dialect` applies when the snapshot itself declares none.
    pub fn from_json(json: &str, default_dialect: Dialect) -> Result<Self, SnapshotError> {
        let file: SnapshotFile =
            serde_json::from_str(json).map_err(|e| SnapshotError::ParseError(e.to_string()))?;
        let dialect = file.dialect.unwrap_or(default_dialect);

        let tables = file
            .tables
            .into_iter()
            .map(|mut def| {
                def.dialect.get_or_insert(dialect);
                let name = match &def.schema {
                    Some(schema) => format!("{}.{}", schema, def.name),
                    None => def.name.clone(),
                };
                Table::try_from(def).map_err(|source| SnapshotError::InvalidTable {
                    table: name,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let views = file
            .views
            .into_iter()
            .map(|def| View {
                schema: def.schema,
                name: def.name,
                dialect: def.dialect.unwrap_or(dialect),
                definition: def.definition,
                columns: def.columns,
                comment: def.comment,
            })
            .collect();

        Self::new(dialect, tables, views)
    }

    /// Load a snapshot file
    pub fn from_file(path: &Path, default_dialect: Dialect) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents, default_dialect)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let file = SnapshotFile {
            dialect: Some(self.dialect),
            tables: self.tables.iter().cloned().map(TableDef::from).collect(),
            views: self
                .views
                .iter()
                .map(|v| ViewDef {
                    schema: v.schema.clone(),
                    name: v.name.clone(),
                    dialect: Some(v.dialect),
                    definition: v.definition.clone(),
                    columns: v.columns.clone(),
                    comment: v.comment.clone(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&file)
            .map_err(|e| SnapshotError::SerializeError(e.to_string()))
    }

    /// Save to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| SnapshotError::IoError(format!("{}: {}", path.display(), e)))
    }

    /// Find a table by its `schema.name` display form
    pub fn table(&self, qualified_name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name().to_string() == qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"{
        "dialect": "postgres",
        "tables": [
            {
                "schema": "public",
                "name": "users",
                "columns": [
                    { "name": "id", "data_type": "SERIAL", "nullable": false, "primary_key": true },
                    { "name": "email", "data_type": "VARCHAR(255)", "nullable": false }
                ],
                "constraints": [
                    { "kind": "UNIQUE", "name": "uq_users_email", "columns": ["email"] }
                ]
            },
            {
                "name": "legacy",
                "dialect": "mysql",
                "columns": [{ "name": "id", "data_type": "INT" }]
            }
        ],
        "views": [
            { "name": "active_users", "definition": "SELECT id FROM users" }
        ]
    }"#;

    #[test]
    fn tables_inherit_snapshot_dialect() {
        let snapshot = SchemaSnapshot::from_json(SNAPSHOT, Dialect::Generic).unwrap();
        assert_eq!(snapshot.dialect, Dialect::Postgresql);
        assert_eq!(snapshot.tables.len(), 2);
        assert_eq!(snapshot.table("public.users").unwrap().dialect(), Dialect::Postgresql);
        assert_eq!(snapshot.table("legacy").unwrap().dialect(), Dialect::Mysql);
        assert_eq!(snapshot.views[0].dialect, Dialect::Postgresql);
    }

    #[test]
    fn default_dialect_applies_when_snapshot_has_none() {
        let json = r#"{ "tables": [{ "name": "t", "columns": [{ "name": "a", "data_type": "INT" }] }] }"#;
        let snapshot = SchemaSnapshot::from_json(json, Dialect::Oracle).unwrap();
        assert_eq!(snapshot.tables[0].dialect(), Dialect::Oracle);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let json = r#"{ "tables": [{ "name": "t", "columns": [
            { "name": "a", "data_type": "INT" },
            { "name": "a", "data_type": "TEXT" }
        ] }] }"#;
        let err = SchemaSnapshot::from_json(json, Dialect::Generic).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidTable {
                ref table,
                source: SchemaError::DuplicateColumn { .. },
            } if table == "t"
        ));
    }

    #[test]
    fn duplicate_tables_are_rejected() {
        let json = r#"{ "tables": [
            { "schema": "s", "name": "t", "columns": [] },
            { "schema": "s", "name": "t", "columns": [] }
        ] }"#;
        let err = SchemaSnapshot::from_json(json, Dialect::Generic).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateTable(ref name) if name == "s.t"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SchemaSnapshot::from_json("{ tables: ", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SnapshotError::ParseError(_)));
    }

    #[test]
    fn json_roundtrip() {
        let snapshot = SchemaSnapshot::from_json(SNAPSHOT, Dialect::Generic).unwrap();
        let json = snapshot.to_json().unwrap();
        let reloaded = SchemaSnapshot::from_json(&json, Dialect::Generic).unwrap();
        assert_eq!(snapshot, reloaded);
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("sqlmeta-snapshot-{}.json", std::process::id()));
        let snapshot = SchemaSnapshot::from_json(SNAPSHOT, Dialect::Generic).unwrap();
        snapshot.save_to_file(&path).unwrap();
        let loaded = SchemaSnapshot::from_file(&path, Dialect::Generic).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(snapshot, loaded);

        let missing =
            SchemaSnapshot::from_file(Path::new("/nonexistent/schema.json"), Dialect::Generic);
        assert!(matches!(missing, Err(SnapshotError::IoError(_))));
    }
}
