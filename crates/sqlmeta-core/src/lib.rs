//! sqlmeta core
//!
//! Dialect-agnostic schema model and stable, versioned diff types.
//! Never rename change codes or diff fields - they are part of the public API.

pub mod config;
pub mod diff;
pub mod error;
pub mod report;
pub mod schema;

pub use config::{AllowlistRules, Config, ConfigError, SeverityRules};
pub use diff::{
    ChangeCode, ColumnAttribute, ColumnAttributeDiff, ColumnDiff, ConstraintChange,
    ConstraintDiff, DiffSeverity, Finding, SchemaDiff, TableDiff, TableStatus,
};
pub use error::SchemaError;
pub use report::{Report, ReportSummary, ReportVersion};
pub use schema::{
    Column, Constraint, ConstraintIdentity, ConstraintKind, Dialect, ForeignKeyReference,
    ObjectType, QualifiedName, SchemaObject, Table, TableBuilder, TableDef, View,
};
