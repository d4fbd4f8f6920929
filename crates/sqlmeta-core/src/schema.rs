//! Schema object model and dialect tags
//!
//! Tables are validated on construction and read-only afterwards. The
//! comparator in `sqlmeta-engine` relies on that and never re-validates.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// SQL database product family
///
/// Parsing never fails: unknown tags resolve to [`Dialect::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Dialect {
    /// PostgreSQL
    Postgresql,

    /// MySQL / MariaDB
    Mysql,

    /// Oracle Database
    Oracle,

    /// Microsoft SQL Server
    Mssql,

    /// Dialect-neutral; uses the union of every alias table
    Generic,
}

impl Dialect {
    /// Every dialect, in alias-precedence order
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgresql,
        Dialect::Mysql,
        Dialect::Oracle,
        Dialect::Mssql,
        Dialect::Generic,
    ];

    /// Resolve a dialect tag, falling back to `Generic`
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" | "redshift" => Self::Postgresql,
            "mysql" | "mariadb" => Self::Mysql,
            "oracle" => Self::Oracle,
            "mssql" | "sqlserver" | "tsql" => Self::Mssql,
            _ => Self::Generic,
        }
    }

    /// Stable lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Oracle => "oracle",
            Self::Mssql => "mssql",
            Self::Generic => "generic",
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Dialect {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<&str> for Dialect {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.as_str().to_string()
    }
}

/// Schema-qualified object name
///
/// Serialized as `schema.name` (or just `name` when unqualified).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QualifiedName {
    /// Schema (namespace) name
    pub schema: Option<String>,

    /// Object name
    pub name: String,
}

impl QualifiedName {
    /// Create an unqualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Create a schema-qualified name
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Parse `schema.name`; the split happens at the last dot
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once('.') {
            Some((schema, name)) if !schema.is_empty() => Self::qualified(schema, name),
            _ => Self::new(text),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<String> for QualifiedName {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&str> for QualifiedName {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

fn default_nullable() -> bool {
    true
}

/// A column in a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table)
    pub name: String,

    /// Raw data type spelling, e.g. `VARCHAR(255)` or `INT AUTO_INCREMENT`
    pub data_type: String,

    /// Whether NULL values are allowed
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether the column is (part of) the primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Values are generated by the database (identity / auto-increment)
    /// even if the type spelling does not say so
    #[serde(default)]
    pub identity: bool,

    /// Default value expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// Column comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
            identity: false,
            default_value: None,
            comment: None,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark NOT NULL
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    /// Mark as primary key column (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as database-generated identity column
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Set default value expression
    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default_value = Some(expression.into());
        self
    }

    /// Set comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Constraint kinds (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    NotNull,
}

impl ConstraintKind {
    /// Stable identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::Unique => "UNIQUE",
            Self::ForeignKey => "FOREIGN_KEY",
            Self::Check => "CHECK",
            Self::NotNull => "NOT_NULL",
        }
    }

    /// SQL keyword spelling
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY KEY",
            Self::Unique => "UNIQUE",
            Self::ForeignKey => "FOREIGN KEY",
            Self::Check => "CHECK",
            Self::NotNull => "NOT NULL",
        }
    }

    /// PRIMARY KEY, UNIQUE and FOREIGN KEY are key constraints
    pub fn is_key(&self) -> bool {
        matches!(self, Self::PrimaryKey | Self::Unique | Self::ForeignKey)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// Referenced table
    pub table: QualifiedName,

    /// Referenced columns, positionally matching the constrained columns
    #[serde(default)]
    pub columns: Vec<String>,
}

impl ForeignKeyReference {
    pub fn new<I, S>(table: impl Into<QualifiedName>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ForeignKeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table, self.columns.join(", "))
    }
}

/// Structural identity of a constraint: kind plus sorted column names
///
/// Declared names are deliberately not part of it, so `SYS_C0013220` and
/// `pk_users` on the same column set are the same constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintIdentity {
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl fmt::Display for ConstraintIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.columns.join(", "))
    }
}

/// A table constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint kind
    pub kind: ConstraintKind,

    /// Declared name; absent when system-generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Participating columns, in declaration order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Referenced table and columns (FOREIGN_KEY only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ForeignKeyReference>,

    /// Boolean expression (CHECK only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_expression: Option<String>,
}

impl Constraint {
    /// Create an unnamed constraint
    pub fn new<I, S>(kind: ConstraintKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            references: None,
            check_expression: None,
        }
    }

    pub fn primary_key<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ConstraintKind::PrimaryKey, columns)
    }

    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ConstraintKind::Unique, columns)
    }

    pub fn foreign_key<I, S>(columns: I, references: ForeignKeyReference) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut constraint = Self::new(ConstraintKind::ForeignKey, columns);
        constraint.references = Some(references);
        constraint
    }

    pub fn check<I, S>(expression: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut constraint = Self::new(ConstraintKind::Check, columns);
        constraint.check_expression = Some(expression.into());
        constraint
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Self::new(ConstraintKind::NotNull, [column.into()])
    }

    /// Set the declared name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Matching key used by the comparator
    pub fn identity(&self) -> ConstraintIdentity {
        let mut columns = self.columns.clone();
        columns.sort();
        ConstraintIdentity {
            kind: self.kind,
            columns,
        }
    }

    /// Name if declared, otherwise the structural identity
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.identity().to_string(),
        }
    }
}

/// Kinds of schema objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Table,
    View,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract shared by every schema object
pub trait SchemaObject {
    /// Object kind
    fn object_type(&self) -> ObjectType;

    /// Schema-qualified name
    fn qualified_name(&self) -> QualifiedName;

    /// Dialect the object was declared in
    fn dialect(&self) -> Dialect;

    /// Deterministic tree representation (sorted keys, sorted constraints)
    fn to_canonical(&self) -> Value;
}

/// Plain, unvalidated table definition
///
/// This is the serialized shape of a [`Table`]. `dialect` may be omitted
/// and filled in by whoever loads the definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub constraints: Vec<Constraint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A validated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableDef", into = "TableDef")]
pub struct Table {
    name: QualifiedName,
    dialect: Dialect,
    columns: Vec<Column>,
    constraints: Vec<Constraint>,
    comment: Option<String>,
}

impl Table {
    /// Create and validate a table
    pub fn new(
        name: QualifiedName,
        dialect: Dialect,
        columns: Vec<Column>,
        constraints: Vec<Constraint>,
    ) -> Result<Self, SchemaError> {
        let table = Self {
            name,
            dialect,
            columns,
            constraints,
            comment: None,
        };
        table.validate()?;
        Ok(table)
    }

    /// Start building a table
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    /// Schema-qualified name
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Declared constraints
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Find a column by exact name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns as the comparator sees them
    ///
    /// A column named by a NOT_NULL constraint is not nullable, whatever its
    /// own flag says.
    pub fn effective_columns(&self) -> Cow<'_, [Column]> {
        let forced: HashSet<&str> = self
            .constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::NotNull)
            .flat_map(|c| c.columns.iter().map(String::as_str))
            .collect();

        if !self
            .columns
            .iter()
            .any(|c| c.nullable && forced.contains(c.name.as_str()))
        {
            return Cow::Borrowed(&self.columns);
        }

        let columns = self
            .columns
            .iter()
            .map(|c| {
                let mut column = c.clone();
                if forced.contains(c.name.as_str()) {
                    column.nullable = false;
                }
                column
            })
            .collect();
        Cow::Owned(columns)
    }

    /// Constraints as the comparator sees them
    ///
    /// NOT_NULL constraints are left out; they live in
    /// [`Table::effective_columns`]. When no PRIMARY_KEY constraint is
    /// declared but columns carry the primary-key flag, an unnamed
    /// PRIMARY_KEY constraint over those columns is added.
    pub fn effective_constraints(&self) -> Vec<Constraint> {
        let mut constraints: Vec<Constraint> = self
            .constraints
            .iter()
            .filter(|c| c.kind != ConstraintKind::NotNull)
            .cloned()
            .collect();
        let has_declared_pk = constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::PrimaryKey);

        if !has_declared_pk {
            let pk_columns: Vec<&str> = self
                .columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.as_str())
                .collect();
            if !pk_columns.is_empty() {
                constraints.push(Constraint::primary_key(pk_columns));
            }
        }

        constraints
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.name.name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        let table = self.name.to_string();
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(SchemaError::EmptyColumnName { table });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table,
                    column: column.name.clone(),
                });
            }
        }

        for constraint in &self.constraints {
            if constraint.columns.is_empty() && constraint.kind != ConstraintKind::Check {
                return Err(SchemaError::EmptyConstraint {
                    table,
                    constraint: constraint.describe(),
                });
            }

            if let Some(missing) = constraint
                .columns
                .iter()
                .find(|name| !seen.contains(name.as_str()))
            {
                return Err(SchemaError::UnknownColumn {
                    table,
                    constraint: constraint.describe(),
                    column: missing.clone(),
                });
            }

            if constraint.kind == ConstraintKind::ForeignKey {
                let reference = constraint.references.as_ref().ok_or_else(|| {
                    SchemaError::MissingReference {
                        table: table.clone(),
                        constraint: constraint.describe(),
                    }
                })?;

                if !reference.columns.is_empty()
                    && reference.columns.len() != constraint.columns.len()
                {
                    return Err(SchemaError::ReferenceArity {
                        table,
                        constraint: constraint.describe(),
                        local: constraint.columns.len(),
                        referenced: reference.columns.len(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl SchemaObject for Table {
    fn object_type(&self) -> ObjectType {
        ObjectType::Table
    }

    fn qualified_name(&self) -> QualifiedName {
        self.name.clone()
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn to_canonical(&self) -> Value {
        let columns: Vec<Value> = self
            .effective_columns()
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "data_type": c.data_type.trim().to_uppercase(),
                    "nullable": c.nullable,
                    "primary_key": c.primary_key,
                    "identity": c.identity,
                    "default_value": c.default_value,
                    "comment": c.comment,
                })
            })
            .collect();

        let mut constraints = self.effective_constraints();
        constraints.sort_by_key(|c| c.identity());
        let constraints: Vec<Value> = constraints
            .iter()
            .map(|c| {
                json!({
                    "kind": c.kind.as_str(),
                    "name": c.name,
                    "columns": c.columns,
                    "references": c.references.as_ref().map(|r| json!({
                        "table": r.table.to_string(),
                        "columns": r.columns,
                    })),
                    "check_expression": c.check_expression,
                })
            })
            .collect();

        json!({
            "object_type": self.object_type().as_str(),
            "schema": self.name.schema,
            "name": self.name.name,
            "dialect": self.dialect.as_str(),
            "comment": self.comment,
            "columns": columns,
            "constraints": constraints,
        })
    }
}

impl TryFrom<TableDef> for Table {
    type Error = SchemaError;

    fn try_from(def: TableDef) -> Result<Self, Self::Error> {
        let name = QualifiedName {
            schema: def.schema,
            name: def.name,
        };
        let mut table = Table::new(
            name,
            def.dialect.unwrap_or_default(),
            def.columns,
            def.constraints,
        )?;
        table.comment = def.comment;
        Ok(table)
    }
}

impl From<Table> for TableDef {
    fn from(table: Table) -> Self {
        Self {
            schema: table.name.schema,
            name: table.name.name,
            dialect: Some(table.dialect),
            columns: table.columns,
            constraints: table.constraints,
            comment: table.comment,
        }
    }
}

/// Builder for [`Table`]; validation happens in [`TableBuilder::build`]
#[derive(Debug, Clone)]
pub struct TableBuilder {
    def: TableDef,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: TableDef {
                schema: None,
                name: name.into(),
                dialect: None,
                columns: Vec::new(),
                constraints: Vec::new(),
                comment: None,
            },
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.def.schema = Some(schema.into());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.def.dialect = Some(dialect);
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.def.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.def.columns.extend(columns);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.def.constraints.push(constraint);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.def.comment = Some(comment.into());
        self
    }

    pub fn build(self) -> Result<Table, SchemaError> {
        Table::try_from(self.def)
    }
}

/// A view definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub name: String,

    #[serde(default)]
    pub dialect: Dialect,

    /// SELECT statement text
    pub definition: String,

    /// Output column names, if declared
    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl View {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            dialect: Dialect::Generic,
            definition: definition.into(),
            columns: Vec::new(),
            comment: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl SchemaObject for View {
    fn object_type(&self) -> ObjectType {
        ObjectType::View
    }

    fn qualified_name(&self) -> QualifiedName {
        QualifiedName {
            schema: self.schema.clone(),
            name: self.name.clone(),
        }
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn to_canonical(&self) -> Value {
        json!({
            "object_type": self.object_type().as_str(),
            "schema": self.schema,
            "name": self.name,
            "dialect": self.dialect.as_str(),
            "definition": self.definition.split_whitespace().collect::<Vec<_>>().join(" "),
            "columns": self.columns,
            "comment": self.comment,
        })
    }
}
