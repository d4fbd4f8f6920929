//! Diff value types and change codes
//!
//! IMPORTANT: change codes and the serialized field names of the diff types
//! are consumed by migration generators and CI gates.
//! NEVER rename or remove codes or fields - only add new ones.

use crate::schema::{ConstraintKind, Dialect, ForeignKeyReference};
use serde::{Deserialize, Serialize};

/// Severity of a difference, totally ordered `Info < Warning < Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffSeverity {
    /// Cosmetic difference (comments, defaults)
    #[serde(alias = "info")]
    Info,

    /// Review before applying; not breaking by itself
    #[serde(alias = "warning", alias = "warn")]
    Warning,

    /// Breaking change
    #[serde(alias = "error")]
    Error,
}

impl DiffSeverity {
    /// Maximum of a set of severities, `None` when the set is empty
    pub fn max_of(severities: impl IntoIterator<Item = DiffSeverity>) -> Option<DiffSeverity> {
        severities.into_iter().max()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for DiffSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change code registry (v1)
///
/// These codes are STABLE. Severity overrides in `sqlmeta.toml` refer to
/// them by their string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeCode {
    // Tables
    /// Table exists only in the target
    TableAdded,

    /// Table exists only in the source
    TableDropped,

    // Columns
    /// Column exists only in the target and has no default value
    ColumnAdded,

    /// Column exists only in the target and has a default value
    ColumnAddedWithDefault,

    /// Column exists only in the source
    ColumnDropped,

    /// Normalized types differ and the change is not a widening
    TypeChanged,

    /// Normalized types differ but the target type can hold every source value
    TypeWidened,

    /// Column went from nullable to NOT NULL
    NullabilityTightened,

    /// Column went from NOT NULL to nullable
    NullabilityRelaxed,

    /// Default value expression differs
    DefaultChanged,

    /// Column comment differs
    CommentChanged,

    // Constraints
    /// PRIMARY KEY, UNIQUE or FOREIGN KEY exists only in the target
    KeyConstraintAdded,

    /// PRIMARY KEY, UNIQUE or FOREIGN KEY exists only in the source
    KeyConstraintRemoved,

    /// CHECK or NOT NULL constraint exists only in the target
    ConstraintAdded,

    /// CHECK or NOT NULL constraint exists only in the source
    ConstraintRemoved,

    /// Foreign key on the same columns points somewhere else
    ForeignKeyChanged,

    /// CHECK constraint on the same columns has a different expression
    CheckChanged,
}

impl ChangeCode {
    /// Every code, in registry order
    pub const ALL: [ChangeCode; 17] = [
        Self::TableAdded,
        Self::TableDropped,
        Self::ColumnAdded,
        Self::ColumnAddedWithDefault,
        Self::ColumnDropped,
        Self::TypeChanged,
        Self::TypeWidened,
        Self::NullabilityTightened,
        Self::NullabilityRelaxed,
        Self::DefaultChanged,
        Self::CommentChanged,
        Self::KeyConstraintAdded,
        Self::KeyConstraintRemoved,
        Self::ConstraintAdded,
        Self::ConstraintRemoved,
        Self::ForeignKeyChanged,
        Self::CheckChanged,
    ];

    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableAdded => "TABLE_ADDED",
            Self::TableDropped => "TABLE_DROPPED",
            Self::ColumnAdded => "COLUMN_ADDED",
            Self::ColumnAddedWithDefault => "COLUMN_ADDED_WITH_DEFAULT",
            Self::ColumnDropped => "COLUMN_DROPPED",
            Self::TypeChanged => "TYPE_CHANGED",
            Self::TypeWidened => "TYPE_WIDENED",
            Self::NullabilityTightened => "NULLABILITY_TIGHTENED",
            Self::NullabilityRelaxed => "NULLABILITY_RELAXED",
            Self::DefaultChanged => "DEFAULT_CHANGED",
            Self::CommentChanged => "COMMENT_CHANGED",
            Self::KeyConstraintAdded => "KEY_CONSTRAINT_ADDED",
            Self::KeyConstraintRemoved => "KEY_CONSTRAINT_REMOVED",
            Self::ConstraintAdded => "CONSTRAINT_ADDED",
            Self::ConstraintRemoved => "CONSTRAINT_REMOVED",
            Self::ForeignKeyChanged => "FOREIGN_KEY_CHANGED",
            Self::CheckChanged => "CHECK_CHANGED",
        }
    }

    /// Look up a code by its stable identifier
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }

    /// Built-in severity, before configured overrides
    pub fn default_severity(&self) -> DiffSeverity {
        match self {
            Self::TableDropped
            | Self::ColumnDropped
            | Self::TypeChanged
            | Self::KeyConstraintRemoved
            | Self::ForeignKeyChanged => DiffSeverity::Error,

            Self::TableAdded
            | Self::ColumnAdded
            | Self::TypeWidened
            | Self::NullabilityTightened
            | Self::NullabilityRelaxed
            | Self::KeyConstraintAdded
            | Self::ConstraintAdded
            | Self::ConstraintRemoved
            | Self::CheckChanged => DiffSeverity::Warning,

            Self::ColumnAddedWithDefault | Self::DefaultChanged | Self::CommentChanged => {
                DiffSeverity::Info
            }
        }
    }
}

impl std::fmt::Display for ChangeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified discrepancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable change code
    pub code: ChangeCode,

    /// Severity after applying overrides
    pub severity: DiffSeverity,

    /// Column name or constraint description the finding is about
    pub subject: String,

    /// Human-readable message
    pub message: String,
}

impl Finding {
    pub fn new(
        code: ChangeCode,
        severity: DiffSeverity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// A column present on both sides whose type or nullability differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub column_name: String,
    pub type_mismatch: bool,
    pub nullable_mismatch: bool,

    /// Raw source type spelling
    pub source_type: String,

    /// Raw target type spelling
    pub target_type: String,

    pub source_nullable: bool,
    pub target_nullable: bool,

    /// Normalized source type token
    pub source_normalized: String,

    /// Normalized target type token
    pub target_normalized: String,

    pub severity: DiffSeverity,
}

/// Column attributes that are compared but only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAttribute {
    Default,
    Comment,
}

/// A default-value or comment difference on a column present on both sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAttributeDiff {
    pub column_name: String,
    pub attribute: ColumnAttribute,
    pub source: Option<String>,
    pub target: Option<String>,
    pub severity: DiffSeverity,
}

/// Direction of a constraint difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintChange {
    /// Only in target
    Added,

    /// Only in source
    Removed,

    /// Same structural identity, different reference or expression
    Changed,
}

/// A constraint difference, keyed by structural identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDiff {
    pub change: ConstraintChange,
    pub kind: ConstraintKind,

    /// Sorted identity columns
    pub columns: Vec<String>,

    pub source_name: Option<String>,
    pub target_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<ForeignKeyReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reference: Option<ForeignKeyReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_expression: Option<String>,

    pub severity: DiffSeverity,
}

impl ConstraintDiff {
    /// `KIND(col, ...)` description
    pub fn describe(&self) -> String {
        format!("{}({})", self.kind, self.columns.join(", "))
    }
}

/// How a table pairs up between source and target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Present on both sides
    Matched,

    /// Only in target
    Added,

    /// Only in source
    Removed,
}

/// Differences for one table pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    /// Qualified table name (`schema.name`)
    pub table_name: String,

    pub status: TableStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dialect: Option<Dialect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dialect: Option<Dialect>,

    /// Present only in target, in target order
    pub missing_columns: Vec<String>,

    /// Present only in source, in source order
    pub extra_columns: Vec<String>,

    pub modified_columns: Vec<ColumnDiff>,

    pub attribute_changes: Vec<ColumnAttributeDiff>,

    pub constraint_diffs: Vec<ConstraintDiff>,

    pub findings: Vec<Finding>,

    /// Max finding severity; absent when there are no diffs
    pub severity: Option<DiffSeverity>,

    pub has_diffs: bool,
}

impl TableDiff {
    /// Empty diff for a table pair; severity and `has_diffs` are derived
    /// from findings by [`TableDiff::with_findings`]
    pub fn new(table_name: impl Into<String>, status: TableStatus) -> Self {
        Self {
            table_name: table_name.into(),
            status,
            source_dialect: None,
            target_dialect: None,
            missing_columns: Vec::new(),
            extra_columns: Vec::new(),
            modified_columns: Vec::new(),
            attribute_changes: Vec::new(),
            constraint_diffs: Vec::new(),
            findings: Vec::new(),
            severity: None,
            has_diffs: false,
        }
    }

    /// Attach findings and derive the aggregate severity
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.severity = DiffSeverity::max_of(findings.iter().map(|f| f.severity));
        self.has_diffs = !findings.is_empty();
        self.findings = findings;
        self
    }

    /// Constraint diffs in one direction
    pub fn constraints(&self, change: ConstraintChange) -> impl Iterator<Item = &ConstraintDiff> {
        self.constraint_diffs.iter().filter(move |d| d.change == change)
    }

    /// Findings carrying a given code
    pub fn findings_with(&self, code: ChangeCode) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn count(&self, severity: DiffSeverity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.severity == Some(DiffSeverity::Error)
    }
}

/// Differences across a whole schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Target order, then source-only tables in source order
    pub tables: Vec<TableDiff>,

    /// Max table severity; absent when nothing differs
    pub severity: Option<DiffSeverity>,

    pub has_diffs: bool,
}

impl SchemaDiff {
    /// Aggregate table diffs
    pub fn from_tables(tables: Vec<TableDiff>) -> Self {
        let severity = DiffSeverity::max_of(tables.iter().filter_map(|t| t.severity));
        let has_diffs = tables.iter().any(|t| t.has_diffs);
        Self {
            tables,
            severity,
            has_diffs,
        }
    }

    /// Find a table diff by qualified name
    pub fn table(&self, table_name: &str) -> Option<&TableDiff> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    /// Tables with at least one difference
    pub fn changed_tables(&self) -> impl Iterator<Item = &TableDiff> {
        self.tables.iter().filter(|t| t.has_diffs)
    }

    /// Findings of a severity across all tables
    pub fn count(&self, severity: DiffSeverity) -> usize {
        self.tables.iter().map(|t| t.count(severity)).sum()
    }

    /// Whether the aggregate severity is at or above `threshold`
    pub fn exceeds(&self, threshold: DiffSeverity) -> bool {
        self.severity.is_some_and(|s| s >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_code_stability() {
        assert_eq!(ChangeCode::ColumnDropped.as_str(), "COLUMN_DROPPED");
        assert_eq!(ChangeCode::TypeWidened.as_str(), "TYPE_WIDENED");
        for code in ChangeCode::ALL {
            assert_eq!(ChangeCode::from_code(code.as_str()), Some(code));
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
        assert_eq!(ChangeCode::from_code("NOPE"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(DiffSeverity::Info < DiffSeverity::Warning);
        assert!(DiffSeverity::Warning < DiffSeverity::Error);
        assert_eq!(
            DiffSeverity::max_of([DiffSeverity::Info, DiffSeverity::Error, DiffSeverity::Warning]),
            Some(DiffSeverity::Error)
        );
        assert_eq!(DiffSeverity::max_of(Vec::new()), None);
    }

    #[test]
    fn severity_serialization_accepts_lowercase() {
        assert_eq!(serde_json::to_string(&DiffSeverity::Warning).unwrap(), "\"WARNING\"");
        let parsed: DiffSeverity = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(parsed, DiffSeverity::Warning);
        let parsed: DiffSeverity = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(parsed, DiffSeverity::Error);
    }

    #[test]
    fn table_diff_severity_is_max_of_findings() {
        let diff = TableDiff::new("users", TableStatus::Matched).with_findings(vec![
            Finding::new(ChangeCode::CommentChanged, DiffSeverity::Info, "name", "comment"),
            Finding::new(ChangeCode::ColumnAdded, DiffSeverity::Warning, "email", "added"),
        ]);
        assert_eq!(diff.severity, Some(DiffSeverity::Warning));
        assert!(diff.has_diffs);
        assert_eq!(diff.count(DiffSeverity::Info), 1);
        assert_eq!(diff.findings_with(ChangeCode::ColumnAdded).count(), 1);

        let empty = TableDiff::new("users", TableStatus::Matched).with_findings(Vec::new());
        assert_eq!(empty.severity, None);
        assert!(!empty.has_diffs);
    }

    #[test]
    fn schema_diff_aggregation() {
        let clean = TableDiff::new("a", TableStatus::Matched).with_findings(Vec::new());
        let dropped = TableDiff::new("b", TableStatus::Removed).with_findings(vec![Finding::new(
            ChangeCode::TableDropped,
            DiffSeverity::Error,
            "b",
            "dropped",
        )]);

        let diff = SchemaDiff::from_tables(vec![clean, dropped]);
        assert_eq!(diff.severity, Some(DiffSeverity::Error));
        assert!(diff.has_diffs);
        assert_eq!(diff.changed_tables().count(), 1);
        assert!(diff.exceeds(DiffSeverity::Warning));
        assert!(diff.table("b").is_some());

        let empty = SchemaDiff::from_tables(Vec::new());
        assert!(!empty.has_diffs);
        assert!(!empty.exceeds(DiffSeverity::Info));
    }

    #[test]
    fn table_diff_field_names_are_stable() {
        let diff = TableDiff::new("users", TableStatus::Matched).with_findings(Vec::new());
        let json = serde_json::to_value(&diff).unwrap();
        for field in [
            "missing_columns",
            "extra_columns",
            "modified_columns",
            "severity",
            "has_diffs",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
