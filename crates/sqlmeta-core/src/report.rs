//! Diff report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::diff::{DiffSeverity, SchemaDiff, TableStatus};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of table diffs (matched, added and removed)
    pub tables_compared: usize,

    /// Number of tables with at least one difference
    pub tables_with_diffs: usize,

    /// Tables present only in the target
    pub tables_added: usize,

    /// Tables present only in the source
    pub tables_removed: usize,

    /// Number of error findings
    pub errors: usize,

    /// Number of warning findings
    pub warnings: usize,

    /// Number of info findings
    pub info: usize,
}

/// Comparison report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Aggregate severity (absent when the schemas match)
    pub severity: Option<DiffSeverity>,

    /// Full schema diff
    pub diff: SchemaDiff,

    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Report {
    /// Create a report from a schema diff
    pub fn from_schema_diff(diff: SchemaDiff) -> Self {
        let summary = ReportSummary {
            tables_compared: diff.tables.len(),
            tables_with_diffs: diff.changed_tables().count(),
            tables_added: diff.tables.iter().filter(|t| t.status == TableStatus::Added).count(),
            tables_removed: diff.tables.iter().filter(|t| t.status == TableStatus::Removed).count(),
            errors: diff.count(DiffSeverity::Error),
            warnings: diff.count(DiffSeverity::Warning),
            info: diff.count(DiffSeverity::Info),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            severity: diff.severity,
            diff,
            metadata: None,
        }
    }

    /// Attach free-form metadata (source/target file names, tool version, ...)
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
