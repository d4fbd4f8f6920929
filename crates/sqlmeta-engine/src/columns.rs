//! Column-level comparison

use crate::expr::normalize_expression;
use crate::normalize::TypeNormalizer;
use crate::severity::SeverityClassifier;
use sqlmeta_core::{
    ChangeCode, Column, ColumnAttribute, ColumnAttributeDiff, ColumnDiff, Dialect, DiffSeverity,
    Finding,
};
use std::collections::HashMap;

/// Columns of one side, with the dialect their types are spelled in
#[derive(Debug, Clone, Copy)]
pub struct ColumnSet<'a> {
    pub dialect: Dialect,
    pub columns: &'a [Column],
}

impl<'a> ColumnSet<'a> {
    pub fn new(dialect: Dialect, columns: &'a [Column]) -> Self {
        Self { dialect, columns }
    }
}

/// Result of comparing two column lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnComparison {
    /// Only in target, target order
    pub missing: Vec<String>,

    /// Only in source, source order
    pub extra: Vec<String>,

    /// Type or nullability differences, target order
    pub modified: Vec<ColumnDiff>,

    /// Default and comment differences, target order
    pub attribute_changes: Vec<ColumnAttributeDiff>,

    /// One finding per classified difference
    pub findings: Vec<Finding>,
}

/// Compare columns by exact name
///
/// Findings come out as: dropped columns, then for each target column in
/// order its addition or its type, nullability, default and comment changes.
pub fn compare_columns(
    source: ColumnSet<'_>,
    target: ColumnSet<'_>,
    normalizer: &TypeNormalizer,
    classifier: &SeverityClassifier<'_>,
) -> ColumnComparison {
    let mut result = ColumnComparison::default();

    let source_by_name: HashMap<&str, &Column> =
        source.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let target_by_name: HashMap<&str, &Column> =
        target.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    for column in source.columns {
        if !target_by_name.contains_key(column.name.as_str()) {
            result.extra.push(column.name.clone());
            result.findings.push(classifier.finding(
                ChangeCode::ColumnDropped,
                &column.name,
                format!("Column '{}' ({}) was dropped", column.name, column.data_type),
            ));
        }
    }

    for target_col in target.columns {
        let Some(source_col) = source_by_name.get(target_col.name.as_str()) else {
            let normalized = normalizer.normalize_column(target.dialect, target_col);
            let code = SeverityClassifier::missing_column(target_col, &normalized);
            result.missing.push(target_col.name.clone());
            result.findings.push(classifier.finding(
                code,
                &target_col.name,
                added_message(target_col),
            ));
            continue;
        };

        compare_pair(
            source_col,
            source.dialect,
            target_col,
            target.dialect,
            normalizer,
            classifier,
            &mut result,
        );
    }

    tracing::trace!(
        missing = result.missing.len(),
        extra = result.extra.len(),
        modified = result.modified.len(),
        "compared columns"
    );

    result
}

fn compare_pair(
    source_col: &Column,
    source_dialect: Dialect,
    target_col: &Column,
    target_dialect: Dialect,
    normalizer: &TypeNormalizer,
    classifier: &SeverityClassifier<'_>,
    result: &mut ColumnComparison,
) {
    let name = &target_col.name;
    let source_type = normalizer.normalize_column(source_dialect, source_col);
    let target_type = normalizer.normalize_column(target_dialect, target_col);

    let type_mismatch = source_type != target_type;
    let nullable_mismatch = source_col.nullable != target_col.nullable;

    if type_mismatch || nullable_mismatch {
        let mut severities = Vec::new();

        if type_mismatch {
            let code = SeverityClassifier::type_change(&source_type, &target_type);
            let verb = if code == ChangeCode::TypeWidened { "widened" } else { "changed" };
            let finding = classifier.finding(
                code,
                name,
                format!(
                    "Column '{}' type {}: was {}, now {}",
                    name, verb, source_col.data_type, target_col.data_type
                ),
            );
            severities.push(finding.severity);
            result.findings.push(finding);
        }

        if let Some(code) =
            SeverityClassifier::nullability_change(source_col.nullable, target_col.nullable)
        {
            let finding = classifier.finding(
                code,
                name,
                format!(
                    "Column '{}' nullability changed: was {}, now {}",
                    name,
                    nullability(source_col.nullable),
                    nullability(target_col.nullable)
                ),
            );
            severities.push(finding.severity);
            result.findings.push(finding);
        }

        result.modified.push(ColumnDiff {
            column_name: name.clone(),
            type_mismatch,
            nullable_mismatch,
            source_type: source_col.data_type.clone(),
            target_type: target_col.data_type.clone(),
            source_nullable: source_col.nullable,
            target_nullable: target_col.nullable,
            source_normalized: source_type.to_string(),
            target_normalized: target_type.to_string(),
            severity: DiffSeverity::max_of(severities).unwrap_or(DiffSeverity::Info),
        });
    }

    let defaults_differ = match (&source_col.default_value, &target_col.default_value) {
        (Some(a), Some(b)) => normalize_expression(a) != normalize_expression(b),
        (None, None) => false,
        _ => true,
    };
    if defaults_differ {
        let finding = classifier.finding(
            ChangeCode::DefaultChanged,
            name,
            format!(
                "Column '{}' default changed: was {}, now {}",
                name,
                source_col.default_value.as_deref().unwrap_or("none"),
                target_col.default_value.as_deref().unwrap_or("none")
            ),
        );
        result.attribute_changes.push(ColumnAttributeDiff {
            column_name: name.clone(),
            attribute: ColumnAttribute::Default,
            source: source_col.default_value.clone(),
            target: target_col.default_value.clone(),
            severity: finding.severity,
        });
        result.findings.push(finding);
    }

    let source_comment = comment(source_col);
    let target_comment = comment(target_col);
    if source_comment != target_comment {
        let finding = classifier.finding(
            ChangeCode::CommentChanged,
            name,
            format!("Column '{}' comment changed", name),
        );
        result.attribute_changes.push(ColumnAttributeDiff {
            column_name: name.clone(),
            attribute: ColumnAttribute::Comment,
            source: source_comment.map(str::to_string),
            target: target_comment.map(str::to_string),
            severity: finding.severity,
        });
        result.findings.push(finding);
    }
}

fn added_message(column: &Column) -> String {
    match &column.default_value {
        Some(default) => format!(
            "Column '{}' ({}) was added with default {}",
            column.name, column.data_type, default
        ),
        None => format!(
            "Column '{}' ({} {}) was added",
            column.name,
            column.data_type,
            nullability(column.nullable)
        ),
    }
}

fn nullability(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

/// Trimmed comment; blank comments count as absent
fn comment(column: &Column) -> Option<&str> {
    column
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
}
