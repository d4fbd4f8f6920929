//! Table and schema comparison
//!
//! The comparator is a pure function of its inputs and configuration: it
//! holds no mutable state and never fails. Table pairs are independent, so
//! with the `parallel` feature they are compared on the rayon pool; output
//! order is the same either way.

use crate::columns::{compare_columns, ColumnSet};
use crate::constraints::compare_constraints;
use crate::normalize::TypeNormalizer;
use crate::severity::SeverityClassifier;
use sqlmeta_core::{
    AllowlistRules, ChangeCode, Config, QualifiedName, SchemaDiff, SeverityRules, Table, TableDiff,
    TableStatus,
};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How a table lines up between the two schemas
#[derive(Debug, Clone, Copy)]
enum Pairing<'a> {
    Matched(&'a Table, &'a Table),
    Added(&'a Table),
    Removed(&'a Table),
}

/// Structural schema comparator
#[derive(Debug, Clone, Default)]
pub struct SchemaComparator {
    normalizer: TypeNormalizer,
    rules: SeverityRules,
    allowlist: AllowlistRules,
}

impl SchemaComparator {
    /// Comparator with the built-in severity table and no skipped tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator using the severity overrides and allowlist from a config
    pub fn from_config(config: &Config) -> Self {
        Self {
            normalizer: TypeNormalizer::new(),
            rules: config.severity.clone(),
            allowlist: config.allowlist.clone(),
        }
    }

    /// Replace the type normalizer (e.g. one with custom aliases)
    pub fn with_normalizer(mut self, normalizer: TypeNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &TypeNormalizer {
        &self.normalizer
    }

    /// Compare one table pair
    ///
    /// Names are not checked; the diff is reported under the target's name.
    pub fn compare_tables(&self, source: &Table, target: &Table) -> TableDiff {
        let classifier = SeverityClassifier::new(&self.rules);

        let source_columns = source.effective_columns();
        let target_columns = target.effective_columns();
        let columns = compare_columns(
            ColumnSet::new(source.dialect(), &source_columns),
            ColumnSet::new(target.dialect(), &target_columns),
            &self.normalizer,
            &classifier,
        );
        let constraints = compare_constraints(
            &source.effective_constraints(),
            &target.effective_constraints(),
            &classifier,
        );
        let (constraint_diffs, constraint_findings) = constraints.into_diffs();

        let mut findings = columns.findings;
        findings.extend(constraint_findings);

        let mut diff = TableDiff::new(target.name().to_string(), TableStatus::Matched);
        diff.source_dialect = Some(source.dialect());
        diff.target_dialect = Some(target.dialect());
        diff.missing_columns = columns.missing;
        diff.extra_columns = columns.extra;
        diff.modified_columns = columns.modified;
        diff.attribute_changes = columns.attribute_changes;
        diff.constraint_diffs = constraint_diffs;

        let diff = diff.with_findings(findings);
        tracing::debug!(
            table = %diff.table_name,
            severity = ?diff.severity,
            findings = diff.findings.len(),
            "compared table"
        );
        diff
    }

    /// Diff for a table that exists only in the target
    pub fn table_added(&self, target: &Table) -> TableDiff {
        let classifier = SeverityClassifier::new(&self.rules);
        let name = target.name().to_string();

        let mut diff = TableDiff::new(name.clone(), TableStatus::Added);
        diff.target_dialect = Some(target.dialect());
        diff.missing_columns = target.columns().iter().map(|c| c.name.clone()).collect();

        let message = format!("Table '{}' was added ({} columns)", name, target.columns().len());
        diff.with_findings(vec![classifier.finding(ChangeCode::TableAdded, name, message)])
    }

    /// Diff for a table that exists only in the source
    pub fn table_removed(&self, source: &Table) -> TableDiff {
        let classifier = SeverityClassifier::new(&self.rules);
        let name = source.name().to_string();

        let mut diff = TableDiff::new(name.clone(), TableStatus::Removed);
        diff.source_dialect = Some(source.dialect());
        diff.extra_columns = source.columns().iter().map(|c| c.name.clone()).collect();

        let message = format!("Table '{}' was dropped", name);
        diff.with_findings(vec![classifier.finding(ChangeCode::TableDropped, name, message)])
    }

    /// Compare two schemas
    ///
    /// Tables pair by exact qualified name. Output lists target tables in
    /// order, then source-only tables in source order. Tables matching the
    /// allowlist's skip patterns are left out entirely.
    ///
    /// Qualified names are expected to be unique on each side (as
    /// `SchemaSnapshot` enforces). A repeated source name pairs through its
    /// first table; a repeated target name is compared once per occurrence.
    /// Both are logged as warnings.
    pub fn compare_schemas(&self, source: &[Table], target: &[Table]) -> SchemaDiff {
        let source: Vec<&Table> = source.iter().filter(|t| !self.is_skipped(t)).collect();
        let target: Vec<&Table> = target.iter().filter(|t| !self.is_skipped(t)).collect();

        let mut source_by_name: HashMap<&QualifiedName, &Table> = HashMap::new();
        for &table in &source {
            match source_by_name.entry(table.name()) {
                Entry::Occupied(_) => {
                    tracing::warn!(table = %table.name(), "duplicate table name in source schema");
                }
                Entry::Vacant(slot) => {
                    slot.insert(table);
                }
            }
        }
        let mut target_names: HashSet<&QualifiedName> = HashSet::new();
        for table in &target {
            if !target_names.insert(table.name()) {
                tracing::warn!(table = %table.name(), "duplicate table name in target schema");
            }
        }

        let mut pairings: Vec<Pairing<'_>> = target
            .iter()
            .map(|&t| match source_by_name.get(t.name()) {
                Some(&s) => Pairing::Matched(s, t),
                None => Pairing::Added(t),
            })
            .collect();
        pairings.extend(
            source
                .iter()
                .filter(|s| !target_names.contains(s.name()))
                .map(|&s| Pairing::Removed(s)),
        );

        let tables = self.run(&pairings);
        let diff = SchemaDiff::from_tables(tables);

        tracing::debug!(
            tables = diff.tables.len(),
            changed = diff.changed_tables().count(),
            severity = ?diff.severity,
            "compared schemas"
        );
        diff
    }

    fn is_skipped(&self, table: &Table) -> bool {
        let skipped = self.allowlist.is_table_skipped(&table.name().to_string())
            || self.allowlist.is_table_skipped(&table.name().name);
        if skipped {
            tracing::trace!(table = %table.name(), "skipping table");
        }
        skipped
    }

    fn diff_pairing(&self, pairing: &Pairing<'_>) -> TableDiff {
        match *pairing {
            Pairing::Matched(source, target) => self.compare_tables(source, target),
            Pairing::Added(target) => self.table_added(target),
            Pairing::Removed(source) => self.table_removed(source),
        }
    }

    #[cfg(feature = "parallel")]
    fn run(&self, pairings: &[Pairing<'_>]) -> Vec<TableDiff> {
        pairings.par_iter().map(|p| self.diff_pairing(p)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run(&self, pairings: &[Pairing<'_>]) -> Vec<TableDiff> {
        pairings.iter().map(|p| self.diff_pairing(p)).collect()
    }
}

/// Compare two tables with default settings
pub fn compare_tables(source: &Table, target: &Table) -> TableDiff {
    SchemaComparator::new().compare_tables(source, target)
}

/// Compare two schemas with default settings
pub fn compare_schemas(source: &[Table], target: &[Table]) -> SchemaDiff {
    SchemaComparator::new().compare_schemas(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlmeta_core::{Column, Constraint, Dialect, DiffSeverity};

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table::builder(name)
            .dialect(Dialect::Postgresql)
            .columns(columns)
            .build()
            .unwrap()
    }

    #[test]
    fn identical_tables() {
        let users = table("users", vec![Column::new("id", "INT").primary_key()]);
        let diff = compare_tables(&users, &users);
        assert!(!diff.has_diffs);
        assert_eq!(diff.severity, None);
        assert_eq!(diff.status, TableStatus::Matched);
        assert_eq!(diff.source_dialect, Some(Dialect::Postgresql));
    }

    #[test]
    fn column_flag_primary_key_equals_declared_constraint() {
        let flagged = table("users", vec![Column::new("id", "INT").primary_key()]);
        let declared = Table::builder("users")
            .dialect(Dialect::Postgresql)
            .column(Column::new("id", "INT").not_null())
            .constraint(Constraint::primary_key(["id"]).with_name("pk_users"))
            .build()
            .unwrap();
        assert!(!compare_tables(&flagged, &declared).has_diffs);
    }

    #[test]
    fn not_null_flag_equals_declared_constraint() {
        let flagged = table("t", vec![Column::new("a", "TEXT").not_null()]);
        let declared = Table::builder("t")
            .dialect(Dialect::Postgresql)
            .column(Column::new("a", "TEXT"))
            .constraint(Constraint::not_null("a"))
            .build()
            .unwrap();
        assert!(!compare_tables(&flagged, &declared).has_diffs);
        assert!(!compare_tables(&declared, &flagged).has_diffs);

        let nullable = table("t", vec![Column::new("a", "TEXT")]);
        let diff = compare_tables(&nullable, &declared);
        let codes: Vec<_> = diff.findings.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec![ChangeCode::NullabilityTightened]);
        assert!(diff.constraint_diffs.is_empty());
    }

    #[test]
    fn table_severity_is_max_of_findings() {
        let source = table("t", vec![Column::new("a", "INT"), Column::new("b", "TEXT")]);
        let target = table("t", vec![Column::new("a", "BIGINT"), Column::new("c", "TEXT")]);
        let diff = compare_tables(&source, &target);
        assert_eq!(diff.severity, Some(DiffSeverity::Error));
        assert_eq!(diff.extra_columns, vec!["b"]);
        assert_eq!(diff.missing_columns, vec!["c"]);
        assert_eq!(diff.modified_columns.len(), 1);
    }

    #[test]
    fn schema_output_order() {
        let source = vec![
            table("legacy", vec![Column::new("id", "INT")]),
            table("users", vec![Column::new("id", "INT")]),
        ];
        let target = vec![
            table("users", vec![Column::new("id", "INT")]),
            table("orders", vec![Column::new("id", "INT")]),
        ];
        let diff = compare_schemas(&source, &target);
        let names: Vec<_> = diff.tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["users", "orders", "legacy"]);
        assert_eq!(diff.tables[1].status, TableStatus::Added);
        assert_eq!(diff.tables[1].missing_columns, vec!["id"]);
        assert_eq!(diff.tables[2].status, TableStatus::Removed);
        assert_eq!(diff.severity, Some(DiffSeverity::Error));
    }

    #[test]
    fn skipped_tables_are_ignored() {
        let config =
            Config::from_toml("[allowlist]\nskip_tables = [\"tmp_*\", \"*_tmp_*\"]").unwrap();
        let comparator = SchemaComparator::from_config(&config);
        let source = vec![
            table("tmp_import", vec![Column::new("x", "INT")]),
            table("orders_tmp_2024", vec![Column::new("x", "INT")]),
        ];
        let diff = comparator.compare_schemas(&source, &[]);
        assert!(diff.tables.is_empty());
        assert!(!diff.has_diffs);
        assert_eq!(diff.severity, None);
    }

    #[test]
    fn duplicate_target_names_are_each_compared() {
        let users = table("users", vec![Column::new("id", "INT")]);
        let diff = compare_schemas(&[users.clone()], &[users.clone(), users]);
        assert_eq!(diff.tables.len(), 2);
        assert!(diff.tables.iter().all(|t| t.status == TableStatus::Matched));
        assert!(!diff.has_diffs);
    }

    #[test]
    fn config_overrides_change_severity() {
        let config =
            Config::from_toml("[severity.overrides]\nTABLE_DROPPED = \"warning\"").unwrap();
        let comparator = SchemaComparator::from_config(&config);
        let source = vec![table("legacy", vec![Column::new("id", "INT")])];
        let diff = comparator.compare_schemas(&source, &[]);
        assert_eq!(diff.severity, Some(DiffSeverity::Warning));
    }

    #[test]
    fn custom_normalizer_is_used() {
        let comparator = SchemaComparator::new().with_normalizer(
            TypeNormalizer::new().with_alias(Dialect::Postgresql, "CITEXT", "TEXT"),
        );
        let source = table("t", vec![Column::new("email", "citext")]);
        let target = table("t", vec![Column::new("email", "text")]);
        assert!(!comparator.compare_tables(&source, &target).has_diffs);
        assert!(compare_tables(&source, &target).has_diffs);
    }
}
