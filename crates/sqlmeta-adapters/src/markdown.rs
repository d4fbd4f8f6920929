//! Markdown rendering of comparison reports

use sqlmeta_core::{DiffSeverity, Report, TableDiff, TableStatus};

fn severity_emoji(severity: DiffSeverity) -> &'static str {
    match severity {
        DiffSeverity::Error => "❌",
        DiffSeverity::Warning => "⚠️",
        DiffSeverity::Info => "ℹ️",
    }
}

/// Generate a markdown report
pub fn render_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Schema Diff Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Tables compared: {}\n", report.summary.tables_compared));
    md.push_str(&format!("- Tables with differences: {}\n", report.summary.tables_with_diffs));
    md.push_str(&format!("- Tables added: {}\n", report.summary.tables_added));
    md.push_str(&format!("- Tables removed: {}\n", report.summary.tables_removed));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- Info: {}\n", report.summary.info));
    md.push('\n');

    if !report.diff.has_diffs {
        md.push_str("✅ **Schemas match!**\n");
        return md;
    }

    md.push_str("## Tables\n\n");
    for table in report.diff.changed_tables() {
        render_table(&mut md, table);
    }

    md
}

fn render_table(md: &mut String, table: &TableDiff) {
    let status = match table.status {
        TableStatus::Matched => "changed",
        TableStatus::Added => "added",
        TableStatus::Removed => "removed",
    };
    let emoji = table.severity.map(severity_emoji).unwrap_or("");
    md.push_str(&format!("### {} `{}` ({})\n\n", emoji, table.table_name, status));

    if !table.modified_columns.is_empty() {
        md.push_str("| Column | Source | Target | Severity |\n");
        md.push_str("|---|---|---|---|\n");
        for column in &table.modified_columns {
            let source = describe_column(&column.source_type, column.source_nullable);
            let target = describe_column(&column.target_type, column.target_nullable);
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | {} |\n",
                column.column_name, source, target, column.severity
            ));
        }
        md.push('\n');
    }

    for finding in &table.findings {
        md.push_str(&format!(
            "- {} **{}** `{}`: {}\n",
            severity_emoji(finding.severity),
            finding.severity,
            finding.code,
            finding.message
        ));
    }
    md.push('\n');
}

fn describe_column(data_type: &str, nullable: bool) -> String {
    if nullable {
        data_type.to_string()
    } else {
        format!("{} NOT NULL", data_type)
    }
}
