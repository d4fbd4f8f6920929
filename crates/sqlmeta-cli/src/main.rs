use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlmeta_adapters::{
    create_table_statement, create_view_statement, migration_script, render_report, SchemaSnapshot,
};
use sqlmeta_core::{Config, Dialect, DiffSeverity, Report, TableStatus};
use sqlmeta_engine::SchemaComparator;

/// sqlmeta - Structural diff for SQL schemas
#[derive(Parser)]
#[command(name = "sqlmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlmeta.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two schema snapshots
    Diff {
        /// Snapshot of the current schema
        source: PathBuf,

        /// Snapshot of the desired schema
        target: PathBuf,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,

        /// Also output a migration script
        #[arg(long)]
        sql: Option<PathBuf>,
    },

    /// Show the canonical form of type spellings
    Normalize {
        /// Dialect tag (postgresql, mysql, oracle, mssql, generic)
        dialect: String,

        /// Type spellings, e.g. "character varying(255)"
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// Print CREATE statements for a snapshot
    Ddl {
        /// Snapshot file
        snapshot: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    for code in config.severity.unknown_codes() {
        eprintln!("{} unknown change code in severity overrides: {}", "Warning:".yellow(), code);
    }

    if cli.verbose {
        eprintln!("{} dialect: {}", "Using".cyan(), config.dialect);
    }

    match cli.command {
        Commands::Diff {
            source,
            target,
            output,
            markdown,
            sql,
        } => diff_command(
            &config,
            &source,
            &target,
            &output,
            markdown.as_deref(),
            sql.as_deref(),
            cli.verbose,
        ),
        Commands::Normalize { dialect, types } => normalize_command(&dialect, &types),
        Commands::Ddl { snapshot } => ddl_command(&config, &snapshot),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let default_path = Path::new("sqlmeta.toml");

    if let Some(path) = path {
        Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))
    } else if default_path.exists() {
        Config::from_file(default_path).context("Failed to load sqlmeta.toml")
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Ok(Config::default())
    }
}

fn load_snapshot(path: &Path, config: &Config) -> Result<SchemaSnapshot> {
    SchemaSnapshot::from_file(path, config.dialect)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Diff command - compare two snapshots and write reports
fn diff_command(
    config: &Config,
    source_path: &Path,
    target_path: &Path,
    output: &Path,
    markdown: Option<&Path>,
    sql: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let source = load_snapshot(source_path, config)?;
    let target = load_snapshot(target_path, config)?;

    if verbose {
        eprintln!(
            "{} {} source tables, {} target tables",
            "Loaded".cyan(),
            source.tables.len(),
            target.tables.len()
        );
    }

    let comparator = SchemaComparator::from_config(config);
    let diff = comparator.compare_schemas(&source.tables, &target.tables);
    tracing::debug!(tables = diff.tables.len(), has_diffs = diff.has_diffs, "comparison finished");

    if let Some(sql_path) = sql {
        let script = migration_script(&diff, &source.tables, &target.tables);
        std::fs::write(sql_path, script)
            .with_context(|| format!("Failed to write {}", sql_path.display()))?;
        println!("{} {}", "Migration script written to:".green(), sql_path.display());
    }

    let exceeds = diff.exceeds(config.fail_on);
    let report = Report::from_schema_diff(diff).with_metadata(serde_json::json!({
        "source": source_path.display().to_string(),
        "target": target_path.display().to_string(),
        "source_dialect": source.dialect,
        "target_dialect": target.dialect,
        "fail_on": config.fail_on,
    }));

    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{} {}", "Report written to:".green(), output.display());

    if let Some(md_path) = markdown {
        std::fs::write(md_path, render_report(&report))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        println!("{} {}", "Markdown report written to:".green(), md_path.display());
    }

    print_report_summary(&report);

    if exceeds {
        std::process::exit(1);
    }

    Ok(())
}

/// Normalize command - print canonical types
fn normalize_command(dialect: &str, types: &[String]) -> Result<()> {
    let dialect = Dialect::parse(dialect);
    for raw in types {
        let normalized = sqlmeta_engine::normalize(dialect, raw);
        println!("{:<32} {} {}", raw, "->".bright_black(), normalized.to_string().bold());
    }
    Ok(())
}

/// Ddl command - render a snapshot as CREATE statements
fn ddl_command(config: &Config, path: &Path) -> Result<()> {
    let snapshot = load_snapshot(path, config)?;

    let statements: Vec<String> = snapshot
        .tables
        .iter()
        .map(create_table_statement)
        .chain(snapshot.views.iter().map(create_view_statement))
        .collect();

    println!("{}", statements.join("\n\n"));
    Ok(())
}

fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Diff Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Tables compared: {}", report.summary.tables_compared);
    println!("  With changes:    {}", report.summary.tables_with_diffs);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if !report.diff.has_diffs {
        println!("{}", "✓ Schemas match!".green().bold());
        return;
    }

    for table in report.diff.changed_tables() {
        let status = match table.status {
            TableStatus::Matched => "changed".normal(),
            TableStatus::Added => "added".green(),
            TableStatus::Removed => "removed".red(),
        };
        println!("{} ({})", table.table_name.bold(), status);

        for finding in &table.findings {
            let severity_str = match finding.severity {
                DiffSeverity::Error => "ERROR".red().bold(),
                DiffSeverity::Warning => "WARN".yellow().bold(),
                DiffSeverity::Info => "INFO".cyan(),
            };
            println!("  [{}] {}: {}", severity_str, finding.code, finding.message);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let missing = load_config(Some(Path::new("/nonexistent/sqlmeta.toml")), false);
        assert!(missing.is_err());
    }
}
