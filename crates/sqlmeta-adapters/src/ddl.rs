//! DDL rendering and migration scripts
//!
//! Statements are rendered per dialect: identifier quoting, the ALTER COLUMN
//! grammar and how comments are attached all differ. Output is plain text;
//! nothing here executes SQL.

use sqlmeta_core::{
    Column, ColumnAttribute, Constraint, ConstraintChange, ConstraintDiff, ConstraintKind,
    Dialect, QualifiedName, SchemaDiff, Table, TableDiff, TableStatus, View,
};

/// Quote an identifier for a dialect
///
/// Embedded quote characters are doubled. `Generic` leaves identifiers bare.
pub fn quote_identifier(dialect: Dialect, identifier: &str) -> String {
    if identifier.is_empty() {
        return String::new();
    }
    match dialect {
        Dialect::Postgresql | Dialect::Oracle => {
            format!("\"{}\"", identifier.replace('"', "\"\""))
        }
        Dialect::Mysql => format!("`{}`", identifier.replace('`', "``")),
        Dialect::Mssql => format!("[{}]", identifier.replace(']', "]]")),
        Dialect::Generic => identifier.to_string(),
    }
}

/// Quote a possibly schema-qualified name
pub fn quote_qualified(dialect: Dialect, name: &QualifiedName) -> String {
    match &name.schema {
        Some(schema) => format!(
            "{}.{}",
            quote_identifier(dialect, schema),
            quote_identifier(dialect, &name.name)
        ),
        None => quote_identifier(dialect, &name.name),
    }
}

fn quote_list(dialect: Dialect, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(dialect, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `name TYPE [NOT NULL] [DEFAULT expr]`
fn column_definition(dialect: Dialect, column: &Column, not_null: bool) -> String {
    let mut def = format!(
        "{} {}",
        quote_identifier(dialect, &column.name),
        column.data_type.trim()
    );
    if let Some(default) = &column.default_value {
        def.push_str(&format!(" DEFAULT {}", default));
    }
    if not_null {
        def.push_str(" NOT NULL");
    }
    if dialect == Dialect::Mysql {
        if let Some(comment) = &column.comment {
            def.push_str(&format!(" COMMENT {}", string_literal(comment)));
        }
    }
    def
}

/// Constraint body as it appears in CREATE TABLE and ALTER TABLE ADD
fn constraint_clause(dialect: Dialect, constraint: &Constraint) -> String {
    let prefix = constraint
        .name
        .as_ref()
        .map(|n| format!("CONSTRAINT {} ", quote_identifier(dialect, n)))
        .unwrap_or_default();

    let body = match constraint.kind {
        ConstraintKind::ForeignKey => {
            let target = constraint
                .references
                .as_ref()
                .map(|r| {
                    let columns = if r.columns.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", quote_list(dialect, &r.columns))
                    };
                    format!(" REFERENCES {}{}", quote_qualified(dialect, &r.table), columns)
                })
                .unwrap_or_default();
            format!("FOREIGN KEY ({}){}", quote_list(dialect, &constraint.columns), target)
        }
        ConstraintKind::Check => format!(
            "CHECK ({})",
            constraint.check_expression.as_deref().unwrap_or("TRUE")
        ),
        kind => format!("{} ({})", kind.sql_keyword(), quote_list(dialect, &constraint.columns)),
    };

    format!("{}{}", prefix, body)
}

fn comment_statements(dialect: Dialect, table: &Table) -> Vec<String> {
    if !matches!(dialect, Dialect::Postgresql | Dialect::Oracle) {
        return Vec::new();
    }
    let name = quote_qualified(dialect, table.name());
    let mut statements = Vec::new();
    if let Some(comment) = table.comment() {
        statements.push(format!("COMMENT ON TABLE {} IS {};", name, string_literal(comment)));
    }
    for column in table.columns() {
        if let Some(comment) = &column.comment {
            statements.push(format!(
                "COMMENT ON COLUMN {}.{} IS {};",
                name,
                quote_identifier(dialect, &column.name),
                string_literal(comment)
            ));
        }
    }
    statements
}

/// Render `CREATE TABLE` for a table in its own dialect
///
/// NOT_NULL constraints are folded into the column definitions; column
/// primary-key flags become a table-level PRIMARY KEY clause when none is
/// declared.
pub fn create_table_statement(table: &Table) -> String {
    let dialect = table.dialect();

    let mut lines: Vec<String> = table
        .effective_columns()
        .iter()
        .map(|c| column_definition(dialect, c, !c.nullable))
        .collect();

    lines.extend(
        table
            .effective_constraints()
            .iter()
            .map(|c| constraint_clause(dialect, c)),
    );

    let mut sql = format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_qualified(dialect, table.name()),
        lines.join(",\n    ")
    );
    if dialect == Dialect::Mysql {
        if let Some(comment) = table.comment() {
            sql.push_str(&format!(" COMMENT={}", string_literal(comment)));
        }
    }
    sql.push(';');

    for statement in comment_statements(dialect, table) {
        sql.push('\n');
        sql.push_str(&statement);
    }
    sql
}

/// Render `CREATE VIEW`
pub fn create_view_statement(view: &View) -> String {
    let name = match &view.schema {
        Some(schema) => QualifiedName::qualified(schema.clone(), view.name.clone()),
        None => QualifiedName::new(view.name.clone()),
    };
    let columns = if view.columns.is_empty() {
        String::new()
    } else {
        format!(" ({})", quote_list(view.dialect, &view.columns))
    };
    format!(
        "CREATE VIEW {}{} AS\n{};",
        quote_qualified(view.dialect, &name),
        columns,
        view.definition.trim().trim_end_matches(';')
    )
}

/// Render a migration that turns `source` into `target`
///
/// Walks the diff in order. Tables are looked up by qualified name in the
/// given slices; statements use the target table's dialect (the source's for
/// dropped tables). Changes that cannot be expressed safely in a dialect are
/// emitted as `--` comments.
pub fn migration_script(diff: &SchemaDiff, source: &[Table], target: &[Table]) -> String {
    fn find<'a>(tables: &'a [Table], name: &str) -> Option<&'a Table> {
        tables.iter().find(|t| t.name().to_string() == name)
    }

    let mut blocks = Vec::new();
    for table_diff in diff.changed_tables() {
        let source_table = find(source, &table_diff.table_name);
        let target_table = find(target, &table_diff.table_name);

        let statements = match (table_diff.status, source_table, target_table) {
            (TableStatus::Added, _, Some(t)) => vec![create_table_statement(t)],
            (TableStatus::Removed, Some(s), _) => {
                vec![format!("DROP TABLE {};", quote_qualified(s.dialect(), s.name()))]
            }
            (TableStatus::Matched, _, Some(t)) => alter_statements(table_diff, t),
            _ => vec![format!("-- {}: table definition not available", table_diff.table_name)],
        };

        blocks.push(format!("-- Table: {}\n{}", table_diff.table_name, statements.join("\n")));
    }

    blocks.join("\n\n")
}

fn find_by_name<'a>(columns: &'a [Column], name: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.name == name)
}

fn alter_statements(diff: &TableDiff, target: &Table) -> Vec<String> {
    let dialect = target.dialect();
    let table = quote_qualified(dialect, target.name());
    let alter = |body: String| format!("ALTER TABLE {} {};", table, body);
    let mut out = Vec::new();

    let target_columns = target.effective_columns();
    let target_constraints = target.effective_constraints();

    for cd in &diff.constraint_diffs {
        if matches!(cd.change, ConstraintChange::Removed | ConstraintChange::Changed) {
            out.push(drop_constraint(dialect, &table, cd, cd.source_name.as_deref()));
        }
    }

    for name in &diff.extra_columns {
        out.push(alter(format!("DROP COLUMN {}", quote_identifier(dialect, name))));
    }

    for name in &diff.missing_columns {
        if let Some(column) = find_by_name(&target_columns, name) {
            let keyword = match dialect {
                Dialect::Oracle | Dialect::Mssql => "ADD",
                _ => "ADD COLUMN",
            };
            out.push(alter(format!(
                "{} {}",
                keyword,
                column_definition(dialect, column, !column.nullable)
            )));
        }
    }

    for modified in &diff.modified_columns {
        let Some(column) = find_by_name(&target_columns, &modified.column_name) else {
            continue;
        };
        out.extend(modify_column(
            dialect,
            &table,
            column,
            modified.type_mismatch,
            modified.nullable_mismatch,
        ));
    }

    for change in &diff.attribute_changes {
        let Some(column) = find_by_name(&target_columns, &change.column_name) else {
            continue;
        };
        let name = quote_identifier(dialect, &column.name);
        let statement = match (change.attribute, dialect) {
            (ColumnAttribute::Default, Dialect::Mssql) => format!(
                "-- {}: default changes require dropping the named default constraint",
                column.name
            ),
            (ColumnAttribute::Default, Dialect::Oracle) => alter(format!(
                "MODIFY ({} DEFAULT {})",
                name,
                change.target.as_deref().unwrap_or("NULL")
            )),
            (ColumnAttribute::Default, _) => match &change.target {
                Some(default) => alter(format!("ALTER COLUMN {} SET DEFAULT {}", name, default)),
                None => alter(format!("ALTER COLUMN {} DROP DEFAULT", name)),
            },
            (ColumnAttribute::Comment, Dialect::Postgresql | Dialect::Oracle) => format!(
                "COMMENT ON COLUMN {}.{} IS {};",
                table,
                name,
                change
                    .target
                    .as_deref()
                    .map(string_literal)
                    .unwrap_or_else(|| "NULL".to_string())
            ),
            (ColumnAttribute::Comment, Dialect::Mysql) => alter(format!(
                "MODIFY COLUMN {}",
                column_definition(dialect, column, !column.nullable)
            )),
            (ColumnAttribute::Comment, _) => format!("-- {}: comment changed", column.name),
        };
        out.push(statement);
    }

    for cd in &diff.constraint_diffs {
        if matches!(cd.change, ConstraintChange::Added | ConstraintChange::Changed) {
            let constraint = locate(&target_constraints, cd);
            out.push(alter(format!("ADD {}", constraint_clause(dialect, &constraint))));
        }
    }

    out
}

fn modify_column(
    dialect: Dialect,
    table: &str,
    column: &Column,
    type_changed: bool,
    nullability_changed: bool,
) -> Vec<String> {
    let name = quote_identifier(dialect, &column.name);
    let data_type = column.data_type.trim();
    let null = if column.nullable { "NULL" } else { "NOT NULL" };

    match dialect {
        Dialect::Mysql => vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            table,
            column_definition(dialect, column, !column.nullable)
        )],
        Dialect::Mssql => vec![format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {};",
            table, name, data_type, null
        )],
        Dialect::Oracle => {
            let mut parts = vec![name];
            if type_changed {
                parts.push(data_type.to_string());
            }
            if nullability_changed {
                parts.push(null.to_string());
            }
            vec![format!("ALTER TABLE {} MODIFY ({});", table, parts.join(" "))]
        }
        Dialect::Postgresql | Dialect::Generic => {
            let mut out = Vec::new();
            if type_changed {
                out.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
                    table, name, data_type
                ));
            }
            if nullability_changed {
                let action = if column.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
                out.push(format!("ALTER TABLE {} ALTER COLUMN {} {};", table, name, action));
            }
            out
        }
    }
}

fn drop_constraint(
    dialect: Dialect,
    table: &str,
    diff: &ConstraintDiff,
    name: Option<&str>,
) -> String {
    match (name, diff.kind, dialect) {
        (_, ConstraintKind::PrimaryKey, Dialect::Mysql) => {
            format!("ALTER TABLE {} DROP PRIMARY KEY;", table)
        }
        (Some(name), ConstraintKind::ForeignKey, Dialect::Mysql) => format!(
            "ALTER TABLE {} DROP FOREIGN KEY {};",
            table,
            quote_identifier(dialect, name)
        ),
        (Some(name), _, _) => format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            table,
            quote_identifier(dialect, name)
        ),
        (None, ConstraintKind::NotNull, _) => format!(
            "-- NOT NULL on ({}) is dropped with the column nullability",
            diff.columns.join(", ")
        ),
        (None, _, _) => format!("-- drop unnamed constraint {} manually", diff.describe()),
    }
}

/// The declared target constraint a diff entry refers to
///
/// Diffs carry sorted identity columns; the declared order matters for
/// foreign keys, so the declared constraint is looked up first.
fn locate(constraints: &[Constraint], diff: &ConstraintDiff) -> Constraint {
    let (name, reference, expression) = (
        &diff.target_name,
        &diff.target_reference,
        &diff.target_expression,
    );

    constraints
        .iter()
        .find(|c| {
            let identity = c.identity();
            identity.kind == diff.kind
                && identity.columns == diff.columns
                && &c.name == name
                && &c.references == reference
                && &c.check_expression == expression
        })
        .cloned()
        .unwrap_or_else(|| Constraint {
            kind: diff.kind,
            name: name.clone(),
            columns: diff.columns.clone(),
            references: reference.clone(),
            check_expression: expression.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlmeta_core::ForeignKeyReference;

    fn users(dialect: Dialect) -> Table {
        Table::builder("users")
            .schema("public")
            .dialect(dialect)
            .column(Column::new("id", "SERIAL").primary_key())
            .column(Column::new("email", "VARCHAR(255)").not_null().with_comment("login"))
            .column(Column::new("created_at", "TIMESTAMP").with_default("CURRENT_TIMESTAMP"))
            .constraint(Constraint::unique(["email"]).with_name("uq_users_email"))
            .build()
            .unwrap()
    }

    #[test]
    fn identifier_quoting_per_dialect() {
        assert_eq!(quote_identifier(Dialect::Postgresql, "order"), "\"order\"");
        assert_eq!(quote_identifier(Dialect::Oracle, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier(Dialect::Mysql, "order"), "`order`");
        assert_eq!(quote_identifier(Dialect::Mssql, "order"), "[order]");
        assert_eq!(quote_identifier(Dialect::Generic, "order"), "order");
        assert_eq!(quote_identifier(Dialect::Mysql, ""), "");
    }

    #[test]
    fn create_table_postgres() {
        let sql = create_table_statement(&users(Dialect::Postgresql));
        assert_eq!(
            sql,
            "CREATE TABLE \"public\".\"users\" (\n    \
             \"id\" SERIAL NOT NULL,\n    \
             \"email\" VARCHAR(255) NOT NULL,\n    \
             \"created_at\" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,\n    \
             CONSTRAINT \"uq_users_email\" UNIQUE (\"email\"),\n    \
             PRIMARY KEY (\"id\")\n\
             );\n\
             COMMENT ON COLUMN \"public\".\"users\".\"email\" IS 'login';"
        );
    }

    #[test]
    fn create_table_mysql_inlines_comments() {
        let sql = create_table_statement(&users(Dialect::Mysql));
        assert!(sql.contains("`email` VARCHAR(255) NOT NULL COMMENT 'login'"));
        assert!(!sql.contains("COMMENT ON"));
    }

    #[test]
    fn not_null_constraints_render_inline() {
        let table = Table::builder("t")
            .dialect(Dialect::Postgresql)
            .column(Column::new("a", "TEXT"))
            .constraint(Constraint::not_null("a"))
            .build()
            .unwrap();
        assert_eq!(
            create_table_statement(&table),
            "CREATE TABLE \"t\" (\n    \"a\" TEXT NOT NULL\n);"
        );
    }

    #[test]
    fn foreign_keys_and_checks() {
        let table = Table::builder("orders")
            .dialect(Dialect::Mssql)
            .column(Column::new("user_id", "INT"))
            .column(Column::new("total", "DECIMAL(10,2)"))
            .constraint(Constraint::foreign_key(
                ["user_id"],
                ForeignKeyReference::new(QualifiedName::qualified("dbo", "users"), ["id"]),
            ))
            .constraint(Constraint::check("total >= 0", ["total"]).with_name("ck_total"))
            .build()
            .unwrap();
        let sql = create_table_statement(&table);
        assert!(sql.contains("FOREIGN KEY ([user_id]) REFERENCES [dbo].[users] ([id])"));
        assert!(sql.contains("CONSTRAINT [ck_total] CHECK (total >= 0)"));
    }

    #[test]
    fn create_view() {
        let view = View::new("active_users", "SELECT id FROM users WHERE active;")
            .with_schema("app")
            .with_dialect(Dialect::Postgresql)
            .with_columns(["id"]);
        assert_eq!(
            create_view_statement(&view),
            "CREATE VIEW \"app\".\"active_users\" (\"id\") AS\nSELECT id FROM users WHERE active;"
        );
    }

    #[test]
    fn modify_column_grammar() {
        let column = Column::new("name", "VARCHAR(200)").not_null();
        assert_eq!(
            modify_column(Dialect::Postgresql, "t", &column, true, true),
            vec![
                "ALTER TABLE t ALTER COLUMN \"name\" TYPE VARCHAR(200);",
                "ALTER TABLE t ALTER COLUMN \"name\" SET NOT NULL;",
            ]
        );
        assert_eq!(
            modify_column(Dialect::Mysql, "t", &column, true, false),
            vec!["ALTER TABLE t MODIFY COLUMN `name` VARCHAR(200) NOT NULL;"]
        );
        assert_eq!(
            modify_column(Dialect::Oracle, "t", &column, false, true),
            vec!["ALTER TABLE t MODIFY (\"name\" NOT NULL);"]
        );
        assert_eq!(
            modify_column(Dialect::Mssql, "t", &column, true, true),
            vec!["ALTER TABLE t ALTER COLUMN [name] VARCHAR(200) NOT NULL;"]
        );
    }
}
