//! Test fixtures for comparator integration tests
//!
//! Reusable table definitions in the shapes real catalogs produce: the same
//! logical table spelled by different dialects, with system-generated and
//! hand-written constraint names.

#![allow(dead_code)]

use sqlmeta_core::{Column, Constraint, Dialect, ForeignKeyReference, QualifiedName, Table};

/// `users(id INTEGER PK, name VARCHAR(100))`
pub fn users_v1() -> Table {
    Table::builder("users")
        .dialect(Dialect::Postgresql)
        .column(Column::new("id", "INTEGER").primary_key())
        .column(Column::new("name", "VARCHAR(100)"))
        .build()
        .unwrap()
}

/// [`users_v1`] plus `email VARCHAR(255) NOT NULL`
pub fn users_v2() -> Table {
    Table::builder("users")
        .dialect(Dialect::Postgresql)
        .column(Column::new("id", "INTEGER").primary_key())
        .column(Column::new("name", "VARCHAR(100)"))
        .column(Column::new("email", "VARCHAR(255)").not_null())
        .build()
        .unwrap()
}

/// Users table as PostgreSQL spells it
pub fn users_postgres() -> Table {
    Table::builder("users")
        .dialect(Dialect::Postgresql)
        .column(Column::new("id", "SERIAL").not_null())
        .column(Column::new("email", "character varying(255)").not_null())
        .column(Column::new("active", "bool"))
        .column(Column::new("score", "int4"))
        .constraint(Constraint::primary_key(["id"]).with_name("users_pkey"))
        .build()
        .unwrap()
}

/// Same logical table as MySQL spells it
pub fn users_mysql() -> Table {
    Table::builder("users")
        .dialect(Dialect::Mysql)
        .column(Column::new("id", "INT(11) AUTO_INCREMENT").not_null())
        .column(Column::new("email", "VARCHAR(255)").not_null())
        .column(Column::new("active", "TINYINT(1)"))
        .column(Column::new("score", "INT(11)"))
        .constraint(Constraint::primary_key(["id"]).with_name("PRIMARY"))
        .build()
        .unwrap()
}

/// Orders table with a system-generated Oracle constraint name
pub fn orders_oracle(pk_name: &str) -> Table {
    Table::builder("orders")
        .schema("sales")
        .dialect(Dialect::Oracle)
        .column(Column::new("id", "NUMBER(10)").not_null())
        .column(Column::new("user_id", "NUMBER(10)").not_null())
        .column(Column::new("total", "NUMBER(12,2)"))
        .constraint(Constraint::primary_key(["id"]).with_name(pk_name))
        .constraint(
            Constraint::foreign_key(
                ["user_id"],
                ForeignKeyReference::new(QualifiedName::qualified("sales", "users"), ["id"]),
            )
            .with_name("fk_orders_users"),
        )
        .build()
        .unwrap()
}

/// A table with `count` columns whose types cycle through common spellings
pub fn wide_table(name: &str, count: usize, dialect: Dialect) -> Table {
    const TYPES: &[&str] = &[
        "INTEGER",
        "VARCHAR(100)",
        "TEXT",
        "DECIMAL(10,2)",
        "TIMESTAMP",
        "BOOLEAN",
    ];
    let columns = (0..count).map(|i| Column::new(format!("col_{i}"), TYPES[i % TYPES.len()]));
    Table::builder(name)
        .dialect(dialect)
        .column(Column::new("id", "BIGINT").primary_key())
        .columns(columns)
        .build()
        .unwrap()
}
