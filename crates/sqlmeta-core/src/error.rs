//! Validation errors raised when constructing schema objects

/// Structural problems detected while building a [`crate::Table`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Object name must not be empty")]
    EmptyName,

    #[error("Table '{table}' has a column with an empty name")]
    EmptyColumnName { table: String },

    #[error("Table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("Constraint {constraint} on table '{table}' has no columns")]
    EmptyConstraint { table: String, constraint: String },

    #[error("Constraint {constraint} on table '{table}' references unknown column '{column}'")]
    UnknownColumn {
        table: String,
        constraint: String,
        column: String,
    },

    #[error("Foreign key {constraint} on table '{table}' has no referenced table")]
    MissingReference { table: String, constraint: String },

    #[error(
        "Foreign key {constraint} on table '{table}' maps {local} column(s) onto {referenced} referenced column(s)"
    )]
    ReferenceArity {
        table: String,
        constraint: String,
        local: usize,
        referenced: usize,
    },
}
