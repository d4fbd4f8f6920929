//! sqlmeta engine - structural schema comparison
//!
//! This crate implements the comparison logic:
//! - Dialect-aware type normalization
//! - Column and constraint diffing
//! - Severity classification with configurable overrides
//! - Schema-level aggregation

pub mod columns;
pub mod comparator;
pub mod constraints;
pub mod expr;
pub mod normalize;
pub mod severity;
pub mod widening;

pub use columns::{compare_columns, ColumnComparison, ColumnSet};
pub use comparator::{compare_schemas, compare_tables, SchemaComparator};
pub use constraints::{compare_constraints, ConstraintComparison};
pub use expr::normalize_expression;
pub use normalize::{NormalizedType, TypeNormalizer, IDENTITY_INTEGER};
pub use severity::SeverityClassifier;
pub use widening::is_widening;

/// Normalize a type spelling with the built-in alias tables
pub fn normalize(dialect: sqlmeta_core::Dialect, raw_type: &str) -> NormalizedType {
    TypeNormalizer::new().normalize(dialect, raw_type)
}
