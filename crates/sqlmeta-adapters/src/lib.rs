//! sqlmeta adapters
//!
//! Optional translators between the core model and the outside world:
//! snapshot files, SQL DDL text and markdown reports. Nothing in core or the
//! engine depends on this crate.

pub mod ddl;
pub mod markdown;
pub mod snapshot;

pub use ddl::{
    create_table_statement, create_view_statement, migration_script, quote_identifier,
    quote_qualified,
};
pub use markdown::render_report;
pub use snapshot::{SchemaSnapshot, SnapshotError};
