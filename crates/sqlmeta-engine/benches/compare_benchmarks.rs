//! Benchmarks for schema comparison
//!
//! Measures normalization throughput and whole-schema comparison with many
//! wide tables. Run with `--features parallel` to compare the rayon path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlmeta_core::{Column, Constraint, Dialect, Table};
use sqlmeta_engine::{SchemaComparator, TypeNormalizer};

const SPELLINGS: &[&str] = &[
    "character varying(255)",
    "INT(11) UNSIGNED",
    "TINYINT(1)",
    "timestamp(6) with time zone",
    "NVARCHAR(MAX)",
    "int4[]",
    "NUMBER(12, 2)",
    "BIGINT GENERATED ALWAYS AS IDENTITY",
];

/// Generate `num_tables` tables with `num_columns` columns each
///
/// Every fifth table gets a widened column in the target variant so the
/// comparison produces findings.
fn generate_schema(num_tables: usize, num_columns: usize, target: bool) -> Vec<Table> {
    (0..num_tables)
        .map(|t| {
            let columns = (0..num_columns).map(|c| {
                let ty = if target && t % 5 == 0 && c == 1 {
                    "VARCHAR(500)"
                } else {
                    match c % 4 {
                        0 => "INTEGER",
                        1 => "VARCHAR(100)",
                        2 => "DECIMAL(10,2)",
                        _ => "TIMESTAMP",
                    }
                };
                Column::new(format!("col_{}", c), ty)
            });

            Table::builder(format!("table_{}", t))
                .schema("bench")
                .dialect(Dialect::Postgresql)
                .column(Column::new("id", "BIGSERIAL").primary_key())
                .columns(columns)
                .constraint(Constraint::unique(["col_0", "col_1"]))
                .build()
                .unwrap()
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = TypeNormalizer::new();
    c.bench_function("normalize_spellings", |b| {
        b.iter(|| {
            for dialect in Dialect::ALL {
                for raw in SPELLINGS {
                    black_box(normalizer.normalize(dialect, black_box(raw)));
                }
            }
        })
    });
}

fn bench_compare_schemas(c: &mut Criterion) {
    let comparator = SchemaComparator::new();
    let mut group = c.benchmark_group("compare_schemas");

    for num_tables in [10, 100, 500] {
        let source = generate_schema(num_tables, 30, false);
        let target = generate_schema(num_tables, 30, true);

        group.bench_with_input(BenchmarkId::from_parameter(num_tables), &num_tables, |b, _| {
            b.iter(|| black_box(comparator.compare_schemas(&source, &target)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_compare_schemas);
criterion_main!(benches);
