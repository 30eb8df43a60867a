//! Benchmarks for dump conversion.
//!
//! Tests:
//! - Whole-dump conversion throughput (ALTER and inline placement)
//! - Per-table fact extraction

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use db_converter::config::ForeignKeyPlacement;
use db_converter::converter::{ConvertConfig, Converter};
use db_converter::table::Table;
use std::hint::black_box;

/// Generate a MyISAM dump where every table references the previous one
fn generate_myisam_dump(tables: usize, rows_per_table: usize) -> String {
    let mut data = String::new();

    data.push_str("-- MySQL dump 10.13\n");
    data.push_str("/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;\n\n");

    for t in 0..tables {
        data.push_str(&format!("DROP TABLE IF EXISTS `table{}`;\n", t));
        data.push_str(&format!(
            "CREATE TABLE `table{t}` (\n  `table{t}Id` int(11) NOT NULL AUTO_INCREMENT,\n"
        ));
        if t > 0 {
            data.push_str(&format!("  `table{}Id` int(11) NOT NULL,\n", t - 1));
        }
        data.push_str(&format!(
            "  `name` varchar(255) NOT NULL DEFAULT '',\n  `created` date NOT NULL DEFAULT '0000-00-00',\n  PRIMARY KEY (`table{t}Id`)\n) ENGINE=MyISAM DEFAULT CHARSET=utf8;\n\n"
        ));

        for r in 0..rows_per_table {
            data.push_str(&format!(
                "INSERT INTO `table{}` VALUES ({}, 'Row {}', '2024-01-01');\n",
                t, r, r
            ));
        }
        data.push('\n');
    }

    data
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for tables in [10, 100, 500] {
        let dump = generate_myisam_dump(tables, 20);
        group.throughput(Throughput::Bytes(dump.len() as u64));

        for placement in [ForeignKeyPlacement::Alter, ForeignKeyPlacement::Inline] {
            let config = ConvertConfig {
                foreign_keys: placement,
                ..ConvertConfig::default()
            };

            group.bench_with_input(
                BenchmarkId::new(placement.to_string(), tables),
                &dump,
                |b, dump| {
                    b.iter(|| {
                        let conversion = Converter::new(&config)
                            .convert_text(black_box(dump))
                            .unwrap();
                        black_box(conversion.sql.len())
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_table_facts(c: &mut Criterion) {
    let dump = generate_myisam_dump(50, 0);
    let tables = Converter::extract_tables(&dump);

    c.bench_function("table_facts", |b| {
        b.iter(|| {
            for table in &tables {
                black_box(table.name());
                black_box(table.primary_key());
                black_box(table.foreign_keys());
            }
        })
    });

    c.bench_function("extract_tables", |b| {
        b.iter(|| black_box(Converter::extract_tables(black_box(&dump))).len())
    });

    let single = Table::new(tables[1].body());
    c.bench_function("fields_single_table", |b| {
        b.iter(|| black_box(single.fields()))
    });
}

criterion_group!(benches, bench_convert, bench_table_facts);
criterion_main!(benches);
