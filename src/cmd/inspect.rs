//! Inspect command: report what the converter infers from a dump.

use crate::converter::{ConvertConfig, Converter};
use crate::input::read_dump;
use crate::table::TableSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Serialize)]
struct TableReport {
    #[serde(flatten)]
    summary: TableSummary,
    /// Foreign key column -> owning table, None when unresolved
    references: BTreeMap<String, Option<String>>,
}

#[derive(Serialize)]
struct InspectReport {
    file: PathBuf,
    tables: Vec<TableReport>,
    warnings: Vec<String>,
}

pub fn run(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let sql = read_dump(&file)?;

    let mut converter = Converter::new(&ConvertConfig::new(&file));
    let statements = Converter::extract_tables(&sql);
    let owners = converter.primary_key_owners(&statements);
    let tables = converter.index_tables(statements);

    let reports: Vec<TableReport> = tables
        .values()
        .map(|table| {
            let summary = table.summary();
            let references = summary
                .foreign_keys
                .iter()
                .map(|col| (col.clone(), owners.get(col).cloned()))
                .collect();
            TableReport {
                summary,
                references,
            }
        })
        .collect();

    let report = InspectReport {
        file,
        tables: reports,
        warnings: converter.warnings().iter().map(|w| w.to_string()).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &InspectReport) {
    println!("{}: {} tables", report.file.display(), report.tables.len());

    for table in &report.tables {
        let name = table.summary.name.as_deref().unwrap_or("<unnamed>");
        println!();
        println!("{}", name);
        match &table.summary.primary_key {
            Some(pk) if pk.is_composite() => println!("  primary key: {} (composite)", pk),
            Some(pk) => println!("  primary key: {}", pk),
            None => println!("  primary key: -"),
        }
        println!("  fields: {}", table.summary.fields.join(", "));
        for (col, owner) in &table.references {
            match owner {
                Some(owner) => println!("  {} → {}({})", col, owner, col),
                None => println!("  {} → ? (unresolved)", col),
            }
        }
    }

    if !report.warnings.is_empty() {
        eprintln!();
        eprintln!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            eprintln!("  ⚠ {}", warning);
        }
    }
}
