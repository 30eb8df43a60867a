//! Convert command CLI handler.

use crate::config::{ConverterYamlConfig, ForeignKeyPlacement};
use crate::converter::{self, output_path_for, ConvertConfig, ConvertStats};
use crate::table::EngineSwap;
use ahash::AHashMap;
use serde::Serialize;
use std::path::PathBuf;

use super::glob_util::{expand_inputs, BatchResult};

pub struct ConvertArgs {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub suffix: Option<String>,
    pub keep_composite_keys: bool,
    pub foreign_keys: Option<String>,
    pub skip_unresolved: bool,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
    pub fail_fast: bool,
}

/// Per-file entry of the JSON report
#[derive(Serialize)]
struct FileReport {
    input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ConvertStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let template = build_template(&args)?;
    let inputs = expand_inputs(&args.file, &template.output_suffix)?;

    if args.verbose {
        for skipped in &inputs.skipped_outputs {
            eprintln!("Skipping previous output: {}", skipped.display());
        }
    }

    let mut files = inputs.files;
    if !inputs.pattern_was_glob && files.len() == 1 {
        return run_single(files.remove(0), template, &args);
    }

    if args.output.is_some() {
        anyhow::bail!("--output cannot be used with glob patterns; outputs are written next to each input");
    }

    run_multi(files, template, &args)
}

/// Settings shared by every input: YAML file first, then CLI overrides
fn build_template(args: &ConvertArgs) -> anyhow::Result<ConvertConfig> {
    let yaml = match &args.config {
        Some(path) => ConverterYamlConfig::load(path)?,
        None => ConverterYamlConfig::default(),
    };

    let mut config = ConvertConfig::from_yaml(PathBuf::new(), &yaml);

    if args.from.is_some() || args.to.is_some() {
        config.engines = EngineSwap::new(
            args.from.clone().unwrap_or_else(|| config.engines.from.clone()),
            args.to.clone().unwrap_or_else(|| config.engines.to.clone()),
        );
    }
    if let Some(suffix) = &args.suffix {
        if suffix.is_empty() {
            anyhow::bail!("--suffix must not be empty");
        }
        config.output_suffix = suffix.clone();
    }
    if args.keep_composite_keys {
        config.only_single_keys = false;
    }
    if let Some(placement) = &args.foreign_keys {
        config.foreign_keys = placement
            .parse::<ForeignKeyPlacement>()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    if args.skip_unresolved {
        config.skip_unresolved = true;
    }
    config.dry_run = args.dry_run;

    Ok(config)
}

fn run_single(input: PathBuf, template: ConvertConfig, args: &ConvertArgs) -> anyhow::Result<()> {
    let config = ConvertConfig {
        input: input.clone(),
        output: args.output.clone(),
        ..template
    };

    if args.verbose {
        eprintln!(
            "Converting {} (ENGINE={} → ENGINE={}, foreign keys: {})",
            input.display(),
            config.engines.from,
            config.engines.to,
            config.foreign_keys
        );
    }

    let stats = converter::run(config)?;

    if args.json {
        let report = FileReport {
            input,
            stats: Some(stats),
            error: None,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_stats(&stats, args.verbose || args.dry_run);
    if let Some(out) = &stats.output {
        println!("{}", out.display());
    }

    Ok(())
}

fn run_multi(files: Vec<PathBuf>, template: ConvertConfig, args: &ConvertArgs) -> anyhow::Result<()> {
    check_output_collisions(&files, &template.output_suffix)?;

    let total = files.len();
    let mut result = BatchResult::new(total);
    let mut reports = Vec::with_capacity(total);

    if !args.json {
        eprintln!(
            "Converting {} files to ENGINE={}...\n",
            total, template.engines.to
        );
    }

    for (idx, file) in files.into_iter().enumerate() {
        if !args.json {
            eprintln!("[{}/{}] Converting: {}", idx + 1, total, file.display());
        }

        let config = ConvertConfig {
            input: file.clone(),
            output: None,
            ..template.clone()
        };

        match converter::run(config) {
            Ok(stats) => {
                if !args.json {
                    eprintln!(
                        "  {} tables, {} foreign keys, {} composite keys normalized",
                        stats.tables_found, stats.foreign_keys_added, stats.composite_keys_normalized
                    );
                    print_warnings(&stats, args.verbose);
                    if let Some(out) = &stats.output {
                        eprintln!("  → {}", out.display());
                    }
                    eprintln!();
                }
                result.record_success();
                reports.push(FileReport {
                    input: file,
                    stats: Some(stats),
                    error: None,
                });
            }
            Err(e) => {
                if !args.json {
                    eprintln!("  Error: {}\n", e);
                }
                result.record_failure(file.clone(), e.to_string());
                reports.push(FileReport {
                    input: file,
                    stats: None,
                    error: Some(e.to_string()),
                });
                if args.fail_fast {
                    break;
                }
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("Conversion Summary:");
        eprintln!("  Total files: {}", total);
        eprintln!("  Succeeded: {}", result.succeeded);
        eprintln!("  Failed: {}", result.failed);
    }

    if result.has_failures() {
        if !args.json {
            eprintln!();
            eprintln!("Failed files:");
            for (path, error) in &result.errors {
                eprintln!("  - {}: {}", path.display(), error);
            }
        }
        anyhow::bail!("{} of {} files failed to convert", result.failed, total);
    }

    Ok(())
}

/// Fail before converting anything if two inputs map to one output file
/// (`a.sql` and `a.sql.gz` both become `a_innodb.sql`)
fn check_output_collisions(files: &[PathBuf], suffix: &str) -> anyhow::Result<()> {
    let mut targets: AHashMap<PathBuf, &PathBuf> = AHashMap::with_capacity(files.len());

    for file in files {
        let output = output_path_for(file, suffix);
        if let Some(previous) = targets.insert(output.clone(), file) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                file.display(),
                output.display()
            );
        }
    }

    Ok(())
}

fn print_stats(stats: &ConvertStats, detailed: bool) {
    if detailed {
        eprintln!();
        eprintln!("Conversion Statistics:");
        eprintln!("  Tables found: {}", stats.tables_found);
        eprintln!("  Foreign keys added: {}", stats.foreign_keys_added);
        eprintln!("  Composite keys normalized: {}", stats.composite_keys_normalized);
        eprintln!("  Substitutions applied: {}", stats.substitutions_applied);
        if stats.output.is_none() {
            eprintln!();
            eprintln!("(Dry run - no output written)");
        }
    }
    print_warnings(stats, detailed);
}

fn print_warnings(stats: &ConvertStats, detailed: bool) {
    if stats.warnings.is_empty() {
        return;
    }

    eprintln!("Warnings ({}):", stats.warnings.len() + stats.warnings_suppressed);
    if detailed {
        for warning in &stats.warnings {
            eprintln!("  ⚠ {}", warning);
        }
    }
    if stats.warnings_suppressed > 0 {
        eprintln!(
            "  ... ({} additional warnings truncated)",
            stats.warnings_suppressed
        );
    }
}
