//! Whole-dump conversion from one storage engine to another.
//!
//! A conversion:
//! - extracts every `CREATE TABLE ... ;` statement as a [`Table`]
//! - indexes single-column primary keys by the table declaring them
//! - applies literal fixes and the engine substitution to the whole text
//! - appends `ALTER TABLE` statements adding the inferred foreign keys
//! - optionally replaces composite primary keys with a surrogate `id`
//!
//! The output is built fully in memory before anything is written, so a
//! failed conversion leaves no file behind.

mod error;
mod warnings;

pub use error::ConvertError;
pub use warnings::{ConvertWarning, WarningCollector};

use crate::config::{ConverterYamlConfig, ForeignKeyPlacement, Substitution, DEFAULT_OUTPUT_SUFFIX};
use crate::input::{read_dump, Compression};
use crate::table::{EngineSwap, PrimaryKeyOwners, Table};
use anyhow::Context;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A whole `CREATE TABLE` statement up to the next terminator
static CREATE_TABLE_STMT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)CREATE TABLE.*?;").unwrap());

/// Separator between the rewritten dump and the generated statements
const ALTERS_SEPARATOR: &str = "\n\n\n";

/// Configuration for a single conversion
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Input SQL file
    pub input: PathBuf,
    /// Output SQL file (sibling `<stem>_innodb<ext>` if None)
    pub output: Option<PathBuf>,
    pub engines: EngineSwap,
    /// Inserted between the input file stem and extension
    pub output_suffix: String,
    /// Replace composite primary keys with a surrogate `id` column
    pub only_single_keys: bool,
    pub foreign_keys: ForeignKeyPlacement,
    /// Drop unresolvable foreign keys with a warning instead of failing
    pub skip_unresolved: bool,
    /// Literal fixes applied to the whole dump before the engine swap
    pub substitutions: Vec<Substitution>,
    /// Dry run mode
    pub dry_run: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            engines: EngineSwap::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            only_single_keys: true,
            foreign_keys: ForeignKeyPlacement::Alter,
            skip_unresolved: false,
            substitutions: Substitution::defaults(),
            dry_run: false,
        }
    }
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from a YAML file's settings
    pub fn from_yaml(input: impl Into<PathBuf>, yaml: &ConverterYamlConfig) -> Self {
        Self {
            input: input.into(),
            output: None,
            engines: EngineSwap::new(&yaml.engine.from, &yaml.engine.to),
            output_suffix: yaml.output_suffix.clone(),
            only_single_keys: yaml.only_single_keys,
            foreign_keys: yaml.foreign_keys,
            skip_unresolved: yaml.skip_unresolved,
            substitutions: yaml.substitutions.clone(),
            dry_run: false,
        }
    }

    /// Where the converted dump is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| output_path_for(&self.input, &self.output_suffix))
    }
}

/// Statistics from a conversion
#[derive(Debug, Default, Serialize)]
pub struct ConvertStats {
    pub tables_found: usize,
    pub foreign_keys_added: usize,
    pub composite_keys_normalized: usize,
    pub substitutions_applied: usize,
    /// Output file, None for a dry run
    pub output: Option<PathBuf>,
    pub warnings: Vec<ConvertWarning>,
    /// Warnings past the collector's cap, counted but not kept
    pub warnings_suppressed: usize,
}

/// Converted dump text together with its statistics
#[derive(Debug)]
pub struct Conversion {
    pub sql: String,
    pub stats: ConvertStats,
}

/// Rewrites dump text according to a [`ConvertConfig`]
pub struct Converter {
    engines: EngineSwap,
    only_single_keys: bool,
    placement: ForeignKeyPlacement,
    skip_unresolved: bool,
    substitutions: Vec<Substitution>,
    warnings: WarningCollector,
}

impl Converter {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            engines: config.engines.clone(),
            only_single_keys: config.only_single_keys,
            placement: config.foreign_keys,
            skip_unresolved: config.skip_unresolved,
            substitutions: config.substitutions.clone(),
            warnings: WarningCollector::new(),
        }
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[ConvertWarning] {
        self.warnings.warnings()
    }

    /// Every `CREATE TABLE` statement in the dump, in file order
    pub fn extract_tables(sql: &str) -> Vec<Table> {
        CREATE_TABLE_STMT_RE
            .find_iter(sql)
            .map(|m| Table::new(m.as_str()))
            .collect()
    }

    /// Tables keyed by name in first-seen order; later duplicates replace the value
    pub fn index_tables(&mut self, tables: Vec<Table>) -> IndexMap<String, Table> {
        let mut indexed = IndexMap::with_capacity(tables.len());

        for table in tables {
            let Some(name) = table.name() else {
                self.warnings.add(ConvertWarning::UnnamedTable {
                    statement_preview: warnings::preview(table.body()),
                });
                continue;
            };

            if indexed.insert(name.clone(), table).is_some() {
                self.warnings.add(ConvertWarning::DuplicateTable { table: name });
            }
        }

        indexed
    }

    /// Map each single-column primary key to the table declaring it.
    ///
    /// Walks every extracted statement in file order, so a key declared by a
    /// definition that is later replaced still resolves and the last
    /// declaration of a key owns it.
    pub fn primary_key_owners(&mut self, tables: &[Table]) -> PrimaryKeyOwners {
        let mut owners = PrimaryKeyOwners::default();

        for table in tables {
            let Some(name) = table.name() else {
                continue;
            };
            let Some(pk) = table.primary_key() else {
                continue;
            };
            let Some(column) = pk.as_single() else {
                continue;
            };

            if let Some(previous) = owners.insert(column.to_string(), name.clone()) {
                if previous != name {
                    self.warnings.add(ConvertWarning::AmbiguousPrimaryKey {
                        column: column.to_string(),
                        previous,
                        current: name,
                    });
                }
            }
        }

        owners
    }

    /// Convert a whole dump held in memory
    pub fn convert_text(mut self, sql: &str) -> anyhow::Result<Conversion> {
        let statements = Self::extract_tables(sql);
        let owners = self.primary_key_owners(&statements);
        let tables = self.index_tables(statements);

        let mut stats = ConvertStats {
            tables_found: tables.len(),
            ..Default::default()
        };

        let mut alters = Vec::new();
        let body = match self.placement {
            ForeignKeyPlacement::Alter => {
                for table in tables.values() {
                    let resolved = self.resolve(table, &owners)?;
                    stats.foreign_keys_added += resolved.len();
                    alters.extend(table.render_alters(&resolved));
                }
                sql.to_string()
            }
            ForeignKeyPlacement::Inline => {
                let (rewritten, added) = self.inline_constraints(sql, &owners)?;
                stats.foreign_keys_added = added;
                rewritten
            }
        };

        let (mut body, applied) = self.apply_substitutions(body);
        stats.substitutions_applied = applied;
        body = body.replace(&self.engines.source_marker(), &self.engines.target_marker());

        if self.only_single_keys {
            for table in tables.values() {
                let surrogate = table.surrogate_key_alters();
                if !surrogate.is_empty() {
                    stats.composite_keys_normalized += 1;
                    alters.extend(surrogate);
                }
            }
        }

        body.push_str(ALTERS_SEPARATOR);
        body.push_str(&alters.join("\n"));

        stats.warnings_suppressed = self.warnings.suppressed();
        stats.warnings = self.warnings.into_warnings();

        Ok(Conversion { sql: body, stats })
    }

    /// Foreign keys of a table paired with their owning table.
    ///
    /// Unresolved columns fail the conversion unless lenient mode drops them.
    fn resolve<'a>(
        &mut self,
        table: &Table,
        owners: &'a PrimaryKeyOwners,
    ) -> Result<Vec<(String, &'a str)>, ConvertError> {
        if !self.skip_unresolved {
            return table.resolve_foreign_keys(owners);
        }

        let mut resolved = Vec::new();
        for column in table.foreign_keys() {
            match owners.get(&column) {
                Some(owner) => resolved.push((column, owner.as_str())),
                None => self.warnings.add(ConvertWarning::UnresolvedForeignKey {
                    table: table.to_string(),
                    column,
                }),
            }
        }
        Ok(resolved)
    }

    /// Replace every named `CREATE TABLE` statement with its converted body
    fn inline_constraints(
        &mut self,
        sql: &str,
        owners: &PrimaryKeyOwners,
    ) -> anyhow::Result<(String, usize)> {
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        let mut added = 0;

        for m in CREATE_TABLE_STMT_RE.find_iter(sql) {
            let table = Table::new(m.as_str());
            if table.name().is_none() {
                continue;
            }

            let resolved = self.resolve(&table, owners)?;
            added += resolved.len();

            out.push_str(&sql[last..m.start()]);
            out.push_str(&table.render_converted(&resolved, &self.engines)?);
            last = m.end();
        }
        out.push_str(&sql[last..]);

        Ok((out, added))
    }

    fn apply_substitutions(&self, mut sql: String) -> (String, usize) {
        let mut applied = 0;
        for sub in &self.substitutions {
            if sub.find.is_empty() {
                continue;
            }
            let count = sql.matches(sub.find.as_str()).count();
            if count > 0 {
                applied += count;
                sql = sql.replace(&sub.find, &sub.replace);
            }
        }
        (sql, applied)
    }
}

/// Sibling path `<stem><suffix><ext>`; a compression extension is dropped first
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let base = if Compression::from_path(input).is_compressed() {
        input.with_extension("")
    } else {
        input.to_path_buf()
    };

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match base.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };

    input.with_file_name(file_name)
}

/// Convert the dump at `config.input` and write the result
pub fn run(config: ConvertConfig) -> anyhow::Result<ConvertStats> {
    let sql = read_dump(&config.input)?;
    let Conversion { sql, mut stats } = Converter::new(&config).convert_text(&sql)?;

    if config.dry_run {
        return Ok(stats);
    }

    let output = config.output_path();
    if is_same_file(&config.input, &output) {
        return Err(ConvertError::OutputOverwritesInput { path: output }.into());
    }
    write_output(&output, &sql)?;
    stats.output = Some(output);

    Ok(stats)
}

/// Both paths name the same existing file, or are literally equal
fn is_same_file(input: &Path, output: &Path) -> bool {
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    }
}

fn write_output(path: &Path, sql: &str) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(sql.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Convert a MyISAM dump to InnoDB with inferred foreign keys.
///
/// Writes `<stem>_innodb<ext>` next to `file` and returns its path.
pub fn convert_dump_to_innodb(
    file: impl AsRef<Path>,
    only_single_keys: bool,
) -> anyhow::Result<String> {
    let config = ConvertConfig {
        only_single_keys,
        ..ConvertConfig::new(file.as_ref())
    };
    let output = config.output_path();

    run(config)?;

    Ok(output.to_string_lossy().into_owned())
}
