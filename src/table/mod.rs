//! Table model for a single `CREATE TABLE` statement.
//!
//! A [`Table`] wraps the raw statement text and derives everything else from
//! it on demand:
//! - the table name
//! - the primary key (single column or composite)
//! - the set of backtick-quoted column names
//! - foreign keys inferred from the `...Id` naming convention
//!
//! Extraction is pattern based and only understands the backtick-quoted
//! MySQL dump style. Anything that does not match yields `None` rather than
//! an error.

mod builder;

pub use builder::CreateTableBuilder;

use crate::converter::ConvertError;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Table name following `CREATE TABLE`, may span lines
static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)CREATE TABLE `(.*?)`").unwrap());

/// First `PRIMARY KEY (...)` clause with backtick-quoted columns, single line
static PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PRIMARY KEY \((`.*?`)\)").unwrap());

/// Any backtick-quoted token on a single line
static QUOTED_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.*?)`").unwrap());

/// Suffix marking a column as a foreign key candidate
pub const FOREIGN_KEY_SUFFIX: &str = "Id";

/// Mapping from a single-column primary key name to the table declaring it
pub type PrimaryKeyOwners = AHashMap<String, String>;

/// Primary key declared by a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    /// Columns in declaration order
    Composite(Vec<String>),
}

impl PrimaryKey {
    /// Column name when the key is not composite
    pub fn as_single(&self) -> Option<&str> {
        match self {
            PrimaryKey::Single(col) => Some(col),
            PrimaryKey::Composite(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, PrimaryKey::Composite(_))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Single(col) => write!(f, "{}", col),
            PrimaryKey::Composite(cols) => write!(f, "({})", cols.join(", ")),
        }
    }
}

/// Storage engine pair used when rewriting statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSwap {
    pub from: String,
    pub to: String,
}

impl EngineSwap {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Literal marker for the source engine, e.g. `ENGINE=MyISAM`
    pub fn source_marker(&self) -> String {
        format!("ENGINE={}", self.from)
    }

    /// Literal marker for the target engine, e.g. `ENGINE=InnoDB`
    pub fn target_marker(&self) -> String {
        format!("ENGINE={}", self.to)
    }
}

impl Default for EngineSwap {
    fn default() -> Self {
        Self::new("MyISAM", "InnoDB")
    }
}

/// Serializable snapshot of everything derived from a table
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: Option<String>,
    pub primary_key: Option<PrimaryKey>,
    pub fields: Vec<String>,
    pub foreign_keys: Vec<String>,
}

/// One `CREATE TABLE ... ;` statement taken verbatim from a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    body: String,
}

impl Table {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Statement text exactly as it appeared in the dump
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Table name with backticks stripped
    pub fn name(&self) -> Option<String> {
        TABLE_NAME_RE
            .captures(&self.body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// First primary key clause in the statement
    pub fn primary_key(&self) -> Option<PrimaryKey> {
        let caps = PRIMARY_KEY_RE.captures(&self.body)?;
        let inner = caps.get(1)?.as_str().replace('`', "");

        if inner.contains(',') {
            Some(PrimaryKey::Composite(
                inner.split(',').map(|c| c.trim().to_string()).collect(),
            ))
        } else {
            Some(PrimaryKey::Single(inner.trim().to_string()))
        }
    }

    /// Every backtick-quoted token after the first opening parenthesis
    pub fn fields(&self) -> BTreeSet<String> {
        let Some(start) = self.body.find('(') else {
            return BTreeSet::new();
        };

        QUOTED_TOKEN_RE
            .captures_iter(&self.body[start..])
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Columns that look like references to another table's key.
    ///
    /// A column is a candidate when its name ends in `Id`. The table's own
    /// primary key is excluded only when it is a single column: a composite
    /// key is compared as a whole and never equals a column name.
    pub fn foreign_keys(&self) -> Vec<String> {
        let primary_key = self.primary_key();

        self.fields()
            .into_iter()
            .filter(|f| f.ends_with(FOREIGN_KEY_SUFFIX))
            .filter(|f| !matches!(&primary_key, Some(PrimaryKey::Single(pk)) if pk == f))
            .collect()
    }

    /// Resolve the table owning each foreign key.
    ///
    /// Returns `(column, owner)` pairs in foreign key order.
    pub fn resolve_foreign_keys<'a>(
        &self,
        owners: &'a PrimaryKeyOwners,
    ) -> Result<Vec<(String, &'a str)>, ConvertError> {
        self.foreign_keys()
            .into_iter()
            .map(|col| match owners.get(&col) {
                Some(owner) => Ok((col, owner.as_str())),
                None => Err(ConvertError::UnresolvedForeignKey {
                    table: self.display_name(),
                    column: col,
                }),
            })
            .collect()
    }

    /// Statement rewritten for the target engine with inline FK constraints
    pub fn converted_body(
        &self,
        owners: &PrimaryKeyOwners,
        engines: &EngineSwap,
    ) -> Result<String, ConvertError> {
        let resolved = self.resolve_foreign_keys(owners)?;
        self.render_converted(&resolved, engines)
    }

    /// Render the converted statement from already resolved foreign keys
    pub(crate) fn render_converted(
        &self,
        resolved: &[(String, &str)],
        engines: &EngineSwap,
    ) -> Result<String, ConvertError> {
        let Some(mut builder) = CreateTableBuilder::parse(&self.body) else {
            if resolved.is_empty() {
                return Ok(self
                    .body
                    .replace(&engines.source_marker(), &engines.target_marker()));
            }
            return Err(ConvertError::MalformedStatement {
                table: self.display_name(),
            });
        };

        builder.replace_engine(&engines.source_marker(), &engines.target_marker());
        for (col, owner) in resolved {
            builder.foreign_key(col, owner);
        }

        Ok(builder.build())
    }

    /// `ALTER TABLE` statements adding one constraint per foreign key
    pub fn alters(&self, owners: &PrimaryKeyOwners) -> Result<Vec<String>, ConvertError> {
        let resolved = self.resolve_foreign_keys(owners)?;
        Ok(self.render_alters(&resolved))
    }

    pub(crate) fn render_alters(&self, resolved: &[(String, &str)]) -> Vec<String> {
        let name = self.display_name();
        resolved
            .iter()
            .map(|(col, owner)| {
                format!(
                    "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {}({});",
                    name, col, owner, col
                )
            })
            .collect()
    }

    /// Statements replacing a composite primary key with a surrogate `id`
    pub fn surrogate_key_alters(&self) -> Vec<String> {
        match (self.name(), self.primary_key()) {
            (Some(name), Some(PrimaryKey::Composite(_))) => vec![
                format!("ALTER TABLE `{}` DROP PRIMARY KEY;", name),
                format!(
                    "ALTER TABLE `{}` ADD COLUMN `id` int(11) PRIMARY KEY AUTO_INCREMENT;",
                    name
                ),
            ],
            _ => Vec::new(),
        }
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            name: self.name(),
            primary_key: self.primary_key(),
            fields: self.fields().into_iter().collect(),
            foreign_keys: self.foreign_keys(),
        }
    }

    fn display_name(&self) -> String {
        self.name().unwrap_or_else(|| "<unnamed>".to_string())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
