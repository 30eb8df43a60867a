//! Warning system for the converter.
//!
//! Tracks statements that were skipped or constraints that were dropped
//! without aborting the conversion.

use serde::Serialize;

/// Non-fatal issues found during conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvertWarning {
    /// A `CREATE TABLE` match with no backtick-quoted table name
    UnnamedTable { statement_preview: String },
    /// Two statements declared the same table; the later one wins
    DuplicateTable { table: String },
    /// Two tables share a single-column primary key name; the later one owns it
    AmbiguousPrimaryKey {
        column: String,
        previous: String,
        current: String,
    },
    /// Foreign key dropped because no table owns the column (lenient mode)
    UnresolvedForeignKey { table: String, column: String },
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertWarning::UnnamedTable { statement_preview } => {
                write!(f, "Skipped unnamed table ({})", statement_preview)
            }
            ConvertWarning::DuplicateTable { table } => {
                write!(f, "Table '{}' declared more than once, using the last one", table)
            }
            ConvertWarning::AmbiguousPrimaryKey {
                column,
                previous,
                current,
            } => write!(
                f,
                "Primary key '{}' declared by both '{}' and '{}', references go to '{}'",
                column, previous, current, current
            ),
            ConvertWarning::UnresolvedForeignKey { table, column } => {
                write!(f, "Dropped foreign key {}.{}: no owning table", table, column)
            }
        }
    }
}

/// Collects warnings during conversion
#[derive(Debug)]
pub struct WarningCollector {
    warnings: Vec<ConvertWarning>,
    max_warnings: usize,
    suppressed: usize,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: 100, // Limit to avoid memory issues
            suppressed: 0,
        }
    }

    /// Add a warning, ignoring exact duplicates
    pub fn add(&mut self, warning: ConvertWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        } else {
            self.suppressed += 1;
        }
    }

    pub fn warnings(&self) -> &[ConvertWarning] {
        &self.warnings
    }

    /// Distinct warnings dropped after the cap was reached
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_warnings(self) -> Vec<ConvertWarning> {
        self.warnings
    }
}

/// First line of a statement, truncated for display
pub(crate) fn preview(stmt: &str) -> String {
    let first = stmt.lines().next().unwrap_or_default();
    if first.chars().count() > 60 {
        format!("{}...", first.chars().take(60).collect::<String>())
    } else {
        first.to_string()
    }
}
