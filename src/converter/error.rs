//! Fatal conditions raised while converting a dump.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A foreign key column has no table declaring it as a single-column primary key
    UnresolvedForeignKey { table: String, column: String },
    /// Constraints were requested for a statement without a balanced column list
    MalformedStatement { table: String },
    /// Input was not valid UTF-8 after decompression
    InvalidEncoding { path: PathBuf },
    /// The output path resolves to the input file
    OutputOverwritesInput { path: PathBuf },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::UnresolvedForeignKey { table, column } => write!(
                f,
                "cannot resolve foreign key {}.{}: no table has '{}' as its primary key",
                table, column, column
            ),
            ConvertError::MalformedStatement { table } => write!(
                f,
                "CREATE TABLE statement for '{}' has no balanced column list",
                table
            ),
            ConvertError::InvalidEncoding { path } => {
                write!(f, "input is not valid UTF-8: {}", path.display())
            }
            ConvertError::OutputOverwritesInput { path } => write!(
                f,
                "refusing to overwrite the input dump {}; choose another output path or a non-empty suffix",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConvertError {}
