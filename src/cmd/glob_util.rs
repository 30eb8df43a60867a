//! Input expansion for the convert command.
//!
//! A literal path is used as is. A glob pattern (`*.sql`, `dumps/**/*.sql.gz`)
//! expands to every matching file, minus files that are themselves outputs
//! of an earlier run so converting twice does not produce `_innodb_innodb`.

use crate::input::Compression;
use std::path::{Path, PathBuf};

/// Files selected for conversion
#[derive(Debug)]
pub struct InputFiles {
    pub files: Vec<PathBuf>,
    pub pattern_was_glob: bool,
    /// Glob matches ignored because they look like converter output
    pub skipped_outputs: Vec<PathBuf>,
}

pub fn is_glob_pattern(path: &str) -> bool {
    path.contains('*') || path.contains('?') || path.contains('[')
}

/// True when the file stem (ignoring a compression extension) ends in `suffix`
pub fn is_converted_output(path: &Path, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }

    // f1db_innodb.sql, f1db_innodb.sql.gz, f1db.2023_innodb.sql
    let base = if Compression::from_path(path).is_compressed() {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    base.file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

/// Expand a file path or glob pattern into the dumps to convert.
///
/// # Errors
///
/// Returns an error if the glob pattern is invalid, a literal path does not
/// exist, or nothing is left to convert.
pub fn expand_inputs(pattern: &Path, output_suffix: &str) -> anyhow::Result<InputFiles> {
    let pattern_str = pattern.to_string_lossy();

    if !is_glob_pattern(&pattern_str) {
        if !pattern.exists() {
            anyhow::bail!("file does not exist: {}", pattern.display());
        }
        return Ok(InputFiles {
            files: vec![pattern.to_path_buf()],
            pattern_was_glob: false,
            skipped_outputs: Vec::new(),
        });
    }

    let mut files = Vec::new();
    let mut skipped_outputs = Vec::new();
    for entry in glob::glob(&pattern_str)
        .map_err(|e| anyhow::anyhow!("invalid glob pattern '{}': {}", pattern_str, e))?
    {
        let path = entry
            .map_err(|e| anyhow::anyhow!("error reading path for pattern '{}': {}", pattern_str, e))?;
        if !path.is_file() {
            continue;
        }
        if is_converted_output(&path, output_suffix) {
            skipped_outputs.push(path);
        } else {
            files.push(path);
        }
    }

    if files.is_empty() {
        anyhow::bail!("no files match pattern: {}", pattern_str);
    }

    files.sort();

    Ok(InputFiles {
        files,
        pattern_was_glob: true,
        skipped_outputs,
    })
}

/// Outcome of converting several files
#[derive(Debug, Default)]
pub struct BatchResult {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, path: PathBuf, error: String) {
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::output_path_for;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_converted_output() {
        assert!(is_converted_output(Path::new("f1db_innodb.sql"), "_innodb"));
        assert!(is_converted_output(Path::new("dir/f1db_innodb.sql.gz"), "_innodb"));
        assert!(!is_converted_output(Path::new("f1db.sql"), "_innodb"));
        assert!(!is_converted_output(Path::new("innodb.sql"), "_innodb"));
        assert!(!is_converted_output(Path::new("f1db_innodb.sql"), ""));
        assert!(is_converted_output(Path::new("f1db.2023_innodb.sql"), "_innodb"));
        assert!(!is_converted_output(Path::new("f1db.2023.sql"), "_innodb"));
    }

    #[test]
    fn test_own_outputs_are_recognized() {
        for input in ["f1db.sql", "f1db.2023.sql", "dumps/f1db.2023.sql.gz", "f1db"] {
            let output = output_path_for(Path::new(input), "_innodb");
            assert!(
                is_converted_output(&output, "_innodb"),
                "{} -> {}",
                input,
                output.display()
            );
            assert!(!is_converted_output(Path::new(input), "_innodb"));
        }
    }

    #[test]
    fn test_literal_path_is_kept_even_if_it_looks_converted() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f1db_innodb.sql");
        fs::write(&file, "SELECT 1;").unwrap();

        let result = expand_inputs(&file, "_innodb").unwrap();
        assert!(!result.pattern_was_glob);
        assert_eq!(result.files, vec![file]);
    }

    #[test]
    fn test_missing_literal_path() {
        let result = expand_inputs(Path::new("/nonexistent/f1db.sql"), "_innodb");
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_glob_skips_previous_outputs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("a_innodb.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("c.txt"), "not sql").unwrap();

        let result = expand_inputs(&dir.path().join("*.sql"), "_innodb").unwrap();

        assert!(result.pattern_was_glob);
        assert_eq!(
            result.files,
            vec![dir.path().join("a.sql"), dir.path().join("b.sql")]
        );
        assert_eq!(result.skipped_outputs, vec![dir.path().join("a_innodb.sql")]);
    }

    #[test]
    fn test_glob_with_only_outputs_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_innodb.sql"), "SELECT 1;").unwrap();

        let result = expand_inputs(&dir.path().join("*.sql"), "_innodb");
        assert!(result.unwrap_err().to_string().contains("no files match"));
    }

    #[test]
    fn test_batch_result() {
        let mut result = BatchResult::new(2);
        result.record_success();
        result.record_failure(PathBuf::from("bad.sql"), "unresolved".to_string());

        assert_eq!(result.total_files, 2);
        assert_eq!(result.succeeded, 1);
        assert!(result.has_failures());
        assert_eq!(result.errors.len(), 1);
    }
}
