//! YAML configuration for the converter.
//!
//! Every field is optional; missing values fall back to the MyISAM to InnoDB
//! defaults.
//!
//! ```yaml
//! engine:
//!   from: MyISAM
//!   to: InnoDB
//! output_suffix: _innodb
//! only_single_keys: true
//! foreign_keys: alter
//! skip_unresolved: false
//! substitutions:
//!   - find: "date NOT NULL DEFAULT '0000-00-00'"
//!     replace: "date NOT NULL"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Schema-only dumps declare a zero date default the data dump rejects
pub const ZERO_DATE_DEFAULT: &str = "date NOT NULL DEFAULT '0000-00-00'";
pub const ZERO_DATE_FIX: &str = "date NOT NULL";

pub const DEFAULT_OUTPUT_SUFFIX: &str = "_innodb";

/// Where inferred foreign key constraints are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeignKeyPlacement {
    /// `ALTER TABLE ... ADD FOREIGN KEY` statements appended after the dump
    #[default]
    Alter,
    /// `FOREIGN KEY` clauses inside each `CREATE TABLE`
    Inline,
}

impl std::str::FromStr for ForeignKeyPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alter" => Ok(ForeignKeyPlacement::Alter),
            "inline" => Ok(ForeignKeyPlacement::Inline),
            _ => Err(format!(
                "Unknown foreign key placement: {}. Valid options: alter, inline",
                s
            )),
        }
    }
}

impl std::fmt::Display for ForeignKeyPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForeignKeyPlacement::Alter => write!(f, "alter"),
            ForeignKeyPlacement::Inline => write!(f, "inline"),
        }
    }
}

/// Literal whole-file text replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub find: String,
    pub replace: String,
}

impl Substitution {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Default fixes applied to every dump
    pub fn defaults() -> Vec<Substitution> {
        vec![Substitution::new(ZERO_DATE_DEFAULT, ZERO_DATE_FIX)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub from: String,
    pub to: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            from: "MyISAM".to_string(),
            to: "InnoDB".to_string(),
        }
    }
}

/// Complete YAML configuration for the convert command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterYamlConfig {
    pub engine: EngineConfig,
    pub output_suffix: String,
    pub only_single_keys: bool,
    pub foreign_keys: ForeignKeyPlacement,
    pub skip_unresolved: bool,
    pub substitutions: Vec<Substitution>,
}

impl Default for ConverterYamlConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            only_single_keys: true,
            foreign_keys: ForeignKeyPlacement::Alter,
            skip_unresolved: false,
            substitutions: Substitution::defaults(),
        }
    }
}

impl ConverterYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ConverterYamlConfig = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// An empty suffix would name the output after the input itself
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.output_suffix.is_empty() {
            anyhow::bail!("output_suffix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: ConverterYamlConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.engine.from, "MyISAM");
        assert_eq!(config.engine.to, "InnoDB");
        assert_eq!(config.output_suffix, "_innodb");
        assert!(config.only_single_keys);
        assert_eq!(config.foreign_keys, ForeignKeyPlacement::Alter);
        assert_eq!(config.substitutions, Substitution::defaults());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
engine:
  from: Aria
  to: InnoDB
output_suffix: _converted
only_single_keys: false
foreign_keys: inline
skip_unresolved: true
substitutions:
  - find: "datetime NOT NULL DEFAULT '0000-00-00 00:00:00'"
    replace: "datetime NOT NULL"
"#;

        let config: ConverterYamlConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.engine.from, "Aria");
        assert_eq!(config.output_suffix, "_converted");
        assert!(!config.only_single_keys);
        assert_eq!(config.foreign_keys, ForeignKeyPlacement::Inline);
        assert!(config.skip_unresolved);
        assert_eq!(config.substitutions.len(), 1);
        assert_eq!(config.substitutions[0].replace, "datetime NOT NULL");
    }

    #[test]
    fn test_partial_engine_keeps_other_default() {
        let config: ConverterYamlConfig =
            serde_yaml_ng::from_str("engine:\n  to: Aria\n").unwrap();
        assert_eq!(config.engine.from, "MyISAM");
        assert_eq!(config.engine.to, "Aria");
    }

    #[test]
    fn test_load_rejects_empty_suffix() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("convert.yaml");
        fs::write(&path, "output_suffix: \"\"\n").unwrap();

        let err = ConverterYamlConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("output_suffix must not be empty"));
    }

    #[test]
    fn test_placement_from_str() {
        assert_eq!("ALTER".parse::<ForeignKeyPlacement>(), Ok(ForeignKeyPlacement::Alter));
        assert_eq!("inline".parse::<ForeignKeyPlacement>(), Ok(ForeignKeyPlacement::Inline));
        assert!("both".parse::<ForeignKeyPlacement>().is_err());
    }
}
