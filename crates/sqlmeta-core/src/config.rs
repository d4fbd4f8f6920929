//! Configuration schema (sqlmeta.toml)

use crate::diff::{ChangeCode, DiffSeverity};
use crate::schema::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity overrides for specific change codes
///
/// Lets a deployment decide what counts as breaking, e.g. promote
/// `TYPE_WIDENED` to an error or demote `COLUMN_ADDED` to info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRules {
    /// Map of change code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, DiffSeverity>,
}

impl Default for SeverityRules {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }
}

impl SeverityRules {
    /// Severity for a change code: the override if present, else the built-in default
    pub fn get_severity(&self, code: ChangeCode) -> DiffSeverity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or_else(|| code.default_severity())
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: ChangeCode, severity: DiffSeverity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }

    /// Builder-style override
    pub fn with_override(mut self, code: ChangeCode, severity: DiffSeverity) -> Self {
        self.set_override(code, severity);
        self
    }

    /// Override keys that do not name a known change code
    pub fn unknown_codes(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .overrides
            .keys()
            .map(String::as_str)
            .filter(|key| ChangeCode::from_code(key).is_none())
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

/// Allowlist rules for specific tables or patterns
///
/// Patterns are glob patterns on `schema.name` (or the bare name), compiled
/// once when the rules are built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "AllowlistDef", into = "AllowlistDef")]
pub struct AllowlistRules {
    skip_tables: Vec<String>,
    compiled: Vec<glob::Pattern>,
}

/// Serialized form of [`AllowlistRules`]
#[derive(Serialize, Deserialize)]
struct AllowlistDef {
    /// Exclude these tables from comparison
    #[serde(default)]
    skip_tables: Vec<String>,
}

impl TryFrom<AllowlistDef> for AllowlistRules {
    type Error = ConfigError;

    fn try_from(def: AllowlistDef) -> Result<Self, Self::Error> {
        Self::new(def.skip_tables)
    }
}

impl From<AllowlistRules> for AllowlistDef {
    fn from(rules: AllowlistRules) -> Self {
        Self {
            skip_tables: rules.skip_tables,
        }
    }
}

impl AllowlistRules {
    /// Compile skip patterns
    pub fn new<I, S>(skip_tables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let skip_tables: Vec<String> = skip_tables.into_iter().map(Into::into).collect();
        let compiled = skip_tables
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern)
                    .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            skip_tables,
            compiled,
        })
    }

    /// Skip patterns as written
    pub fn skip_tables(&self) -> &[String] {
        &self.skip_tables
    }

    /// Check if a table should be skipped
    pub fn is_table_skipped(&self, table: &str) -> bool {
        self.compiled.iter().any(|pattern| pattern.matches(table))
    }
}

fn default_fail_on() -> DiffSeverity {
    DiffSeverity::Error
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dialect assumed for snapshot tables that do not declare one
    #[serde(default)]
    pub dialect: Dialect,

    /// Schema severity at or above which a comparison fails a CI gate
    #[serde(default = "default_fail_on")]
    pub fail_on: DiffSeverity,

    /// Severity overrides
    #[serde(default)]
    pub severity: SeverityRules,

    /// Allowlist rules
    #[serde(default)]
    pub allowlist: AllowlistRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            fail_on: default_fail_on(),
            severity: SeverityRules::default(),
            allowlist: AllowlistRules::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid table pattern {0}")]
    InvalidPattern(String),
}
