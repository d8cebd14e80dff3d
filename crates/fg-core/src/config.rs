//! Configuration types and parsing for filterguard.yml

use crate::error::{CoreError, CoreResult};
use crate::rules::FilterRule;
use crate::schema::{SchemaCatalog, TableSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Config file names searched by [`ValidatorConfig::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["filterguard.yml", "filterguard.yaml"];

/// Default bound on expression and query nesting during lowering.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Validator configuration from filterguard.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// SQL dialect used to parse queries
    #[serde(default)]
    pub dialect: Dialect,

    /// What `validate` does with SQL it cannot parse
    #[serde(default)]
    pub on_parse_error: ParseFailurePolicy,

    /// How CTE names are mapped back to physical tables
    #[serde(default)]
    pub cte_resolution: CteResolution,

    /// Nesting bound applied while lowering the parsed query
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Mandatory filter rules
    #[serde(default)]
    pub rules: Vec<FilterRule>,

    /// Known table schemas for the column check
    #[serde(default)]
    pub schemas: Vec<TableSchema>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            on_parse_error: ParseFailurePolicy::default(),
            cte_resolution: CteResolution::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            rules: Vec::new(),
            schemas: Vec::new(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl ValidatorConfig {
    /// Configuration holding only `rules`, everything else defaulted.
    pub fn with_rules(rules: Vec<FilterRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: ValidatorConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ValidatorConfig =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParse {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        log::debug!(
            "Loaded {} rule(s) and {} schema(s) from {}",
            config.rules.len(),
            config.schemas.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load configuration from a directory.
    /// Looks for filterguard.yml or filterguard.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map_or_else(
                || {
                    Err(CoreError::ConfigNotFound {
                        path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                    })
                },
                |path| Self::load(&path),
            )
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_depth == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "max_depth must be greater than zero".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            let normalized = rule.normalized();
            let key = (
                normalized.table_name.clone(),
                normalized.column_name.clone(),
                normalized.operator,
                normalized.required_value.to_string(),
            );
            if !seen.insert(key) {
                log::warn!("Duplicate filter rule '{}' in config", rule);
            }
        }

        SchemaCatalog::from_schemas(&self.schemas)?;
        Ok(())
    }

    /// Schema catalog built from the `schemas` section.
    pub fn catalog(&self) -> CoreResult<SchemaCatalog> {
        SchemaCatalog::from_schemas(&self.schemas)
    }
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Snowflake SQL dialect
    #[default]
    Snowflake,
    /// DuckDB SQL dialect
    DuckDb,
    /// PostgreSQL dialect
    Postgres,
    /// ANSI-ish generic dialect
    Generic,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Snowflake => write!(f, "snowflake"),
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Dialect::Snowflake),
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "generic" | "ansi" => Ok(Dialect::Generic),
            _ => Err(CoreError::ConfigInvalid {
                message: format!(
                    "Unknown dialect '{}'. Valid dialects: snowflake, duckdb, postgres, generic",
                    s
                ),
            }),
        }
    }
}

/// Behavior of `validate` on SQL that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ParseFailurePolicy {
    /// Report a pass and attach the parse error as a diagnostic
    #[default]
    #[serde(rename = "pass")]
    FailOpen,
    /// Return the parse error to the caller
    #[serde(rename = "fail")]
    Strict,
}

/// How a CTE name maps back to the physical table it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CteResolution {
    /// First physical table in the CTE body; CTE-to-CTE chains are not followed
    #[default]
    SingleHop,
    /// Follow chains of CTEs until a physical table is reached
    Transitive,
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
