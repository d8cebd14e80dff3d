//! Error types for fg-core

use thiserror::Error;

/// Core error type for filterguard
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config '{path}': {source}")]
    ConfigParse {
        path: String,
        source: serde_yaml::Error,
    },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: A filter rule that can never be evaluated
    #[error("[C004] Invalid filter rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// C005: Two schema entries for the same table
    #[error("[C005] Duplicate schema for table '{table}'")]
    DuplicateSchemaTable { table: String },

    /// C006: IO error with file path context
    #[error("[C006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C007: Unknown operator text in a rule
    #[error("[C007] Unknown operator '{0}', expected one of =, !=, <>, <, >, <=, >=, IN")]
    UnknownOperator(String),

    /// C008: YAML parsing error without a file path
    #[error("[C008] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
