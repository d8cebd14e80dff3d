//! Error types for fg-analysis

use thiserror::Error;

/// Analysis error type
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// AE001: SQL could not be parsed and the validator runs in strict mode
    #[error("[AE001] SQL parse failure: {0}")]
    ParseFailed(#[source] fg_sql::SqlError),

    /// AE002: Core error propagation
    #[error("[AE002] Core error: {0}")]
    Core(#[from] fg_core::CoreError),

    /// AE003: SQL crate error propagation
    #[error("[AE003] SQL error: {0}")]
    Sql(#[from] fg_sql::SqlError),
}

/// Result type alias for AnalysisError
pub type AnalysisResult<T> = Result<T, AnalysisError>;
