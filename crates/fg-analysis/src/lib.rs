//! fg-analysis: filter policy analysis for SQL queries
//!
//! The passes run over a lowered [`fg_sql::SqlTree`] in a fixed order:
//! CTE registry, table references, filter extraction, alias map, filter
//! resolution, and finally the rule engine. [`FilterValidator`] wires them
//! together behind a single `validate(sql)` call; [`ColumnChecker`] reuses
//! the same analysis to flag columns missing from a declared schema.

pub mod alias;
pub mod analysis;
pub mod columns;
pub mod cte;
pub mod engine;
pub(crate) mod error;
pub mod filters;
pub mod index;
pub mod resolve;
pub mod tables;
pub mod types;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use alias::AliasMap;
pub use analysis::{QueryAnalysis, VisitSet};
pub use columns::{ColumnChecker, ColumnReport};
pub use cte::CteRegistry;
pub use engine::evaluate;
pub use error::{AnalysisError, AnalysisResult};
pub use index::RuleIndex;
pub use resolve::{resolve_filters, Coverage, FilterGroups, ResolvedCondition};
pub use types::{
    CteDefinition, CteUsage, DerivedTable, FilterCondition, FilterLocation, TableReference,
    ValidationResult, Violation,
};
pub use validator::FilterValidator;
