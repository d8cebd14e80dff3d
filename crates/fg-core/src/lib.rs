//! fg-core - Core library for filterguard
//!
//! This crate provides the shared vocabulary used across filterguard: literal
//! values and comparison operators, mandatory filter rules, the
//! `filterguard.yml` configuration, and the optional schema catalog used by
//! the column check.

pub mod config;
pub mod error;
pub mod rules;
pub mod schema;
pub mod value;

pub use config::{CteResolution, Dialect, ParseFailurePolicy, ValidatorConfig};
pub use error::{CoreError, CoreResult};
pub use rules::FilterRule;
pub use schema::{SchemaCatalog, TableSchema};
pub use value::{Operator, Value};
