//! fg-sql - SQL parsing layer for filterguard
//!
//! This crate parses SQL with sqlparser-rs and lowers the resulting AST into
//! an immutable arena of typed nodes ([`SqlTree`]). Every later analysis pass
//! walks that arena instead of the parser's AST.

pub mod dialect;
pub mod error;
mod lower;
pub mod parser;
pub mod tree;

pub use dialect::{
    DuckDbDialect, GenericDialect, IdentifierCase, PostgresDialect, SnowflakeDialect, SqlDialect,
};
pub use error::{SqlError, SqlResult};
pub use lower::lower_statements;
pub use parser::SqlParser;
pub use tree::{Node, NodeId, NodeKind, NodeTag, SqlTree};
