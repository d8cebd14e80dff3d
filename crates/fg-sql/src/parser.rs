//! SQL parser wrapper

use crate::dialect::{DuckDbDialect, GenericDialect, PostgresDialect, SnowflakeDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use crate::lower::lower_statements;
use crate::tree::SqlTree;
use fg_core::config::{Dialect, DEFAULT_MAX_DEPTH};
use sqlparser::ast::Statement;

/// SQL parser that wraps sqlparser-rs with dialect support and lowers the
/// parsed statements into a [`SqlTree`].
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
    max_depth: usize,
}

impl SqlParser {
    /// Create a parser for the given dialect
    pub fn new(dialect: Dialect) -> Self {
        let dialect: Box<dyn SqlDialect> = match dialect {
            Dialect::Snowflake => Box::new(SnowflakeDialect::new()),
            Dialect::DuckDb => Box::new(DuckDbDialect::new()),
            Dialect::Postgres => Box::new(PostgresDialect::new()),
            Dialect::Generic => Box::new(GenericDialect::new()),
        };
        Self {
            dialect,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a parser from dialect name
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        name.parse::<Dialect>()
            .map(Self::new)
            .map_err(|_| SqlError::UnknownDialect(name.to_string()))
    }

    /// Bound the nesting depth accepted while lowering
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql, self.max_depth)
    }

    /// Parse SQL and lower every statement into one tree
    pub fn parse_tree(&self, sql: &str) -> SqlResult<SqlTree> {
        let statements = self.parse(sql)?;
        lower_statements(&statements, self.max_depth, self.dialect.identifier_case())
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
