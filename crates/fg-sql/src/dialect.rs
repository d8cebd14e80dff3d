//! SQL dialect abstraction

use sqlparser::ast::Statement;
use sqlparser::dialect::Dialect;
use sqlparser::parser::{Parser, ParserError};

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements, recursing at most `max_depth` levels
    fn parse(&self, sql: &str, max_depth: usize) -> SqlResult<Vec<Statement>> {
        Parser::new(self.parser_dialect())
            .with_recursion_limit(max_depth)
            .try_with_sql(sql)
            .and_then(|mut parser| parser.parse_statements())
            .map_err(|e| match e {
                ParserError::RecursionLimitExceeded => SqlError::NestingTooDeep { max_depth },
                e => {
                    let message = e.to_string();
                    let (line, column) = parse_location_from_error(&message);
                    SqlError::ParseError {
                        message,
                        line,
                        column,
                    }
                }
            })
    }

    /// How unquoted identifiers fold, which decides when a quoted name
    /// denotes the same object as an unquoted one
    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Lower
    }

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// Case folding a dialect applies to unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierCase {
    /// Unquoted names fold to lowercase (Postgres, ANSI-ish)
    #[default]
    Lower,
    /// Unquoted names fold to uppercase (Snowflake)
    Upper,
    /// Every name compares case-insensitively, quoted or not (DuckDB)
    Insensitive,
}

impl IdentifierCase {
    /// Canonical spelling of an identifier. Unquoted names are lowercased;
    /// a quoted name is lowercased only when the dialect would resolve it to
    /// the same object as its unquoted form.
    pub fn canonical(self, value: &str, quoted: bool) -> String {
        let folds = !quoted
            || match self {
                IdentifierCase::Lower => false,
                IdentifierCase::Upper => value == value.to_uppercase(),
                IdentifierCase::Insensitive => true,
            };
        if folds {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }
}

/// Pull "Line: N, Column: M" out of a sqlparser error message.
///
/// `ParserError` carries no structured location, only text. Returns `(0, 0)`
/// when the message has no location.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    fn number_after(msg: &str, label: &str) -> Option<usize> {
        let start = msg.find(label)? + label.len();
        let rest = &msg[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    }

    match (number_after(msg, "Line: "), number_after(msg, "Column: ")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

macro_rules! define_dialect {
    ($(#[$meta:meta])* $Name:ident, $Inner:ty, $label:literal, $case:expr) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $Name {
            dialect: $Inner,
        }

        impl $Name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl SqlDialect for $Name {
            fn parser_dialect(&self) -> &dyn Dialect {
                &self.dialect
            }

            fn identifier_case(&self) -> IdentifierCase {
                $case
            }

            fn name(&self) -> &'static str {
                $label
            }
        }
    };
}

define_dialect!(
    /// Snowflake SQL dialect
    SnowflakeDialect,
    sqlparser::dialect::SnowflakeDialect,
    "snowflake",
    IdentifierCase::Upper
);

define_dialect!(
    /// DuckDB SQL dialect
    DuckDbDialect,
    sqlparser::dialect::DuckDbDialect,
    "duckdb",
    IdentifierCase::Insensitive
);

define_dialect!(
    /// PostgreSQL dialect
    PostgresDialect,
    sqlparser::dialect::PostgreSqlDialect,
    "postgres",
    IdentifierCase::Lower
);

define_dialect!(
    /// Permissive generic dialect
    GenericDialect,
    sqlparser::dialect::GenericDialect,
    "generic",
    IdentifierCase::Lower
);

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
