//! Shared test utilities for fg-analysis

use crate::types::ValidationResult;
use crate::validator::FilterValidator;
use fg_core::config::Dialect;
use fg_core::rules::FilterRule;
use fg_core::value::Value;
use fg_sql::{NodeId, SqlParser, SqlTree};

/// Parse with the default (Snowflake) dialect, panicking on failure
pub fn parse(sql: &str) -> SqlTree {
    SqlParser::default()
        .parse_tree(sql)
        .unwrap_or_else(|e| panic!("failed to parse {sql:?}: {e}"))
}

/// Some node id, for building model values by hand
pub fn any_node() -> NodeId {
    parse("SELECT 1").root()
}

/// Equality rule shorthand
pub fn rule(table: &str, column: &str, value: impl Into<Value>) -> FilterRule {
    FilterRule::new(table, column, value)
}

/// `users.deleted = 0`, the rule most scenarios use
pub fn users_deleted_rule() -> FilterRule {
    rule("users", "deleted", 0)
}

/// Snowflake validator with the given rules
pub fn validator(rules: Vec<FilterRule>) -> FilterValidator {
    FilterValidator::new(rules, Dialect::Snowflake)
        .unwrap_or_else(|e| panic!("invalid test rules: {e}"))
}

/// Validator holding only [`users_deleted_rule`]
pub fn users_validator() -> FilterValidator {
    validator(vec![users_deleted_rule()])
}

/// Validate `sql` against `rules`, panicking if validation errors
pub fn validate(rules: Vec<FilterRule>, sql: &str) -> ValidationResult {
    validator(rules)
        .validate(sql)
        .unwrap_or_else(|e| panic!("validation failed for {sql:?}: {e}"))
}
