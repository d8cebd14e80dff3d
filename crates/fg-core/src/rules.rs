//! Mandatory filter rules.

use crate::error::{CoreError, CoreResult};
use crate::value::{Operator, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A policy of the form "any query touching `table_name` must constrain
/// `column_name` with `operator required_value`".
///
/// In configuration files the fields are spelled `table`, `column`, `value`
/// and `operator`; `operator` defaults to `=`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRule {
    #[serde(rename = "table")]
    pub table_name: String,

    #[serde(rename = "column")]
    pub column_name: String,

    #[serde(rename = "value")]
    pub required_value: Value,

    #[serde(default)]
    pub operator: Operator,
}

impl FilterRule {
    /// Create an equality rule.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        required_value: impl Into<Value>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            required_value: required_value.into(),
            operator: Operator::Eq,
        }
    }

    /// Replace the operator.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Copy of the rule with table and column names lowercased, the form
    /// unquoted SQL identifiers take after lowering.
    pub fn normalized(&self) -> Self {
        Self {
            table_name: self.table_name.trim().to_lowercase(),
            column_name: self.column_name.trim().to_lowercase(),
            required_value: self.required_value.clone(),
            operator: self.operator,
        }
    }

    /// `column op value`, e.g. `deleted = 0`.
    pub fn requirement(&self) -> String {
        format!(
            "{} {} {}",
            self.column_name, self.operator, self.required_value
        )
    }

    /// Reject rules no query could ever satisfy.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidRule {
            rule: self.to_string(),
            reason: reason.to_string(),
        };

        if self.table_name.trim().is_empty() {
            return Err(invalid("table name is empty"));
        }
        if self.column_name.trim().is_empty() {
            return Err(invalid("column name is empty"));
        }
        if self.required_value.is_expression() {
            return Err(invalid("required value must be a literal"));
        }
        if self.required_value.is_list() {
            let reason = if self.operator == Operator::In {
                "IN rules take a single required value that must appear in the list"
            } else {
                "a list value is only meaningful with the IN operator"
            };
            return Err(invalid(reason));
        }
        Ok(())
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {} {}",
            self.table_name, self.column_name, self.operator, self.required_value
        )
    }
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod tests;
