//! Analysis model types: table references, CTEs, filter conditions, and
//! validation results.

use fg_core::rules::FilterRule;
use fg_core::value::{Operator, Value};
use fg_sql::NodeId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One occurrence of a table in the query.
///
/// Identity is `node`: two occurrences of the same table (a self-join) are
/// distinct references. CTE references are synthetic, one per CTE, with the
/// CTE name as both `table_name` and `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReference {
    pub table_name: String,
    pub alias: Option<String>,
    pub is_cte: bool,
    /// Enclosing queries minus one; the outermost query is level 0
    pub scope_level: usize,
    pub node: NodeId,
}

impl TableReference {
    /// Human-readable location, e.g. `level 1 as u` or `CTE level 0 as x`.
    pub fn location(&self) -> String {
        let mut out = String::new();
        if self.is_cte {
            out.push_str("CTE ");
        }
        out.push_str(&format!("level {}", self.scope_level));
        if let Some(alias) = &self.alias {
            out.push_str(&format!(" as {}", alias));
        }
        out
    }

    /// Entry for `ValidationResult::table_usage`, e.g. `level_0:u` or
    /// `CTE:level_0:x`.
    pub fn usage_entry(&self) -> String {
        let mut out = String::new();
        if self.is_cte {
            out.push_str("CTE:");
        }
        out.push_str(&format!("level_{}", self.scope_level));
        if let Some(alias) = &self.alias {
            out.push(':');
            out.push_str(alias);
        }
        out
    }
}

/// A `WITH` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CteDefinition {
    pub name: String,
    /// The `Cte` node
    pub node: NodeId,
    /// The `Query` node of the CTE body
    pub body: NodeId,
}

/// A `FROM` item that names a CTE rather than a physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CteUsage {
    pub cte_name: String,
    pub alias: Option<String>,
    pub scope_level: usize,
    pub node: NodeId,
}

/// A subquery in FROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedTable {
    pub alias: Option<String>,
    pub node: NodeId,
    pub body: NodeId,
}

/// Clause a filter condition was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterLocation {
    Where,
    Join,
    Having,
}

impl fmt::Display for FilterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterLocation::Where => write!(f, "WHERE"),
            FilterLocation::Join => write!(f, "JOIN"),
            FilterLocation::Having => write!(f, "HAVING"),
        }
    }
}

/// A `column op value` comparison extracted from a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCondition {
    /// Qualifier as written; `None` for unqualified columns
    pub table_ref: Option<String>,
    pub column_name: String,
    pub operator: Operator,
    pub value: Value,
    pub location: FilterLocation,
    pub scope_level: usize,
    pub source_node: NodeId,
    /// SQL text of the comparison
    pub text: String,
}

impl FilterCondition {
    /// Whether this condition fulfils `rule`'s operator and value.
    ///
    /// `IN` rules match when the required value is one of the listed values.
    pub fn satisfies(&self, rule: &FilterRule) -> bool {
        if self.operator != rule.operator {
            return false;
        }
        match self.operator {
            Operator::In => self.value.contains(&rule.required_value),
            _ => self.value == rule.required_value,
        }
    }

    /// `qualifier.column` or just `column`.
    pub fn column_display(&self) -> String {
        match &self.table_ref {
            Some(t) => format!("{}.{}", t, self.column_name),
            None => self.column_name.clone(),
        }
    }
}

/// A rule the query does not satisfy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub rule: FilterRule,
    pub table_found_at: String,
    pub missing_filter: String,
    pub found_filters: Vec<String>,
    pub suggestion: String,
}

/// Outcome of validating one query.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub violations: Vec<Violation>,
    pub validated_tables: BTreeSet<String>,
    pub table_usage: BTreeMap<String, Vec<String>>,
    pub applied_filters: BTreeMap<String, Vec<FilterCondition>>,
    /// Parse diagnostic when the query could not be analyzed and the
    /// validator fails open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl ValidationResult {
    /// A passing result for SQL that could not be analyzed.
    pub fn unparsed(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            parse_error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
