//! Rule evaluation over resolved filter groups.

use crate::analysis::QueryAnalysis;
use crate::index::RuleIndex;
use crate::resolve::{FilterGroups, ResolvedCondition};
use crate::types::{TableReference, ValidationResult, Violation};
use fg_core::rules::FilterRule;
use log::debug;

/// Check every rule against the analysis of one query.
///
/// A rule applies only when its table is used. It is satisfied when each
/// physical occurrence of the table is covered by a condition with the
/// rule's operator and value; a table reached only through a CTE mapping
/// needs just one matching condition.
pub fn evaluate(
    rules: &RuleIndex,
    analysis: &QueryAnalysis,
    groups: &FilterGroups,
) -> ValidationResult {
    let mut result = ValidationResult {
        applied_filters: groups.applied_filters(),
        ..ValidationResult::default()
    };

    for reference in &analysis.tables {
        result
            .table_usage
            .entry(reference.table_name.clone())
            .or_default()
            .push(reference.usage_entry());
    }

    for rule in rules.rules() {
        if !analysis.uses_table(&rule.table_name) {
            continue;
        }
        result.validated_tables.insert(rule.table_name.clone());

        let group = groups.get(&rule.table_name, &rule.column_name);
        let matching: Vec<&ResolvedCondition> = group
            .iter()
            .filter(|r| r.condition.satisfies(rule))
            .collect();

        let physical: Vec<&TableReference> =
            analysis.physical_references(&rule.table_name).collect();
        let uncovered: Vec<&TableReference> = if physical.is_empty() {
            if matching.is_empty() {
                analysis
                    .tables
                    .iter()
                    .filter(|r| analysis.aliases.canonical(&r.table_name) == rule.table_name)
                    .collect()
            } else {
                Vec::new()
            }
        } else {
            physical
                .into_iter()
                .filter(|r| !matching.iter().any(|m| m.coverage.covers(r)))
                .collect()
        };

        if uncovered.is_empty() && !matching.is_empty() {
            debug!("Rule {} satisfied by {} condition(s)", rule, matching.len());
            continue;
        }

        result.violations.push(violation(rule, &uncovered, group));
    }

    result.passed = result.violations.is_empty();
    result
}

fn violation(
    rule: &FilterRule,
    uncovered: &[&TableReference],
    group: &[ResolvedCondition],
) -> Violation {
    let table_found_at = if uncovered.is_empty() {
        "query".to_string()
    } else {
        uncovered
            .iter()
            .map(|r| r.location())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let qualifier = uncovered
        .iter()
        .find(|r| !r.is_cte)
        .and_then(|r| r.alias.as_deref())
        .map(|alias| format!("{}.", alias))
        .unwrap_or_default();

    Violation {
        rule: rule.clone(),
        table_found_at,
        missing_filter: rule.requirement(),
        found_filters: group.iter().map(|r| r.condition.text.clone()).collect(),
        suggestion: format!(
            "Add 'AND {}{}' to the WHERE clause",
            qualifier,
            rule.requirement()
        ),
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
