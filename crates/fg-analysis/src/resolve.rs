//! Filter resolution: group extracted conditions by the canonical
//! `table.column` they constrain, and record which table occurrences each
//! condition covers.

use crate::analysis::QueryAnalysis;
use crate::index::RuleIndex;
use crate::types::{FilterCondition, TableReference};
use fg_sql::{NodeId, NodeTag, SqlTree};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Occurrences of the canonical table a condition constrains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Every occurrence
    All,
    /// Only the table references with these nodes
    Refs(BTreeSet<NodeId>),
}

impl Coverage {
    pub fn covers(&self, reference: &TableReference) -> bool {
        match self {
            Coverage::All => true,
            Coverage::Refs(nodes) => nodes.contains(&reference.node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCondition {
    pub condition: FilterCondition,
    pub coverage: Coverage,
}

/// Conditions grouped under `table.column` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterGroups {
    groups: BTreeMap<String, Vec<ResolvedCondition>>,
}

impl FilterGroups {
    pub fn key(table: &str, column: &str) -> String {
        format!("{}.{}", table, column)
    }

    pub fn get(&self, table: &str, column: &str) -> &[ResolvedCondition] {
        self.groups
            .get(&Self::key(table, column))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Plain conditions per group, the shape reported in
    /// `ValidationResult::applied_filters`.
    pub fn applied_filters(&self) -> BTreeMap<String, Vec<FilterCondition>> {
        self.groups
            .iter()
            .map(|(key, resolved)| {
                let conditions = resolved.iter().map(|r| r.condition.clone()).collect();
                (key.clone(), conditions)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, table: &str, condition: &FilterCondition, coverage: Coverage) {
        self.groups
            .entry(Self::key(table, &condition.column_name))
            .or_default()
            .push(ResolvedCondition {
                condition: condition.clone(),
                coverage,
            });
    }
}

/// Resolve every extracted condition of `analysis`.
///
/// A qualified condition lands in exactly one group, found through the
/// alias map. An unqualified condition is broadcast to every canonical table
/// that has a rule on its column, covering all occurrences of each.
pub fn resolve_filters(
    tree: &SqlTree,
    analysis: &QueryAnalysis,
    rules: &RuleIndex,
) -> FilterGroups {
    let mut groups = FilterGroups::default();
    let candidates = analysis.aliases.tables();

    for condition in &analysis.conditions {
        match &condition.table_ref {
            Some(qualifier) => {
                let table = analysis.aliases.canonical(qualifier);
                let coverage = coverage(tree, analysis, condition, qualifier, table);
                groups.push(table, condition, coverage);
            }
            None => {
                let targets: Vec<_> = candidates
                    .iter()
                    .filter(|t| rules.has_rule(t, &condition.column_name))
                    .collect();
                if targets.len() > 1 {
                    debug!(
                        "Unqualified '{}' applied to {} tables",
                        condition.text,
                        targets.len()
                    );
                }
                for table in targets {
                    groups.push(table, condition, Coverage::All);
                }
            }
        }
    }

    groups
}

fn coverage(
    tree: &SqlTree,
    analysis: &QueryAnalysis,
    condition: &FilterCondition,
    qualifier: &str,
    table: &str,
) -> Coverage {
    let binding: Vec<_> = analysis
        .physical_references(table)
        .filter(|r| r.alias.as_deref() == Some(qualifier) || r.table_name == qualifier)
        .collect();

    if !binding.is_empty() {
        return Coverage::Refs(lexically_nearest(tree, condition.source_node, &binding));
    }

    let bodies = relation_bodies(analysis, qualifier);
    if !bodies.is_empty() {
        let mut covered = BTreeSet::new();
        let mut visited = HashSet::new();
        for body in bodies {
            references_within(tree, analysis, table, body, &mut visited, &mut covered);
        }
        if !covered.is_empty() {
            return Coverage::Refs(covered);
        }
    }

    Coverage::All
}

/// Binding references owned by the nearest enclosing SELECT of `node` that
/// owns any; all of them when no enclosing SELECT does.
fn lexically_nearest(
    tree: &SqlTree,
    node: NodeId,
    binding: &[&TableReference],
) -> BTreeSet<NodeId> {
    for select in tree.ancestors(node).filter(|&a| tree.tag(a) == NodeTag::Select) {
        let owned: BTreeSet<_> = binding
            .iter()
            .filter(|r| tree.nearest_ancestor(r.node, NodeTag::Select) == Some(select))
            .map(|r| r.node)
            .collect();
        if !owned.is_empty() {
            return owned;
        }
    }
    binding.iter().map(|r| r.node).collect()
}

/// Bodies of the CTEs and derived tables `qualifier` can name.
fn relation_bodies(analysis: &QueryAnalysis, qualifier: &str) -> Vec<NodeId> {
    let mut bodies = Vec::new();
    if let Some(definition) = analysis.ctes.get(qualifier) {
        bodies.push(definition.body);
    }
    for usage in &analysis.cte_usages {
        let named = match &usage.alias {
            Some(alias) => alias == qualifier,
            None => usage.cte_name == qualifier,
        };
        if named {
            if let Some(definition) = analysis.ctes.get(&usage.cte_name) {
                bodies.push(definition.body);
            }
        }
    }
    for derived in &analysis.derived_tables {
        if derived.alias.as_deref() == Some(qualifier) {
            bodies.push(derived.body);
        }
    }
    bodies
}

/// Physical references of `table` inside `body`, following CTE usages into
/// their definitions.
fn references_within(
    tree: &SqlTree,
    analysis: &QueryAnalysis,
    table: &str,
    body: NodeId,
    visited: &mut HashSet<NodeId>,
    covered: &mut BTreeSet<NodeId>,
) {
    if !visited.insert(body) {
        return;
    }
    covered.extend(
        analysis
            .physical_references(table)
            .filter(|r| tree.is_descendant_of(r.node, body))
            .map(|r| r.node),
    );
    for usage in &analysis.cte_usages {
        if !tree.is_descendant_of(usage.node, body) {
            continue;
        }
        if let Some(definition) = analysis.ctes.get(&usage.cte_name) {
            references_within(tree, analysis, table, definition.body, visited, covered);
        }
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
