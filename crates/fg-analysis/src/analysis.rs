//! Per-query analysis model shared by the resolver, rule engine and column
//! check.

use crate::alias::AliasMap;
use crate::cte::CteRegistry;
use crate::filters::extract_filters;
use crate::tables::collect_tables;
use crate::types::{CteUsage, DerivedTable, FilterCondition, TableReference};
use fg_core::config::CteResolution;
use fg_sql::{NodeId, NodeTag, SqlTree};
use serde::Serialize;
use std::collections::HashSet;

/// Nodes already handled during one analysis run.
///
/// Keyed by node identity, so two structurally equal subtrees at different
/// positions are separate visits.
#[derive(Debug, Default)]
pub struct VisitSet {
    seen: HashSet<NodeId>,
}

impl VisitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns `false` if it was already recorded.
    pub fn first_visit(&mut self, id: NodeId) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Number of enclosing queries minus one; the outermost query is level 0.
pub(crate) fn scope_level(tree: &SqlTree, id: NodeId) -> usize {
    tree.ancestors(id)
        .filter(|&a| tree.tag(a) == NodeTag::Query)
        .count()
        .saturating_sub(1)
}

/// Everything the analysis passes learn about one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnalysis {
    pub tables: Vec<TableReference>,
    pub cte_usages: Vec<CteUsage>,
    pub derived_tables: Vec<DerivedTable>,
    pub ctes: CteRegistry,
    pub conditions: Vec<FilterCondition>,
    pub aliases: AliasMap,
    pub cte_resolution: CteResolution,
}

impl QueryAnalysis {
    /// Run the collection passes over `tree` with a fresh visit set.
    pub fn analyze(tree: &SqlTree, cte_resolution: CteResolution) -> Self {
        let mut seen = VisitSet::new();
        let ctes = CteRegistry::collect(tree);
        let collected = collect_tables(tree, &ctes, &mut seen);
        let conditions = extract_filters(tree, &mut seen);
        let aliases = AliasMap::build(
            tree,
            &collected.references,
            &collected.cte_usages,
            &collected.derived,
            &ctes,
            cte_resolution,
        );

        log::debug!(
            "Analyzed query: {} table reference(s), {} CTE(s), {} condition(s), {} alias(es)",
            collected.references.len(),
            ctes.len(),
            conditions.len(),
            aliases.len()
        );

        Self {
            tables: collected.references,
            cte_usages: collected.cte_usages,
            derived_tables: collected.derived,
            ctes,
            conditions,
            aliases,
            cte_resolution,
        }
    }

    /// Non-CTE references to `table`.
    pub fn physical_references<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a TableReference> + 'a {
        self.tables
            .iter()
            .filter(move |r| !r.is_cte && r.table_name == table)
    }

    /// Whether any reference resolves to `table`.
    pub fn uses_table(&self, table: &str) -> bool {
        self.tables.iter().any(|r| {
            (!r.is_cte && r.table_name == table) || self.aliases.canonical(&r.table_name) == table
        })
    }
}
