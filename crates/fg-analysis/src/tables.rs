//! Table reference collection.

use crate::analysis::{scope_level, VisitSet};
use crate::cte::CteRegistry;
use crate::types::{CteUsage, DerivedTable, TableReference};
use fg_sql::{NodeKind, NodeTag, SqlTree};

/// Relations found in FROM clauses.
#[derive(Debug, Clone, Default)]
pub struct TableCollection {
    /// Synthetic CTE references first, then physical tables in document order
    pub references: Vec<TableReference>,
    pub cte_usages: Vec<CteUsage>,
    pub derived: Vec<DerivedTable>,
}

/// Collect table references, CTE usages and derived tables.
///
/// Each CTE contributes one synthetic reference at level 0. A `Table` node
/// whose name matches a CTE is a usage of that CTE rather than a table
/// reference. Occurrences are keyed by node, so a table joined to itself
/// yields two references.
pub fn collect_tables(
    tree: &SqlTree,
    ctes: &CteRegistry,
    seen: &mut VisitSet,
) -> TableCollection {
    let mut out = TableCollection::default();

    for definition in ctes.iter() {
        if !seen.first_visit(definition.node) {
            continue;
        }
        out.references.push(TableReference {
            table_name: definition.name.clone(),
            alias: Some(definition.name.clone()),
            is_cte: true,
            scope_level: 0,
            node: definition.node,
        });
    }

    for id in tree.find_all(NodeTag::Table) {
        if !seen.first_visit(id) {
            continue;
        }
        let NodeKind::Table { name, alias, .. } = tree.kind(id) else {
            continue;
        };
        let level = scope_level(tree, id);
        if ctes.contains(name) {
            out.cte_usages.push(CteUsage {
                cte_name: name.clone(),
                alias: alias.clone(),
                scope_level: level,
                node: id,
            });
        } else {
            out.references.push(TableReference {
                table_name: name.clone(),
                alias: alias.clone(),
                is_cte: false,
                scope_level: level,
                node: id,
            });
        }
    }

    for id in tree.find_all(NodeTag::Derived) {
        let NodeKind::Derived { alias } = tree.kind(id) else {
            continue;
        };
        if let Some(body) = tree.body(id) {
            out.derived.push(DerivedTable {
                alias: alias.clone(),
                node: id,
                body,
            });
        }
    }

    out
}

#[cfg(test)]
#[path = "tables_test.rs"]
mod tests;
