//! Column existence check against declared table schemas.

use crate::analysis::QueryAnalysis;
use crate::error::AnalysisResult;
use crate::types::TableReference;
use fg_core::config::{CteResolution, ValidatorConfig};
use fg_core::schema::SchemaCatalog;
use fg_core::Dialect;
use fg_sql::{NodeId, NodeKind, NodeTag, SqlParser, SqlTree};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Columns referenced by a query but absent from their table's schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    /// Table name to unknown column names, sorted
    pub unknown_columns: BTreeMap<String, Vec<String>>,
}

impl ColumnReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_columns.is_empty()
    }
}

/// Resolves column references to tables and checks them against a
/// [`SchemaCatalog`]. Tables missing from the catalog are not checked.
pub struct ColumnChecker {
    catalog: SchemaCatalog,
    parser: SqlParser,
    cte_resolution: CteResolution,
}

impl ColumnChecker {
    pub fn new(catalog: SchemaCatalog, dialect: Dialect) -> Self {
        Self {
            catalog,
            parser: SqlParser::new(dialect),
            cte_resolution: CteResolution::default(),
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> AnalysisResult<Self> {
        let mut checker = Self::new(config.catalog()?, config.dialect);
        checker.parser = checker.parser.with_max_depth(config.max_depth);
        checker.cte_resolution = config.cte_resolution;
        Ok(checker)
    }

    /// Parse `sql` and check it. Parse failures are returned as errors.
    pub fn check(&self, sql: &str) -> AnalysisResult<ColumnReport> {
        let tree = self.parser.parse_tree(sql)?;
        Ok(self.check_tree(&tree))
    }

    pub fn check_tree(&self, tree: &SqlTree) -> ColumnReport {
        let analysis = QueryAnalysis::analyze(tree, self.cte_resolution);
        let output_names: HashSet<&str> = tree
            .find_all(NodeTag::Projection)
            .filter_map(|id| match tree.kind(id) {
                NodeKind::Projection { alias } => alias.as_deref(),
                _ => None,
            })
            .collect();

        let mut unknown: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for id in tree.find_all(NodeTag::Column) {
            let NodeKind::Column { table, name } = tree.kind(id) else {
                continue;
            };
            let resolved = match table {
                Some(qualifier) => self.qualified_table(&analysis, qualifier),
                None if output_names.contains(name.as_str()) => None,
                None => self.unqualified_table(tree, &analysis, id),
            };
            let Some(resolved) = resolved else {
                continue;
            };
            if self.catalog.has_column(&resolved, name) == Some(false) {
                unknown.entry(resolved).or_default().insert(name.clone());
            }
        }

        ColumnReport {
            unknown_columns: unknown
                .into_iter()
                .map(|(table, columns)| (table, columns.into_iter().collect()))
                .collect(),
        }
    }

    /// Table behind a qualifier that names a physical table occurrence.
    /// Qualifiers naming a CTE or derived table are skipped; their columns
    /// are whatever the body projects.
    fn qualified_table(&self, analysis: &QueryAnalysis, qualifier: &str) -> Option<String> {
        let bound = analysis.tables.iter().any(|r| {
            !r.is_cte && (r.alias.as_deref() == Some(qualifier) || r.table_name == qualifier)
        });
        bound.then(|| analysis.aliases.canonical(qualifier).to_string())
    }

    /// First catalogued table of the column's own SELECT, else the first
    /// catalogued table of the whole query.
    fn unqualified_table(
        &self,
        tree: &SqlTree,
        analysis: &QueryAnalysis,
        id: NodeId,
    ) -> Option<String> {
        let known = |r: &&TableReference| !r.is_cte && self.catalog.has_table(&r.table_name);
        let select = tree.nearest_ancestor(id, NodeTag::Select);
        analysis
            .tables
            .iter()
            .filter(known)
            .find(|r| select.is_some() && tree.nearest_ancestor(r.node, NodeTag::Select) == select)
            .or_else(|| analysis.tables.iter().find(known))
            .map(|r| r.table_name.clone())
    }
}

#[cfg(test)]
#[path = "columns_test.rs"]
mod tests;
