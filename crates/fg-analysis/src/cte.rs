//! CTE registry: WITH members by name, and their mapping to physical tables.

use crate::types::CteDefinition;
use fg_core::config::CteResolution;
use fg_sql::{NodeKind, NodeTag, SqlTree};
use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Every CTE defined anywhere in the query, keyed by name.
///
/// Names are global to the query: a CTE defined in a nested WITH shadows
/// nothing and is visible everywhere. When a name is defined twice the last
/// definition wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CteRegistry {
    definitions: Vec<CteDefinition>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl CteRegistry {
    pub fn collect(tree: &SqlTree) -> Self {
        let mut registry = Self::default();
        for id in tree.find_all(NodeTag::Cte) {
            let NodeKind::Cte { name } = tree.kind(id) else {
                continue;
            };
            let Some(body) = tree.body(id) else {
                continue;
            };
            let definition = CteDefinition {
                name: name.clone(),
                node: id,
                body,
            };
            match registry.by_name.get(name) {
                Some(&slot) => {
                    debug!("CTE '{}' defined more than once, keeping the last definition", name);
                    registry.definitions[slot] = definition;
                }
                None => {
                    registry
                        .by_name
                        .insert(name.clone(), registry.definitions.len());
                    registry.names.insert(name.clone());
                    registry.definitions.push(definition);
                }
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&CteDefinition> {
        self.by_name.get(name).map(|&slot| &self.definitions[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    /// Definitions in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = &CteDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The physical table a CTE reads from.
    ///
    /// With [`CteResolution::SingleHop`] this is the first table in the body,
    /// in pre-order, that is not itself a CTE; a body that only reads other
    /// CTEs resolves to nothing. [`CteResolution::Transitive`] follows CTE
    /// references until a physical table is reached, giving up on cycles.
    pub fn first_physical_table(
        &self,
        tree: &SqlTree,
        name: &str,
        mode: CteResolution,
    ) -> Option<String> {
        match mode {
            CteResolution::SingleHop => {
                let definition = self.get(name)?;
                tree.first_table_excluding(definition.body, &self.names)
                    .and_then(|id| tree.table_name(id))
                    .map(str::to_string)
            }
            CteResolution::Transitive => {
                let mut visited = HashSet::new();
                self.chase(tree, name, &mut visited)
            }
        }
    }

    fn chase(&self, tree: &SqlTree, name: &str, visited: &mut HashSet<String>) -> Option<String> {
        if !visited.insert(name.to_string()) {
            debug!("CTE '{}' reached twice while resolving, stopping", name);
            return None;
        }
        let definition = self.get(name)?;
        for id in tree.descendants(definition.body) {
            let Some(table) = tree.table_name(id) else {
                continue;
            };
            if !self.contains(table) {
                return Some(table.to_string());
            }
            if let Some(found) = self.chase(tree, table, visited) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "cte_test.rs"]
mod tests;
