//! Alias map: qualifiers and relation names to canonical physical tables.

use crate::cte::CteRegistry;
use crate::types::{CteUsage, DerivedTable, TableReference};
use fg_core::config::CteResolution;
use fg_sql::{NodeId, SqlTree};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Map from every name a filter may be qualified with to the physical table
/// it stands for.
///
/// Contributions are applied in a fixed order (table references, CTEs, CTE
/// usages, derived tables) and a later contribution overwrites an earlier
/// one for the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AliasMap {
    map: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn build(
        tree: &SqlTree,
        references: &[TableReference],
        usages: &[CteUsage],
        derived: &[DerivedTable],
        ctes: &CteRegistry,
        mode: CteResolution,
    ) -> Self {
        let mut aliases = Self::default();

        for reference in references {
            if let Some(alias) = &reference.alias {
                aliases.insert(alias, &reference.table_name);
            }
            aliases.insert(&reference.table_name, &reference.table_name);
        }

        for definition in ctes.iter() {
            if let Some(table) = ctes.first_physical_table(tree, &definition.name, mode) {
                aliases.insert(&definition.name, &table);
            }
        }

        for usage in usages {
            if let Some(alias) = &usage.alias {
                let target = aliases.canonical(&usage.cte_name).to_string();
                aliases.insert(alias, &target);
            }
        }

        for table in derived {
            let Some(alias) = &table.alias else {
                continue;
            };
            if let Some(target) = aliases.first_table_in(tree, table.body, usages, ctes) {
                aliases.insert(alias, &target);
            }
        }

        aliases
    }

    fn insert(&mut self, key: &str, value: &str) {
        if let Some(previous) = self.map.insert(key.to_string(), value.to_string()) {
            if previous != value {
                debug!(
                    "Alias '{}' remapped from '{}' to '{}'",
                    key, previous, value
                );
            }
        }
    }

    /// First physical table in a derived body, looking through a leading
    /// CTE usage when the body has no physical table of its own.
    fn first_table_in(
        &self,
        tree: &SqlTree,
        body: NodeId,
        usages: &[CteUsage],
        ctes: &CteRegistry,
    ) -> Option<String> {
        if let Some(id) = tree.first_table_excluding(body, ctes.names()) {
            return tree.table_name(id).map(str::to_string);
        }
        usages
            .iter()
            .find(|u| tree.is_descendant_of(u.node, body))
            .map(|u| self.canonical(&u.cte_name))
            .filter(|target| !ctes.contains(target))
            .map(str::to_string)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Canonical table for `name`, or `name` itself when it is not mapped.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    /// Distinct canonical tables.
    pub fn tables(&self) -> BTreeSet<&str> {
        self.map.values().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
#[path = "alias_test.rs"]
mod tests;
