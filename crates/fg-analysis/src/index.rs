//! Validated rule set indexed by `(table, column)`.

use crate::error::AnalysisResult;
use fg_core::rules::FilterRule;
use log::debug;
use std::collections::HashMap;

/// Normalized rules plus an index for constant-time lookup by column.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<FilterRule>,
    by_column: HashMap<(String, String), Vec<usize>>,
}

impl RuleIndex {
    /// Validate and normalize `rules`. Exact duplicates are dropped.
    pub fn new(rules: &[FilterRule]) -> AnalysisResult<Self> {
        let mut index = Self::default();
        for rule in rules {
            rule.validate()?;
            let rule = rule.normalized();
            if index.rules.contains(&rule) {
                debug!("Ignoring duplicate rule {}", rule);
                continue;
            }
            index
                .by_column
                .entry((rule.table_name.clone(), rule.column_name.clone()))
                .or_default()
                .push(index.rules.len());
            index.rules.push(rule);
        }
        Ok(index)
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn has_rule(&self, table: &str, column: &str) -> bool {
        self.by_column
            .contains_key(&(table.to_string(), column.to_string()))
    }

    pub fn rules_for<'a>(
        &'a self,
        table: &str,
        column: &str,
    ) -> impl Iterator<Item = &'a FilterRule> + 'a {
        self.by_column
            .get(&(table.to_string(), column.to_string()))
            .into_iter()
            .flatten()
            .map(move |&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
