//! `FilterValidator`: parse, analyze, resolve and evaluate in one call.

use crate::analysis::QueryAnalysis;
use crate::engine::evaluate;
use crate::error::{AnalysisError, AnalysisResult};
use crate::index::RuleIndex;
use crate::resolve::resolve_filters;
use crate::types::ValidationResult;
use fg_core::config::{CteResolution, Dialect, ParseFailurePolicy, ValidatorConfig};
use fg_core::rules::FilterRule;
use fg_sql::{SqlParser, SqlTree};
use log::warn;

/// Checks queries against a fixed set of mandatory filter rules.
///
/// The rules and their index are read-only after construction, and every
/// call to [`validate`](Self::validate) builds its own tree and visit set,
/// so one validator can be shared across threads.
pub struct FilterValidator {
    index: RuleIndex,
    parser: SqlParser,
    on_parse_error: ParseFailurePolicy,
    cte_resolution: CteResolution,
}

impl FilterValidator {
    /// Validate and index `rules`. Parse failures pass by default.
    pub fn new(rules: Vec<FilterRule>, dialect: Dialect) -> AnalysisResult<Self> {
        Ok(Self {
            index: RuleIndex::new(&rules)?,
            parser: SqlParser::new(dialect),
            on_parse_error: ParseFailurePolicy::default(),
            cte_resolution: CteResolution::default(),
        })
    }

    pub fn from_config(config: &ValidatorConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self::new(config.rules.clone(), config.dialect)?
            .with_parse_failure_policy(config.on_parse_error)
            .with_cte_resolution(config.cte_resolution)
            .with_max_depth(config.max_depth))
    }

    pub fn with_parse_failure_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    pub fn with_cte_resolution(mut self, mode: CteResolution) -> Self {
        self.cte_resolution = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.parser = self.parser.with_max_depth(max_depth);
        self
    }

    /// Normalized rules in configuration order.
    pub fn rules(&self) -> &[FilterRule] {
        self.index.rules()
    }

    pub fn cte_resolution(&self) -> CteResolution {
        self.cte_resolution
    }

    /// Parse and lower `sql` without applying the failure policy.
    pub fn parse(&self, sql: &str) -> AnalysisResult<SqlTree> {
        Ok(self.parser.parse_tree(sql)?)
    }

    /// Validate one query.
    ///
    /// SQL that cannot be parsed or lowered passes with no violations and
    /// the diagnostic in `parse_error`, unless the validator is strict, in
    /// which case [`AnalysisError::ParseFailed`] is returned.
    pub fn validate(&self, sql: &str) -> AnalysisResult<ValidationResult> {
        let tree = match self.parser.parse_tree(sql) {
            Ok(tree) => tree,
            Err(err) => {
                return match self.on_parse_error {
                    ParseFailurePolicy::FailOpen => {
                        warn!("Query not analyzed, passing it unchecked: {}", err);
                        Ok(ValidationResult::unparsed(err.to_string()))
                    }
                    ParseFailurePolicy::Strict => Err(AnalysisError::ParseFailed(err)),
                };
            }
        };
        Ok(self.validate_tree(&tree))
    }

    /// Validate an already lowered query.
    pub fn validate_tree(&self, tree: &SqlTree) -> ValidationResult {
        let analysis = QueryAnalysis::analyze(tree, self.cte_resolution);
        let groups = resolve_filters(tree, &analysis, &self.index);
        evaluate(&self.index, &analysis, &groups)
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
