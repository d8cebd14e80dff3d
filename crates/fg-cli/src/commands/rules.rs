//! Rules command implementation

use crate::cli::{GlobalArgs, ReportFormat, RulesArgs};
use crate::commands::common;
use anyhow::{Context, Result};
use fg_analysis::FilterValidator;

/// Execute the rules command
pub(crate) fn execute(args: &RulesArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let validator =
        FilterValidator::from_config(&config).context("Failed to build filter validator")?;
    let rules = validator.rules();

    match args.output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(rules)?),
        ReportFormat::Text => {
            if rules.is_empty() {
                println!("No filter rules configured.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = rules
                .iter()
                .map(|rule| {
                    vec![
                        rule.table_name.clone(),
                        rule.column_name.clone(),
                        rule.operator.to_string(),
                        rule.required_value.to_string(),
                    ]
                })
                .collect();
            common::print_table(&["TABLE", "COLUMN", "OPERATOR", "VALUE"], &rows);
            println!();
            println!("{} rule(s), dialect {}", rules.len(), config.dialect);
        }
    }
    Ok(())
}
