//! Inspect command implementation

use crate::cli::{GlobalArgs, InspectArgs, ReportFormat};
use crate::commands::common;
use anyhow::{Context, Result};
use fg_analysis::QueryAnalysis;
use fg_sql::SqlParser;
use serde::Serialize;

#[derive(Serialize)]
struct InspectReport<'a> {
    input: &'a str,
    analysis: QueryAnalysis,
}

/// Execute the inspect command
pub(crate) fn execute(args: &InspectArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config_or_default(global)?;
    let parser = SqlParser::new(config.dialect).with_max_depth(config.max_depth);
    let inputs = common::read_inputs(&args.input)?;

    let mut reports = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let tree = parser
            .parse_tree(&input.sql)
            .with_context(|| format!("Failed to parse {}", input.name))?;
        reports.push(InspectReport {
            input: &input.name,
            analysis: QueryAnalysis::analyze(&tree, config.cte_resolution),
        });
    }

    match args.output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        ReportFormat::Text => {
            for (i, report) in reports.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("== {}", report.input);
                print_analysis(&report.analysis);
            }
        }
    }
    Ok(())
}

fn print_analysis(analysis: &QueryAnalysis) {
    println!();
    println!("Tables");
    let rows: Vec<Vec<String>> = analysis
        .tables
        .iter()
        .map(|r| {
            vec![
                r.table_name.clone(),
                r.alias.clone().unwrap_or_else(|| "-".to_string()),
                if r.is_cte { "cte" } else { "table" }.to_string(),
                r.scope_level.to_string(),
            ]
        })
        .collect();
    common::print_table(&["NAME", "ALIAS", "KIND", "LEVEL"], &rows);

    if !analysis.ctes.is_empty() {
        println!();
        println!("CTEs");
        let rows: Vec<Vec<String>> = analysis
            .ctes
            .iter()
            .map(|cte| {
                vec![
                    cte.name.clone(),
                    analysis.aliases.get(&cte.name).unwrap_or("-").to_string(),
                ]
            })
            .collect();
        common::print_table(&["NAME", "READS"], &rows);
    }

    println!();
    println!("Aliases");
    let rows: Vec<Vec<String>> = analysis
        .aliases
        .iter()
        .map(|(name, table)| vec![name.to_string(), table.to_string()])
        .collect();
    common::print_table(&["NAME", "TABLE"], &rows);

    println!();
    println!("Conditions");
    if analysis.conditions.is_empty() {
        println!("(none)");
        return;
    }
    let rows: Vec<Vec<String>> = analysis
        .conditions
        .iter()
        .map(|c| {
            vec![
                c.location.to_string(),
                c.scope_level.to_string(),
                c.column_display(),
                c.operator.to_string(),
                c.value.to_string(),
            ]
        })
        .collect();
    common::print_table(&["CLAUSE", "LEVEL", "COLUMN", "OPERATOR", "VALUE"], &rows);
}
