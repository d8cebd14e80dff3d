//! Columns command implementation

use crate::cli::{ColumnsArgs, GlobalArgs, ReportFormat};
use crate::commands::common::{self, ExitCode};
use anyhow::{Context, Result};
use fg_analysis::{ColumnChecker, ColumnReport};
use serde::Serialize;

#[derive(Serialize)]
struct InputColumns<'a> {
    input: &'a str,
    #[serde(flatten)]
    report: ColumnReport,
}

/// Execute the columns command
pub(crate) fn execute(args: &ColumnsArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    if config.schemas.is_empty() {
        log::warn!("No schemas configured; nothing to check columns against");
    }

    let checker = ColumnChecker::from_config(&config).context("Failed to build column checker")?;
    let inputs = common::read_inputs(&args.input)?;

    let mut reports = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let report = checker
            .check(&input.sql)
            .with_context(|| format!("Failed to check columns in {}", input.name))?;
        reports.push(InputColumns {
            input: &input.name,
            report,
        });
    }

    match args.output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        ReportFormat::Text => {
            for entry in &reports {
                if entry.report.is_clean() {
                    println!("OK    {}", entry.input);
                    continue;
                }
                println!("FAIL  {}", entry.input);
                for (table, columns) in &entry.report.unknown_columns {
                    println!("  {}: unknown column(s) {}", table, columns.join(", "));
                }
            }
        }
    }

    if reports.iter().all(|entry| entry.report.is_clean()) {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}
