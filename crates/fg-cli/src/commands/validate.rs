//! Validate command implementation

use crate::cli::{GlobalArgs, ReportFormat, ValidateArgs};
use crate::commands::common::{self, ExitCode, SqlInput};
use anyhow::{Context, Result};
use fg_analysis::{FilterValidator, ValidationResult};
use fg_core::ParseFailurePolicy;
use serde::Serialize;

/// Outcome of validating one input
#[derive(Debug, Serialize)]
struct InputReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl InputReport {
    fn passed(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.passed)
    }
}

/// Execute the validate command
pub(crate) fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = common::load_config(global)?;
    if args.strict {
        config.on_parse_error = ParseFailurePolicy::Strict;
    }
    if config.rules.is_empty() {
        log::warn!("No filter rules configured; every query passes");
    }

    let validator =
        FilterValidator::from_config(&config).context("Failed to build filter validator")?;
    let inputs = common::read_inputs(&args.input)?;
    let reports: Vec<InputReport> = inputs
        .iter()
        .map(|input| validate_input(&validator, input))
        .collect();

    match args.output {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        ReportFormat::Text => print_text(&reports),
    }

    if reports.iter().all(InputReport::passed) {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}

fn validate_input(validator: &FilterValidator, input: &SqlInput) -> InputReport {
    match validator.validate(&input.sql) {
        Ok(result) => InputReport {
            input: input.name.clone(),
            result: Some(result),
            error: None,
        },
        Err(err) => InputReport {
            input: input.name.clone(),
            result: None,
            error: Some(err.to_string()),
        },
    }
}

fn print_text(reports: &[InputReport]) {
    for report in reports {
        let status = if report.passed() { "PASS" } else { "FAIL" };
        println!("{}  {}", status, report.input);

        if let Some(err) = &report.error {
            println!("  error: {}", err);
        }
        let Some(result) = &report.result else {
            continue;
        };
        if let Some(parse_error) = &result.parse_error {
            println!("  not analyzed: {}", parse_error);
        }
        for violation in &result.violations {
            println!(
                "  {} ({}): missing filter {}",
                violation.rule.table_name, violation.table_found_at, violation.missing_filter
            );
            if !violation.found_filters.is_empty() {
                println!("    found: {}", violation.found_filters.join(", "));
            }
            println!("    fix: {}", violation.suggestion);
        }
    }

    let passed = reports.iter().filter(|r| r.passed()).count();
    println!();
    println!("{} passed, {} failed", passed, reports.len() - passed);
}
