//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use fg_core::{CoreError, Dialect, ValidatorConfig};
use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::cli::{GlobalArgs, InputArgs};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run and `main` decides how to exit.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing to show the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// One query to check, with the name it is reported under.
#[derive(Debug)]
pub(crate) struct SqlInput {
    pub(crate) name: String,
    pub(crate) sql: String,
}

/// Load the config named by `--config`, or `filterguard.yml` from the
/// current directory, then apply the `--dialect` override.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<ValidatorConfig> {
    let config = match &global.config {
        Some(path) => ValidatorConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => ValidatorConfig::load_from_dir(Path::new("."))
            .context("Failed to load filterguard.yml from the current directory")?,
    };
    apply_overrides(config, global)
}

/// Like [`load_config`], but a missing default config yields the defaults.
///
/// An explicit `--config` path must still exist.
pub(crate) fn load_config_or_default(global: &GlobalArgs) -> Result<ValidatorConfig> {
    if global.config.is_some() {
        return load_config(global);
    }
    match ValidatorConfig::load_from_dir(Path::new(".")) {
        Ok(config) => apply_overrides(config, global),
        Err(CoreError::ConfigNotFound { path }) => {
            log::debug!("No config at {}, using defaults", path);
            apply_overrides(ValidatorConfig::default(), global)
        }
        Err(err) => Err(anyhow::Error::new(err)
            .context("Failed to load filterguard.yml from the current directory")),
    }
}

fn apply_overrides(mut config: ValidatorConfig, global: &GlobalArgs) -> Result<ValidatorConfig> {
    if let Some(name) = &global.dialect {
        config.dialect = name.parse::<Dialect>()?;
    }
    Ok(config)
}

/// Collect the queries named on the command line.
///
/// Files come first, then `--sql`. With neither, stdin is read as a single
/// query.
pub(crate) fn read_inputs(args: &InputArgs) -> Result<Vec<SqlInput>> {
    let mut inputs = Vec::with_capacity(args.files.len() + 1);
    for file in &args.files {
        let sql = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read SQL file: {}", file))?;
        inputs.push(SqlInput {
            name: file.clone(),
            sql,
        });
    }

    if let Some(sql) = &args.sql {
        inputs.push(SqlInput {
            name: "<sql>".to_string(),
            sql: sql.clone(),
        });
    }

    if inputs.is_empty() {
        let mut sql = String::new();
        std::io::stdin()
            .read_to_string(&mut sql)
            .context("Failed to read SQL from stdin")?;
        inputs.push(SqlInput {
            name: "<stdin>".to_string(),
            sql,
        });
    }

    Ok(inputs)
}

/// Compute column widths for table output.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a left-aligned table to stdout, columns separated by two spaces.
///
/// ```ignore
/// print_table(&["TABLE", "COLUMN"], &[vec!["users".into(), "deleted".into()]]);
/// // TABLE  COLUMN
/// // -----  -------
/// // users  deleted
/// ```
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    let render = |cells: Vec<String>| cells.join("  ").trim_end().to_string();

    println!(
        "{}",
        render(
            headers
                .iter()
                .zip(&widths)
                .map(|(h, &w)| format!("{:<width$}", h, width = w))
                .collect()
        )
    );
    println!(
        "{}",
        render(widths.iter().map(|&w| "-".repeat(w)).collect())
    );
    for row in rows {
        println!(
            "{}",
            render(
                row.iter()
                    .zip(&widths)
                    .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
                    .collect()
            )
        );
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
