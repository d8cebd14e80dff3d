//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// filterguard - verify that SQL queries apply mandatory filters
#[derive(Parser, Debug)]
#[command(name = "fg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: filterguard.yml in the current directory)
    #[arg(short, long, global = true, env = "FILTERGUARD_CONFIG")]
    pub config: Option<String>,

    /// Override the SQL dialect from the config file
    #[arg(short, long, global = true)]
    pub dialect: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check queries against the configured filter rules
    Validate(ValidateArgs),

    /// Show the tables, CTEs, aliases and filter conditions of a query
    Inspect(InspectArgs),

    /// Check column references against the configured table schemas
    Columns(ColumnsArgs),

    /// List the configured filter rules
    Rules(RulesArgs),
}

/// Query sources shared by the commands that read SQL
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// SQL files to read (stdin when neither files nor --sql are given)
    pub files: Vec<String>,

    /// Inline SQL text
    #[arg(long)]
    pub sql: Option<String>,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Treat unparseable SQL as an error instead of passing it
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ReportFormat,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ReportFormat,
}

/// Arguments for the columns command
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ReportFormat,
}

/// Arguments for the rules command
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ReportFormat,
}

/// Report output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
