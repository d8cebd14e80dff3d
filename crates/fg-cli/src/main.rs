//! filterguard CLI - static checks for mandatory SQL filter policies

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::{columns, common, inspect, rules, validate};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Validate(args) => validate::execute(args, &cli.global),
        cli::Commands::Inspect(args) => inspect::execute(args, &cli.global),
        cli::Commands::Columns(args) => columns::execute(args, &cli.global),
        cli::Commands::Rules(args) => rules::execute(args, &cli.global),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<common::ExitCode>() {
            Some(code) => std::process::ExitCode::from(u8::try_from(code.0).unwrap_or(1)),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::from(2)
            }
        },
    }
}

/// Route `log` records from the library crates to stderr.
///
/// `--verbose` forces debug output; otherwise `RUST_LOG` applies, with
/// warnings shown by default.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
