//! spinesplit — partitions a SpineML Low-Level network into bounded-size
//! sub-populations for a distributed target.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;

use commands::Cli;
use error::CliResult;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let default_filter = if cli.silent {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = cli.execute() {
        match err.line() {
            Some(line) => error!("Error (line {line}): {err}"),
            None => error!("Error: {err}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
