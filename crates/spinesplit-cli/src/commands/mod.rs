//! CLI surface: the subcommand-free `spinesplit <experiment.xml>
//! <output-path> [flags]` invocation, plus two ambient commands
//! (`config`, and a hidden `completions`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

pub mod completions;
pub mod config;
pub mod split;

/// spinesplit — partitions a SpineML Low-Level network into bounded-size
/// sub-populations for a distributed target.
#[derive(Parser, Debug)]
#[command(
    name = "spinesplit",
    version,
    about = "Partition a SpineML Low-Level network into CAP-bounded sub-populations",
    long_about = "Reads a SpineML experiment file, resolves its referenced network file, \
                  partitions every population into bounded-size sub-populations, and \
                  writes the result as XML, a DAMSON-alias tabular form, or a DOT graph."
)]
pub struct Cli {
    /// Experiment XML file to process. Required unless a subcommand is given.
    pub experiment: Option<PathBuf>,

    /// Output path for the split network. Required unless a subcommand is given.
    pub output: Option<PathBuf>,

    /// Force the serial code path regardless of the `parallel` build feature.
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,

    /// Disable pretty-indentation in the generic XML writer.
    #[arg(long = "no-xml-formatting")]
    pub no_xml_formatting: bool,

    /// Suppress progress reporting and warnings; only fatal errors are printed.
    #[arg(short = 's', long = "silent")]
    pub silent: bool,

    /// Select the DAMSON-alias tabular writer (requires a destination-defined network).
    #[arg(long = "alias", conflicts_with = "graph")]
    pub alias: bool,

    /// Select the DOT graph writer.
    #[arg(long = "graph", conflicts_with = "alias")]
    pub graph: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the build-time sub-population cap (default: 100, or the
    /// configured `default_cap`).
    #[arg(long)]
    pub cap: Option<u32>,

    /// Path to a config file, overriding the platform default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Ambient commands alongside the core split-and-write pipeline.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View or edit the persisted default configuration.
    Config(config::ConfigCommand),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completions(completions::CompletionsCommand),
}

impl Cli {
    /// Dispatch to whichever command was requested: an ambient subcommand if
    /// present, otherwise the core split-and-write pipeline.
    pub fn execute(mut self) -> CliResult<()> {
        let command = self.command.take();
        match command {
            Some(Commands::Config(cmd)) => cmd.execute(self.config.clone()),
            Some(Commands::Completions(cmd)) => cmd.execute(),
            None => split::execute(self),
        }
    }
}
