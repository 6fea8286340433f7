//! `spinesplit config`: view or edit the persisted default configuration.
//!
//! Grounded on `shnn-cli`'s `init`/`inspect` commands, which read and print a
//! workspace's persisted state in the same show/set shape.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::{DefaultWriter, SpinesplitConfig};
use crate::error::CliResult;

/// View or edit the persisted default configuration.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub sub: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the resolved configuration as TOML.
    Show,
    /// Set the default sub-population cap.
    SetCap {
        /// New default `CAP` value.
        value: u32,
    },
    /// Set the default writer (`xml`, `alias`, or `graph`).
    SetWriter {
        /// New default writer.
        #[arg(value_enum)]
        value: DefaultWriterArg,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum DefaultWriterArg {
    Xml,
    Alias,
    Graph,
}

impl From<DefaultWriterArg> for DefaultWriter {
    fn from(value: DefaultWriterArg) -> Self {
        match value {
            DefaultWriterArg::Xml => DefaultWriter::Xml,
            DefaultWriterArg::Alias => DefaultWriter::Alias,
            DefaultWriterArg::Graph => DefaultWriter::Graph,
        }
    }
}

impl ConfigCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> CliResult<()> {
        let path = match config_path {
            Some(p) => p,
            None => SpinesplitConfig::default_config_path()?,
        };
        let mut config = SpinesplitConfig::load_from_file(&path)?;

        match self.sub {
            ConfigSubcommand::Show => {
                println!("{}", toml::to_string_pretty(&config).map_err(|e| {
                    crate::error::CliError::config(format!("failed to render config: {e}"))
                })?);
            }
            ConfigSubcommand::SetCap { value } => {
                config.default_cap = Some(value);
                config.save_to_file(&path)?;
                println!("default_cap set to {value} in {}", path.display());
            }
            ConfigSubcommand::SetWriter { value } => {
                config.default_writer = value.into();
                config.save_to_file(&path)?;
                println!("default_writer set in {}", path.display());
            }
        }
        Ok(())
    }
}
