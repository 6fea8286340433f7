//! Layered configuration for the spinesplit CLI.
//!
//! Ambient CLI ergonomics grounded on `shnn-cli::config::CliConfig`,
//! loaded the same way: a TOML file under
//! the platform config directory, with every field overridable by the
//! corresponding CLI flag for a single invocation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Which writer a bare invocation falls back to when neither `-alias` nor
/// `-graph` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultWriter {
    /// Generic XML round-trip.
    Xml,
    /// DAMSON-alias tabular emitter.
    Alias,
    /// DOT graph.
    Graph,
}

impl Default for DefaultWriter {
    fn default() -> Self {
        DefaultWriter::Xml
    }
}

/// Persisted CLI configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinesplitConfig {
    /// Default build-time sub-population cap, used when `-cap` is absent.
    pub default_cap: Option<u32>,
    /// Default writer, used when neither `-alias` nor `-graph` is given.
    pub default_writer: DefaultWriter,
    /// Default parallelism; `false` behaves as if `-no_parallel` were given.
    pub default_parallel: bool,
    /// Default log level (`RUST_LOG`-style filter string).
    pub log_level: String,
}

impl Default for SpinesplitConfig {
    fn default() -> Self {
        SpinesplitConfig {
            default_cap: None,
            default_writer: DefaultWriter::default(),
            default_parallel: true,
            log_level: "info".to_string(),
        }
    }
}

impl SpinesplitConfig {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize and write configuration to `path`, creating parent
    /// directories as needed.
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("failed to serialize config: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The default config file path: `<config_dir>/spinesplit/config.toml`.
    pub fn default_config_path() -> CliResult<std::path::PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("could not determine platform config directory"))?;
        Ok(config_dir.join("spinesplit").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = SpinesplitConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.default_cap, None);
        assert_eq!(cfg.default_writer, DefaultWriter::Xml);
        assert!(cfg.default_parallel);
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = SpinesplitConfig::default();
        cfg.default_cap = Some(64);
        cfg.default_writer = DefaultWriter::Alias;
        cfg.default_parallel = false;
        cfg.save_to_file(&path).unwrap();

        let loaded = SpinesplitConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.default_cap, Some(64));
        assert_eq!(loaded.default_writer, DefaultWriter::Alias);
        assert!(!loaded.default_parallel);
    }
}
