//! Error handling for the spinesplit CLI.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors. Parse/split/write errors from the lower crates are
/// wrapped verbatim so their `Display` impl (including, for parse errors,
/// the offending source line) survives to the top-level error message.
#[derive(Error, Debug)]
pub enum CliError {
    /// Model-layer error (surfaced directly when the driver builds a
    /// [`spinesplit_split::SplitContext`] before any parsing happens).
    #[error("{0}")]
    Model(#[from] spinesplit_model::ModelError),

    /// XML parsing error (InfoPass, FullPass, or experiment pass).
    #[error("{0}")]
    Parse(#[from] spinesplit_parser::ParseError),

    /// Splitter error.
    #[error("{0}")]
    Split(#[from] spinesplit_split::SplitError),

    /// Writer error.
    #[error("{0}")]
    Write(#[from] spinesplit_writers::WriteError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config-file (de)serialization error.
    #[error("invalid config file: {0}")]
    ConfigSerde(#[from] toml::de::Error),

    /// Generic error, used at the CLI boundary to attach context to an
    /// otherwise-opaque failure (matches `shnn-cli`'s `anyhow`-wrapping
    /// `Generic` variant).
    #[error("{0}")]
    Generic(#[from] anyhow::Error),

    /// Invalid command-line arguments (e.g. neither `-alias` nor `-graph`
    /// resolve to a usable writer, or both were given).
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// A required file or resource was missing.
    #[error("missing resource: {0}")]
    MissingResource(String),
}

impl CliError {
    /// Build a [`CliError::Config`] from any displayable reason.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CliError::InvalidArgs`] from any displayable reason.
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Build a [`CliError::MissingResource`] from any displayable reason.
    pub fn missing_resource(msg: impl Into<String>) -> Self {
        Self::MissingResource(msg.into())
    }

    /// The source line number carried by a wrapped parse-time
    /// [`spinesplit_model::ModelError::AtLine`], if any — used by `main` to
    /// format `Error (line <N>): <detail>`.
    pub fn line(&self) -> Option<u64> {
        match self {
            CliError::Model(e) => e.line(),
            CliError::Parse(e) => e.line(),
            _ => None,
        }
    }
}
