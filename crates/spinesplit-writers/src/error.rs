//! Error taxonomy for the writer crate.

use thiserror::Error;

/// Result type used throughout `spinesplit-writers`.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Errors raised while emitting a split network.
#[derive(Error, Debug)]
pub enum WriteError {
    /// The DAMSON-alias writer only accepts `ProjDefinedAtDst` networks:
    /// DAMSON-alias mode on a src-defined network is a fatal error raised
    /// before `begin()` writes anything.
    #[error("DAMSON-alias writer requires a destination-defined network (ProjDefinedAtDst); this network is source-defined")]
    DamsonRequiresDstDefined,

    /// XML serialization failure.
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O failure writing to the output sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A name failed to sanitize into a non-empty valid target identifier.
    #[error("name '{name}' sanitizes to an empty identifier")]
    EmptySanitizedName {
        /// The offending original name.
        name: String,
    },
}
