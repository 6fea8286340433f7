//! Error taxonomy for the data model crate.

use thiserror::Error;

/// Result type used throughout `spinesplit-model`.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building or validating in-memory model entities.
///
/// Parse-time callers wrap these with a source line via [`ModelError::at_line`]
/// so the driver can print `Error (line <N>): <detail>`.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A component name collided with one already registered.
    #[error("duplicate component name '{name}'")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A one-to-one connectivity or remapping saw mismatched population sizes.
    #[error("one-to-one size mismatch: {src_name} has size {src_size}, {dst_name} has size {dst_size}")]
    OneToOneSizeMismatch {
        /// Source-side component name.
        src_name: String,
        /// Source-side size.
        src_size: u32,
        /// Destination-side component name.
        dst_name: String,
        /// Destination-side size.
        dst_size: u32,
    },

    /// A connection instance referenced an out-of-range neuron index.
    #[error("connection index out of bounds: {axis} index {index} exceeds max {max} on '{component}'")]
    IndexOutOfBounds {
        /// Which axis ("src" or "dst") was out of bounds.
        axis: &'static str,
        /// The offending index.
        index: u32,
        /// The maximum permitted index.
        max: u32,
        /// The component the bound belongs to.
        component: String,
    },

    /// Two connection instances claimed the same (src, dst) pair.
    #[error("duplicate connection ({src}, {dst}) in '{component}'")]
    DuplicateConnection {
        /// Source neuron index.
        src: u32,
        /// Destination neuron index.
        dst: u32,
        /// The connection list owner.
        component: String,
    },

    /// A weight-update component declared one or more inputs, which is forbidden.
    #[error("weight-update component '{name}' may not declare inputs")]
    WeightUpdateHasInputs {
        /// The offending weight-update name.
        name: String,
    },

    /// A one-to-one remapping targeted a weight-update or post-synapse input.
    #[error("one-to-one remapping is not supported for inputs on '{name}' (weight-update/post-synapse)")]
    OneToOneInputUnsupported {
        /// The component the forbidden input was attached to.
        name: String,
    },

    /// A list-connectivity input targeted a weight-update destination.
    #[error("list-connectivity input into weight-update component '{name}' is not supported")]
    ListInputIntoWeightUpdate {
        /// The weight-update component name.
        name: String,
    },

    /// Generic malformed-model condition not covered by a more specific variant.
    #[error("{reason}")]
    Invalid {
        /// Human-readable explanation.
        reason: String,
    },

    /// Wraps any of the above with the source line at which it was detected.
    #[error("line {line}: {source}")]
    AtLine {
        /// 1-based source line number.
        line: u64,
        /// The underlying error.
        #[source]
        source: Box<ModelError>,
    },
}

impl ModelError {
    /// Attach a source line number to an error, matching the driver's
    /// `Error (line <N>): <detail>` output convention.
    pub fn at_line(self, line: u64) -> Self {
        ModelError::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// Build a generic [`ModelError::Invalid`] from any displayable reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        ModelError::Invalid {
            reason: reason.into(),
        }
    }

    /// The line number this error was raised at, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            ModelError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
