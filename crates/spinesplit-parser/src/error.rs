//! Parser-level error taxonomy: wraps model errors, XML errors, and I/O
//! errors, all carrying the source line where they were detected.

use thiserror::Error;

/// Result type used throughout `spinesplit-parser`.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised while running the InfoPass or FullPass over a network or
/// experiment file.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A malformed-model condition detected during parsing.
    #[error("{0}")]
    Model(#[from] spinesplit_model::ModelError),

    /// Malformed XML syntax.
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be decoded as UTF-8.
    #[error("invalid UTF-8 in attribute: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Failure opening or reading a file (network, experiment, or binary
    /// connection file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required attribute was missing from an element.
    #[error("missing required attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// The element that was missing an attribute.
        element: String,
        /// The missing attribute's name.
        attribute: String,
    },

    /// An element name was not recognized in its expected position.
    #[error("unexpected element <{found}>, expected one of: {expected}")]
    UnexpectedElement {
        /// The element name actually encountered.
        found: String,
        /// A human-readable list of the elements that would have been valid.
        expected: String,
    },

    /// `<ComponenentInstance>` (sic) or any other model-group construct was
    /// encountered; groups are rejected outright.
    #[error("model groups are not supported (found <{element}>)")]
    GroupsUnsupported {
        /// The offending element name, preserved verbatim including the
        /// upstream schema's misspelling.
        element: String,
    },

    /// An unknown connectivity element name.
    #[error("unknown connectivity shape <{element}>")]
    UnknownConnectivity {
        /// The offending element name.
        element: String,
    },

    /// The binary connection file ended before `num_connections` records
    /// were read.
    #[error("binary connection file '{path}' ended after {read} of {expected} records")]
    TruncatedBinaryFile {
        /// Path to the binary file.
        path: String,
        /// Records successfully read before EOF.
        read: u32,
        /// Records the `<BinaryFile>` element declared.
        expected: u32,
    },

    /// Wraps any of the above with the source line at which it was detected.
    #[error("line {line}: {source}")]
    AtLine {
        /// 1-based source line number.
        line: u64,
        /// The underlying error.
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Attach a source line number, matching the driver's
    /// `Error (line <N>): <detail>` output convention.
    pub fn at_line(self, line: u64) -> Self {
        ParseError::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// The line number this error was raised at, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            ParseError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Build a [`ParseError::MissingAttribute`].
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        ParseError::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }
}
