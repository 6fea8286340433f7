//! Error taxonomy for the splitter crate.

use thiserror::Error;

/// Result type used throughout `spinesplit-split`.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors raised while partitioning a [`spinesplit_model::Population`].
#[derive(Error, Debug)]
pub enum SplitError {
    /// A model invariant was violated while splitting (e.g. one-to-one size
    /// mismatch discovered between a projection's endpoints).
    #[error(transparent)]
    Model(#[from] spinesplit_model::ModelError),

    /// A projection or input referenced a population the splitter was not
    /// given a size for. This indicates the caller built the
    /// [`crate::SplitContext`] from an incomplete population list.
    #[error("projection references population '{name}', whose size is unknown to the splitter")]
    UnknownPeerPopulation {
        /// The unresolved peer population name.
        name: String,
    },
}
