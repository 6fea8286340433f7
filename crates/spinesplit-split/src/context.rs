//! `SplitContext`: the read-only sizing information the splitter needs about
//! every population a `Population` might project to or draw an input from.

use std::collections::BTreeMap;

use spinesplit_model::{sub_count, SplitterMode};

use crate::error::{Result, SplitError};

/// Sizes of every top-level population in the network, keyed by name, plus
/// the resolved projection-direction mode for the file being split.
///
/// A cross-population `<Input src=…>` always names another population's
/// output port (weight-update components may never own inputs, and a
/// post-synapse's peer is itself looked up the same way), so a single
/// population-name→size table is sufficient for both projection-peer and
/// input-source lookups.
pub struct SplitContext<'a> {
    /// Build-time bound on a sub-population's size.
    pub cap: u32,
    /// Whether this network file declares projections at the source or
    /// destination population.
    pub mode: SplitterMode,
    /// Whether [`crate::split`] may build a population's sub-populations
    /// concurrently. Checked at runtime even when the `parallel` feature is
    /// compiled in, so a caller's `--no-parallel` flag forces the serial
    /// path regardless of the build; has no effect when the feature is
    /// absent, since the serial path is the only one compiled.
    pub parallel: bool,
    sizes: &'a BTreeMap<String, u32>,
}

impl<'a> SplitContext<'a> {
    /// Construct a context over a precomputed `name -> size` table, with
    /// parallel sub-population construction enabled.
    pub fn new(cap: u32, mode: SplitterMode, sizes: &'a BTreeMap<String, u32>) -> Self {
        SplitContext { cap, mode, parallel: true, sizes }
    }

    /// Construct a context with an explicit runtime parallelism toggle.
    pub fn new_with_parallel(
        cap: u32,
        mode: SplitterMode,
        sizes: &'a BTreeMap<String, u32>,
        parallel: bool,
    ) -> Self {
        SplitContext { cap, mode, parallel, sizes }
    }

    /// The resolved size of the named population, or an error if the caller
    /// built this context from an incomplete population list.
    pub fn size_of(&self, name: &str) -> Result<u32> {
        self.sizes
            .get(name)
            .copied()
            .ok_or_else(|| SplitError::UnknownPeerPopulation {
                name: name.to_string(),
            })
    }

    /// `ceil(size_of(name) / cap)`.
    pub fn sub_count_of(&self, name: &str) -> Result<u32> {
        Ok(sub_count(self.size_of(name)?, self.cap))
    }
}
