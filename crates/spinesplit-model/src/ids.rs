//! Small newtypes used throughout the model to keep neuron/sub indices from
//! being mixed up with arbitrary `u32`s at call sites.

use std::fmt;

/// Index of a neuron within its owning component's flattened index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NeuronIndex(pub u32);

impl NeuronIndex {
    /// Build the sub-population index this neuron falls into under `cap`.
    pub fn sub_index(self, cap: u32) -> u32 {
        self.0 / cap
    }

    /// Build the local (within-sub-population) index of this neuron under `cap`.
    pub fn local_index(self, cap: u32) -> u32 {
        self.0 % cap
    }
}

impl fmt::Display for NeuronIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NeuronIndex {
    fn from(value: u32) -> Self {
        NeuronIndex(value)
    }
}

/// The 1-based position of a top-level `Population` within its network file,
/// and the cumulative sub-population count preceding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalPlacement {
    /// 1-based position among all top-level populations, in file order.
    pub global_index: u32,
    /// Cumulative sub-population count across preceding populations, plus one.
    pub global_sub_start_index: u32,
}
