//! `Population`: a named set of identical neurons, plus its outgoing
//! projections.

use std::collections::BTreeMap;

use crate::ids::GlobalPlacement;
use crate::neuron::Neuron;
use crate::projection::Projection;

/// A named population of neurons, owning its single `Neuron` and a mapping
/// from peer-population name to `Projection`.
#[derive(Debug)]
pub struct Population {
    /// Population name, globally unique within the network file.
    pub name: String,
    /// The neuron model and its properties/inputs.
    pub neuron: Neuron,
    /// Outgoing (or incoming, depending on `SplitterMode`) projections,
    /// keyed by peer population name.
    pub projections: BTreeMap<String, Projection>,
    /// This population's 1-based position and cumulative sub-count, assigned
    /// by the InfoPass.
    pub placement: Option<GlobalPlacement>,
}

impl Population {
    /// Construct a new, projection-free population wrapping `neuron`.
    pub fn new(name: impl Into<String>, neuron: Neuron) -> Self {
        Population {
            name: name.into(),
            neuron,
            projections: BTreeMap::new(),
            placement: None,
        }
    }

    /// Total neuron count, mirroring `self.neuron.size`.
    pub fn size(&self) -> u32 {
        self.neuron.size
    }

    /// Number of sub-populations this population splits into under `cap`:
    /// `ceil(size / cap)`.
    pub fn sub_count(&self, cap: u32) -> u32 {
        sub_count(self.size(), cap)
    }

    /// Size of the sub-population at `sub_idx` (0-based) under `cap`: `cap`
    /// for every sub but the last, whose size is `size mod cap` (or `cap` if
    /// that remainder is zero).
    pub fn sub_size(&self, sub_idx: u32, cap: u32) -> u32 {
        sub_population_size(self.size(), sub_idx, cap)
    }

    /// Insert a projection, keyed by its peer population name.
    pub fn add_projection(&mut self, projection: Projection) {
        self.projections
            .insert(projection.proj_population.clone(), projection);
    }
}

/// `ceil(size / cap)`, with `size == 0` treated as zero sub-populations.
pub fn sub_count(size: u32, cap: u32) -> u32 {
    if size == 0 {
        0
    } else {
        (size + cap - 1) / cap
    }
}

/// The size of the sub-population at `sub_idx` under `cap`: the last sub has
/// size `size mod CAP` unless that is zero, in which case it's `cap`.
pub fn sub_population_size(size: u32, sub_idx: u32, cap: u32) -> u32 {
    let n = sub_count(size, cap);
    debug_assert!(sub_idx < n, "sub_idx out of range for population size");
    if sub_idx + 1 == n {
        let remainder = size % cap;
        if remainder == 0 {
            cap
        } else {
            remainder
        }
    } else {
        cap
    }
}

/// Build the stable sub-entity name `"<parent>_sub<i>"` used for
/// sub-populations and sub-inputs.
pub fn sub_name(parent: &str, sub_idx: u32) -> String {
    format!("{parent}_sub{sub_idx}")
}

/// Build the stable sub-entity name `"<name>_sub<src_sub>_<dst_sub>"` used
/// for weight-update and post-synapse sub-components.
pub fn sub_pair_name(name: &str, src_sub: u32, dst_sub: u32) -> String {
    format!("{name}_sub{src_sub}_{dst_sub}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_count_covers_exact_and_ragged_sizes() {
        assert_eq!(sub_count(10, 4), 3);
        assert_eq!(sub_count(8, 4), 2);
        assert_eq!(sub_count(1, 4), 1);
        assert_eq!(sub_count(0, 4), 0);
    }

    #[test]
    fn sub_population_size_matches_spec_examples() {
        // CAP=4, size=10 -> sizes 4, 4, 2
        assert_eq!(sub_population_size(10, 0, 4), 4);
        assert_eq!(sub_population_size(10, 1, 4), 4);
        assert_eq!(sub_population_size(10, 2, 4), 2);

        // CAP=4, size=8 -> sizes 4, 4 (remainder zero keeps the cap)
        assert_eq!(sub_population_size(8, 0, 4), 4);
        assert_eq!(sub_population_size(8, 1, 4), 4);
    }

    #[test]
    fn sub_name_schemes() {
        assert_eq!(sub_name("P", 2), "P_sub2");
        assert_eq!(sub_pair_name("wu", 1, 3), "wu_sub1_3");
    }
}
