//! `Projection`: a directed bundle of synapses between two populations.

use std::collections::BTreeMap;

use crate::synapse::Synapse;

/// A directed bundle of synapses from `pop` to (or from, depending on
/// [`crate::mode::SplitterMode`]) `proj_population`.
#[derive(Debug)]
pub struct Projection {
    /// Name of the peer population — destination under
    /// [`crate::mode::SplitterMode::ProjDefinedAtSrc`], source under
    /// [`crate::mode::SplitterMode::ProjDefinedAtDst`].
    pub proj_population: String,
    /// Position among the parent population's projections, in file order.
    pub index: u32,
    /// Synapses keyed by their weight-update's name, which is unique within
    /// the projection's naming scope.
    pub synapses: BTreeMap<String, Synapse>,
}

impl Projection {
    /// Construct an empty projection targeting `proj_population`.
    pub fn new(proj_population: impl Into<String>, index: u32) -> Self {
        Projection {
            proj_population: proj_population.into(),
            index,
            synapses: BTreeMap::new(),
        }
    }

    /// Insert a synapse, keyed by its weight-update's name.
    pub fn add_synapse(&mut self, synapse: Synapse) {
        self.synapses
            .insert(synapse.weight_update.name.clone(), synapse);
    }
}

impl Clone for Projection {
    fn clone(&self) -> Self {
        Projection {
            proj_population: self.proj_population.clone(),
            index: self.index,
            synapses: self
                .synapses
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
