//! `Synapse`, and its owned `WeightUpdate` / `PostSynapse` components.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::connection::AbstractionConnection;
use crate::input::Input;
use crate::property::Property;

/// A per-connection component (weight-update or post-synapse) carrying ports
/// and properties. The two are structurally identical except that
/// `PostSynapse` additionally carries output ports and may own inputs;
/// `WeightUpdate` never does: weight-update components may not have inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightUpdate {
    /// Component name — unique within its owning `Synapse`'s naming scope.
    pub name: String,
    /// URL of the component class definition.
    pub definition_url: String,
    /// Input port accepting spikes from the projection's source population.
    pub input_src_port: String,
    /// Input port on the weight-update itself.
    pub input_dst_port: String,
    /// Declared properties (weights, time constants, etc.).
    pub properties: Vec<Property>,
}

impl WeightUpdate {
    /// Construct a new weight-update component with no properties.
    pub fn new(
        name: impl Into<String>,
        definition_url: impl Into<String>,
        input_src_port: impl Into<String>,
        input_dst_port: impl Into<String>,
    ) -> Self {
        WeightUpdate {
            name: name.into(),
            definition_url: definition_url.into(),
            input_src_port: input_src_port.into(),
            input_dst_port: input_dst_port.into(),
            properties: Vec::new(),
        }
    }
}

/// The destination-side per-connection component. Carries both input and
/// output ports, plus its own `inputs` map (unlike `WeightUpdate`).
#[derive(Debug, Clone, PartialEq)]
pub struct PostSynapse {
    /// Component name.
    pub name: String,
    /// URL of the component class definition.
    pub definition_url: String,
    /// Input port accepting current/conductance from the weight-update.
    pub input_src_port: String,
    /// Input port on the post-synapse itself.
    pub input_dst_port: String,
    /// Output port delivering current/conductance to the neuron.
    pub output_src_port: String,
    /// Input port on the destination neuron.
    pub output_dst_port: String,
    /// Declared properties.
    pub properties: Vec<Property>,
    /// Inputs keyed by `srcKey = "<src>_<src_port>_<dst_port>"`.
    pub inputs: BTreeMap<String, Input>,
}

impl PostSynapse {
    /// Construct a new post-synapse component with no properties or inputs.
    pub fn new(
        name: impl Into<String>,
        definition_url: impl Into<String>,
        input_src_port: impl Into<String>,
        input_dst_port: impl Into<String>,
        output_src_port: impl Into<String>,
        output_dst_port: impl Into<String>,
    ) -> Self {
        PostSynapse {
            name: name.into(),
            definition_url: definition_url.into(),
            input_src_port: input_src_port.into(),
            input_dst_port: input_dst_port.into(),
            output_src_port: output_src_port.into(),
            output_dst_port: output_dst_port.into(),
            properties: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }
}

/// A triple of connectivity, weight-update, and post-synapse, owned by a
/// `Projection`.
#[derive(Debug)]
pub struct Synapse {
    /// The connectivity specification shared by this synapse's weight-update
    /// and post-synapse.
    pub connection: AbstractionConnection,
    /// The per-connection weight-update component.
    pub weight_update: WeightUpdate,
    /// The per-target post-synapse component.
    pub post_synapse: PostSynapse,
    /// Maximum sub-synapse count derived from this (unsplit) synapse across
    /// all sub-populations of its parent; updated via atomic max-or-add
    /// during splitting. Required by the DAMSON writer to size arrays
    /// uniformly across split shards.
    sub_syn_max: AtomicU32,
}

impl Synapse {
    /// Construct a fresh, unsplit synapse.
    pub fn new(
        connection: AbstractionConnection,
        weight_update: WeightUpdate,
        post_synapse: PostSynapse,
    ) -> Self {
        Synapse {
            connection,
            weight_update,
            post_synapse,
            sub_syn_max: AtomicU32::new(0),
        }
    }

    /// Current value of `sub_syn_max`.
    pub fn sub_syn_max(&self) -> u32 {
        self.sub_syn_max.load(Ordering::Acquire)
    }

    /// Atomically set `sub_syn_max` to exactly `value` (used when the count is
    /// known up front, e.g. `AllToAll`/`OneToOne`/`FixedProbability`, where
    /// every sub-population derives the same target sub-count).
    pub fn set_sub_syn_max(&self, value: u32) {
        self.sub_syn_max.store(value, Ordering::Release);
    }

    /// Atomically raise `sub_syn_max` to `at_least` if it is currently lower
    /// (used for `ConnectionList`, where each sub-population may produce a
    /// different sub-synapse count).
    pub fn record_sub_syn_count(&self, at_least: u32) {
        let mut current = self.sub_syn_max.load(Ordering::Acquire);
        while current < at_least {
            match self.sub_syn_max.compare_exchange_weak(
                current,
                at_least,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Clone for Synapse {
    fn clone(&self) -> Self {
        Synapse {
            connection: self.connection.clone(),
            weight_update: self.weight_update.clone(),
            post_synapse: self.post_synapse.clone(),
            sub_syn_max: AtomicU32::new(self.sub_syn_max()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_syn_max_set_is_exact() {
        let syn = Synapse::new(
            AbstractionConnection::AllToAll { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        );
        syn.set_sub_syn_max(4);
        assert_eq!(syn.sub_syn_max(), 4);
        syn.set_sub_syn_max(2);
        assert_eq!(syn.sub_syn_max(), 2);
    }

    #[test]
    fn record_sub_syn_count_only_raises() {
        let syn = Synapse::new(
            AbstractionConnection::ConnectionList {
                connections: Vec::new(),
                by_first_key: crate::connection::ConnectionMatrix::build(
                    &[],
                    crate::connection::Orientation::SrcOuter,
                ),
                delay: None,
            },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        );
        syn.record_sub_syn_count(2);
        syn.record_sub_syn_count(1);
        assert_eq!(syn.sub_syn_max(), 2);
        syn.record_sub_syn_count(5);
        assert_eq!(syn.sub_syn_max(), 5);
    }
}
