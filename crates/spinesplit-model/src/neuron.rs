//! `Neuron`: the single neuron-model instance owned by a `Population`.

use std::collections::BTreeMap;

use crate::input::Input;
use crate::property::Property;

/// The neuron model owned by a `Population`. SpineML Low-Level networks have
/// exactly one neuron declaration per population.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    /// Component name, usually the same as the owning population's name.
    pub name: String,
    /// URL of the neuron-model class definition.
    pub definition_url: String,
    /// Neuron count.
    pub size: u32,
    /// Declared properties.
    pub properties: Vec<Property>,
    /// Inputs keyed by `srcKey = "<src>_<src_port>_<dst_port>"`.
    pub inputs: BTreeMap<String, Input>,
}

impl Neuron {
    /// Construct a new neuron with no properties or inputs.
    pub fn new(name: impl Into<String>, definition_url: impl Into<String>, size: u32) -> Self {
        Neuron {
            name: name.into(),
            definition_url: definition_url.into(),
            size,
            properties: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }

    /// Insert an input, keyed by its `src_key()`.
    pub fn add_input(&mut self, input: Input) {
        self.inputs.insert(input.src_key(), input);
    }
}
