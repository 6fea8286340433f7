//! `Input`: a remapping of another component's output port into this one.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::connection::AbstractionConnection;

/// A remapping of a peer component's output port into this component.
///
/// Split inputs additionally carry a stable back-reference to their unsplit
/// parent (`unsplit_name`) and their own `sub_inp_index`, instead of an owning
/// or weak pointer — cyclic unsplit↔sub references are modeled as stable
/// names plus a side table, never a baked-in parent pointer.
#[derive(Debug)]
pub struct Input {
    /// Name of the peer component this input draws from.
    pub src: String,
    /// Output port on the peer component.
    pub src_port: String,
    /// Input port on this component.
    pub dst_port: String,
    /// The connectivity shape of the remapping.
    pub remapping: AbstractionConnection,
    /// Maximum sub-input count created from this (unsplit) input across all
    /// of its parent's sub-components; updated via atomic max during
    /// splitting. Zero on an input that hasn't been split yet.
    sub_inp_max: AtomicU32,
    /// For a *split* input: the stable name of the unsplit parent input's
    /// owning component. `None` on an unsplit input.
    pub unsplit_name: Option<String>,
    /// For a *split* input: this sub-input's position among the sub-inputs
    /// created from the same unsplit input. `None` on an unsplit input.
    pub sub_inp_index: Option<u32>,
}

impl Input {
    /// Construct a fresh, unsplit input.
    pub fn new(
        src: impl Into<String>,
        src_port: impl Into<String>,
        dst_port: impl Into<String>,
        remapping: AbstractionConnection,
    ) -> Self {
        Input {
            src: src.into(),
            src_port: src_port.into(),
            dst_port: dst_port.into(),
            remapping,
            sub_inp_max: AtomicU32::new(0),
            unsplit_name: None,
            sub_inp_index: None,
        }
    }

    /// Build the `srcKey` used to key this input within its owning
    /// component's `inputs` map: `"<src>_<src_port>_<dst_port>"`.
    pub fn src_key(&self) -> String {
        format!("{}_{}_{}", self.src, self.src_port, self.dst_port)
    }

    /// Current value of `sub_inp_max`.
    pub fn sub_inp_max(&self) -> u32 {
        self.sub_inp_max.load(Ordering::Acquire)
    }

    /// Atomically raise `sub_inp_max` to `at_least` if it is currently lower.
    pub fn record_sub_inp_count(&self, at_least: u32) {
        let mut current = self.sub_inp_max.load(Ordering::Acquire);
        while current < at_least {
            match self.sub_inp_max.compare_exchange_weak(
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

    /// Construct a split sub-input referencing an unsplit parent by name.
    pub fn new_split(
        src: impl Into<String>,
        src_port: impl Into<String>,
        dst_port: impl Into<String>,
        remapping: AbstractionConnection,
        unsplit_name: impl Into<String>,
        sub_inp_index: u32,
    ) -> Self {
        Input {
            src: src.into(),
            src_port: src_port.into(),
            dst_port: dst_port.into(),
            remapping,
            sub_inp_max: AtomicU32::new(0),
            unsplit_name: Some(unsplit_name.into()),
            sub_inp_index: Some(sub_inp_index),
        }
    }
}

impl Clone for Input {
    fn clone(&self) -> Self {
        Input {
            src: self.src.clone(),
            src_port: self.src_port.clone(),
            dst_port: self.dst_port.clone(),
            remapping: self.remapping.clone(),
            sub_inp_max: AtomicU32::new(self.sub_inp_max()),
            unsplit_name: self.unsplit_name.clone(),
            sub_inp_index: self.sub_inp_index,
        }
    }
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src
            && self.src_port == other.src_port
            && self.dst_port == other.dst_port
            && self.remapping == other.remapping
            && self.unsplit_name == other.unsplit_name
            && self.sub_inp_index == other.sub_inp_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn src_key_format() {
        let input = Input::new(
            "PopA",
            "spike",
            "exc",
            AbstractionConnection::AllToAll { delay: None },
        );
        assert_eq!(input.src_key(), "PopA_spike_exc");
    }

    #[test]
    fn record_sub_inp_count_only_raises() {
        let input = Input::new(
            "PopA",
            "spike",
            "exc",
            AbstractionConnection::AllToAll { delay: None },
        );
        input.record_sub_inp_count(3);
        input.record_sub_inp_count(1);
        assert_eq!(input.sub_inp_max(), 3);
        input.record_sub_inp_count(5);
        assert_eq!(input.sub_inp_max(), 5);
    }
}
