//! Connectivity abstractions: the four connection kinds, a densely-indexed
//! connection instance, and the two-level matrix the splitter queries.

use std::collections::BTreeMap;

use crate::property::PropertyValue;

/// Which connectivity shape a component declares. Used by the InfoPass
/// before connection instances are known, and to dispatch splitter logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityKind {
    /// Every source neuron connects to every destination neuron.
    AllToAll,
    /// Source neuron `i` connects only to destination neuron `i`.
    OneToOne,
    /// Each (src, dst) pair exists independently with fixed probability.
    FixedProbability,
    /// An explicit, densely-indexed list of connections.
    ConnectionList,
}

/// A single materialized connection between a source and destination neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionInstance {
    /// Dense index within the owning list, assigned in read/construction order.
    pub index: u32,
    /// Source-side neuron index.
    pub src_neuron: u32,
    /// Destination-side neuron index.
    pub dst_neuron: u32,
    /// Per-connection explicit delay, if the binary/inline format carried one.
    pub delay: Option<f64>,
}

/// Which axis is the outer key of a [`ConnectionMatrix`].
///
/// Chosen once at construction time: rebuilding a matrix with reversed
/// orientation is not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Outer key is the source neuron (used for synapse connectivity).
    SrcOuter,
    /// Outer key is the destination neuron (used for input remappings).
    DstOuter,
}

/// A two-level `outer -> {inner -> instance}` view over a connection list,
/// built once and queried by the splitter for per-neuron lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMatrix {
    orientation: Orientation,
    by_outer: BTreeMap<u32, BTreeMap<u32, ConnectionInstance>>,
}

impl ConnectionMatrix {
    /// Build the matrix from a flat instance list under the given orientation.
    pub fn build(instances: &[ConnectionInstance], orientation: Orientation) -> Self {
        let mut by_outer: BTreeMap<u32, BTreeMap<u32, ConnectionInstance>> = BTreeMap::new();
        for inst in instances {
            let (outer, inner) = match orientation {
                Orientation::SrcOuter => (inst.src_neuron, inst.dst_neuron),
                Orientation::DstOuter => (inst.dst_neuron, inst.src_neuron),
            };
            by_outer.entry(outer).or_default().insert(inner, inst.clone());
        }
        ConnectionMatrix {
            orientation,
            by_outer,
        }
    }

    /// The orientation this matrix was constructed with.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// All instances whose outer key equals `outer`, keyed by inner index.
    pub fn row(&self, outer: u32) -> Option<&BTreeMap<u32, ConnectionInstance>> {
        self.by_outer.get(&outer)
    }

    /// Iterate every `(outer, inner, instance)` triple in outer-then-inner order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &ConnectionInstance)> {
        self.by_outer.iter().flat_map(|(&outer, inner_map)| {
            inner_map
                .iter()
                .map(move |(&inner, inst)| (outer, inner, inst))
        })
    }

    /// Total instance count across all rows.
    pub fn len(&self) -> usize {
        self.by_outer.values().map(|m| m.len()).sum()
    }

    /// Whether the matrix holds no instances.
    pub fn is_empty(&self) -> bool {
        self.by_outer.is_empty()
    }
}

/// The connectivity declared on a `Synapse` or `Input`: a tagged variant with
/// an optional per-variant `Delay` (absent from `ConnectionList` when the
/// per-connection delays are carried on individual instances instead).
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractionConnection {
    /// Every source neuron connects to every destination neuron.
    AllToAll {
        /// Shared delay applied to every implied connection.
        delay: Option<PropertyValue>,
    },
    /// Source neuron `i` connects only to destination neuron `i`.
    OneToOne {
        /// Shared delay applied to every implied connection.
        delay: Option<PropertyValue>,
    },
    /// Each (src, dst) pair exists independently with fixed probability.
    FixedProbability {
        /// Connection probability in `[0, 1]`.
        probability: f64,
        /// Optional fixed seed for the Bernoulli draws.
        seed: Option<u64>,
        /// Shared delay applied to every realized connection.
        delay: Option<PropertyValue>,
    },
    /// An explicit list of connections, either inline or from a binary file.
    ConnectionList {
        /// Flat instance list in read order (the authoritative dense index source).
        connections: Vec<ConnectionInstance>,
        /// Two-level lookup matrix built from `connections` at construction time.
        by_first_key: ConnectionMatrix,
        /// Optional shared delay distribution applied when instances lack one.
        delay: Option<PropertyValue>,
    },
}

impl AbstractionConnection {
    /// The [`ConnectivityKind`] this connection carries.
    pub fn kind(&self) -> ConnectivityKind {
        match self {
            AbstractionConnection::AllToAll { .. } => ConnectivityKind::AllToAll,
            AbstractionConnection::OneToOne { .. } => ConnectivityKind::OneToOne,
            AbstractionConnection::FixedProbability { .. } => ConnectivityKind::FixedProbability,
            AbstractionConnection::ConnectionList { .. } => ConnectivityKind::ConnectionList,
        }
    }

    /// The shared delay carried by this connection, if any.
    pub fn delay(&self) -> Option<&PropertyValue> {
        match self {
            AbstractionConnection::AllToAll { delay }
            | AbstractionConnection::OneToOne { delay }
            | AbstractionConnection::FixedProbability { delay, .. } => delay.as_ref(),
            AbstractionConnection::ConnectionList { delay, .. } => delay.as_ref(),
        }
    }

    /// Construct a `ConnectionList` variant, building its matrix eagerly.
    pub fn connection_list(
        connections: Vec<ConnectionInstance>,
        orientation: Orientation,
        delay: Option<PropertyValue>,
    ) -> Self {
        let by_first_key = ConnectionMatrix::build(&connections, orientation);
        AbstractionConnection::ConnectionList {
            connections,
            by_first_key,
            delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(index: u32, src: u32, dst: u32) -> ConnectionInstance {
        ConnectionInstance {
            index,
            src_neuron: src,
            dst_neuron: dst,
            delay: None,
        }
    }

    #[test]
    fn matrix_src_outer_groups_by_source() {
        let instances = vec![inst(0, 0, 0), inst(1, 0, 1), inst(2, 1, 0)];
        let matrix = ConnectionMatrix::build(&instances, Orientation::SrcOuter);
        assert_eq!(matrix.row(0).unwrap().len(), 2);
        assert_eq!(matrix.row(1).unwrap().len(), 1);
        assert_eq!(matrix.len(), 3);
    }

    #[test]
    fn matrix_dst_outer_groups_by_destination() {
        let instances = vec![inst(0, 0, 0), inst(1, 0, 1), inst(2, 1, 0)];
        let matrix = ConnectionMatrix::build(&instances, Orientation::DstOuter);
        assert_eq!(matrix.row(0).unwrap().len(), 2);
        assert_eq!(matrix.row(1).unwrap().len(), 1);
    }

    #[test]
    fn connection_list_kind_and_delay() {
        let conn = AbstractionConnection::connection_list(
            vec![inst(0, 0, 0)],
            Orientation::SrcOuter,
            Some(PropertyValue::Fixed { value: 2.0 }),
        );
        assert_eq!(conn.kind(), ConnectivityKind::ConnectionList);
        assert_eq!(conn.delay(), Some(&PropertyValue::Fixed { value: 2.0 }));
    }
}
