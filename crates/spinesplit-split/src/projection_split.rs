//! Projection splitting: rewrites one parent `Projection`'s synapses into the
//! sub-synapses owned by a single sub-population at `own_sub_idx`.
//!
//! A population's own `projections` map only ever holds projections it was
//! *nested under* in the source XML: under
//! [`SplitterMode::ProjDefinedAtSrc`] that nesting population is always the
//! source; under [`SplitterMode::ProjDefinedAtDst`] it is always the
//! destination. `split_projection` resolves that role once per call and
//! always computes the synapse's *real* source/destination sub-indices from
//! it — so naming, connection-list re-indexing and property-list windowing
//! never need a special case for which side nested the element; the
//! connection-list re-indexing itself stays keyed as parsed.

use std::collections::{BTreeMap, HashSet};

use spinesplit_model::{
    sub_name, sub_pair_name, AbstractionConnection, ConnectionInstance, ConnectionMatrix,
    ConnectivityKind, ModelError, Orientation, PostSynapse, Projection, Synapse, WeightUpdate,
};

use crate::context::SplitContext;
use crate::delay::clone_delay;
use crate::error::Result;
use crate::input_split::split_inputs;
use crate::property_split::{
    split_post_synapse_properties, split_weight_update_properties, WeightUpdateWindow,
};

/// One freshly built sub-synapse plus the sub-population name of the peer it
/// targets, ready to be filed into the caller's sub-population.
pub struct SplitSynapseEntry {
    /// The peer sub-population's name (the other end of this sub-synapse).
    pub peer_sub_name: String,
    /// The new, fully split synapse.
    pub synapse: Synapse,
}

/// Split every synapse in `projection`, from the perspective of the
/// sub-population at `own_sub_idx` of the population that owns `projection`
/// (`own_pop_name`/`own_pop_size` identify that population; its real
/// source/destination role is resolved from `ctx.mode`).
pub fn split_projection(
    ctx: &SplitContext,
    own_pop_name: &str,
    own_pop_size: u32,
    projection: &Projection,
    own_sub_idx: u32,
    own_sub_size: u32,
) -> Result<Vec<SplitSynapseEntry>> {
    let peer_name = &projection.proj_population;
    let peer_size = ctx.size_of(peer_name)?;
    let pop_is_src = matches!(ctx.mode, spinesplit_model::SplitterMode::ProjDefinedAtSrc);

    let mut out = Vec::new();
    for synapse in projection.synapses.values() {
        let mut entries = split_synapse(
            ctx,
            own_pop_name,
            own_pop_size,
            peer_name,
            peer_size,
            pop_is_src,
            synapse,
            own_sub_idx,
            own_sub_size,
        )?;
        out.append(&mut entries);
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn split_synapse(
    ctx: &SplitContext,
    own_pop_name: &str,
    own_pop_size: u32,
    peer_name: &str,
    peer_size: u32,
    pop_is_src: bool,
    synapse: &Synapse,
    own_sub_idx: u32,
    own_sub_size: u32,
) -> Result<Vec<SplitSynapseEntry>> {
    let cap = ctx.cap;
    match &synapse.connection {
        AbstractionConnection::AllToAll { delay } => {
            let remote_sub_count = ctx.sub_count_of(peer_name)?;
            synapse.set_sub_syn_max(remote_sub_count);
            let mut out = Vec::with_capacity(remote_sub_count as usize);
            for remote_sub in 0..remote_sub_count {
                let remote_sub_size = spinesplit_model::sub_population_size(peer_size, remote_sub, cap);
                let (src_sub, src_sub_size, dst_sub, dst_sub_size) = if pop_is_src {
                    (own_sub_idx, own_sub_size, remote_sub, remote_sub_size)
                } else {
                    (remote_sub, remote_sub_size, own_sub_idx, own_sub_size)
                };
                let dst_pop_size = if pop_is_src { peer_size } else { own_pop_size };
                let window = WeightUpdateWindow::Flattened {
                    src_sub,
                    src_sub_size,
                    dst_sub,
                    target_sub_size: dst_sub_size,
                    dst_pop_size,
                    cap,
                };
                let new_syn = build_synapse(
                    ctx,
                    AbstractionConnection::AllToAll {
                        delay: clone_delay(delay),
                    },
                    synapse,
                    src_sub,
                    dst_sub,
                    dst_sub_size,
                    &window,
                )?;
                let peer_sub_name = sub_name(peer_name, remote_sub);
                out.push(SplitSynapseEntry {
                    peer_sub_name,
                    synapse: new_syn,
                });
            }
            Ok(out)
        }
        AbstractionConnection::FixedProbability {
            probability,
            seed,
            delay,
        } => {
            let remote_sub_count = ctx.sub_count_of(peer_name)?;
            synapse.set_sub_syn_max(remote_sub_count);
            let mut out = Vec::with_capacity(remote_sub_count as usize);
            for remote_sub in 0..remote_sub_count {
                let remote_sub_size = spinesplit_model::sub_population_size(peer_size, remote_sub, cap);
                let (src_sub, dst_sub, dst_sub_size) = if pop_is_src {
                    (own_sub_idx, remote_sub, remote_sub_size)
                } else {
                    (remote_sub, own_sub_idx, own_sub_size)
                };
                let new_syn = build_synapse(
                    ctx,
                    AbstractionConnection::FixedProbability {
                        probability: *probability,
                        seed: *seed,
                        delay: clone_delay(delay),
                    },
                    synapse,
                    src_sub,
                    dst_sub,
                    dst_sub_size,
                    &WeightUpdateWindow::CloneVerbatim,
                )?;
                let peer_sub_name = sub_name(peer_name, remote_sub);
                out.push(SplitSynapseEntry {
                    peer_sub_name,
                    synapse: new_syn,
                });
            }
            Ok(out)
        }
        AbstractionConnection::OneToOne { delay } => {
            if own_pop_size != peer_size {
                let (src_name, src_size, dst_name, dst_size) = if pop_is_src {
                    (own_pop_name, own_pop_size, peer_name, peer_size)
                } else {
                    (peer_name, peer_size, own_pop_name, own_pop_size)
                };
                return Err(ModelError::OneToOneSizeMismatch {
                    src_name: src_name.to_string(),
                    src_size,
                    dst_name: dst_name.to_string(),
                    dst_size,
                }
                .into());
            }
            synapse.set_sub_syn_max(1);
            let window = WeightUpdateWindow::Direct {
                sub_idx: own_sub_idx,
                sub_size: own_sub_size,
                cap,
            };
            let new_syn = build_synapse(
                ctx,
                AbstractionConnection::OneToOne {
                    delay: clone_delay(delay),
                },
                synapse,
                own_sub_idx,
                own_sub_idx,
                own_sub_size,
                &window,
            )?;
            let peer_sub_name = sub_name(peer_name, own_sub_idx);
            Ok(vec![SplitSynapseEntry {
                peer_sub_name,
                synapse: new_syn,
            }])
        }
        AbstractionConnection::ConnectionList {
            connections, delay, ..
        } => split_list_synapse(
            ctx,
            pop_is_src,
            peer_name,
            synapse,
            connections,
            delay.as_ref(),
            own_sub_idx,
            own_sub_size,
        ),
    }
}

/// Build one sub-synapse's weight-update, post-synapse, and connectivity,
/// given the already-resolved real (src_sub, dst_sub) pair and the
/// weight-update's property window.
fn build_synapse(
    ctx: &SplitContext,
    connection: AbstractionConnection,
    parent: &Synapse,
    src_sub: u32,
    dst_sub: u32,
    dst_sub_size: u32,
    window: &WeightUpdateWindow,
) -> Result<Synapse> {
    let wu_name = sub_pair_name(&parent.weight_update.name, src_sub, dst_sub);
    let mut wu = WeightUpdate::new(
        wu_name,
        parent.weight_update.definition_url.clone(),
        parent.weight_update.input_src_port.clone(),
        parent.weight_update.input_dst_port.clone(),
    );
    wu.properties = split_weight_update_properties(&parent.weight_update.properties, window);

    let ps_name = sub_pair_name(&parent.post_synapse.name, src_sub, dst_sub);
    let mut ps = PostSynapse::new(
        ps_name,
        parent.post_synapse.definition_url.clone(),
        parent.post_synapse.input_src_port.clone(),
        parent.post_synapse.input_dst_port.clone(),
        parent.post_synapse.output_src_port.clone(),
        parent.post_synapse.output_dst_port.clone(),
    );
    ps.properties =
        split_post_synapse_properties(&parent.post_synapse.properties, dst_sub, ctx.cap, dst_sub_size);
    ps.inputs = split_inputs(ctx, &parent.post_synapse.inputs, dst_sub, dst_sub_size)?;

    Ok(Synapse::new(connection, wu, ps))
}

#[allow(clippy::too_many_arguments)]
fn split_list_synapse(
    ctx: &SplitContext,
    pop_is_src: bool,
    peer_name: &str,
    synapse: &Synapse,
    connections: &[ConnectionInstance],
    delay: Option<&spinesplit_model::PropertyValue>,
    own_sub_idx: u32,
    own_sub_size: u32,
) -> Result<Vec<SplitSynapseEntry>> {
    let cap = ctx.cap;
    let own_start = own_sub_idx * cap;
    let own_end = own_start + own_sub_size;

    struct Building {
        remote_sub: u32,
        src_sub: u32,
        dst_sub: u32,
        instances: Vec<ConnectionInstance>,
        index_map: Vec<(u32, u32)>,
        seen_pairs: HashSet<(u32, u32)>,
    }
    let mut building: BTreeMap<(u32, u32), Building> = BTreeMap::new();

    // Under ProjDefinedAtSrc this population's own window is the source axis
    // and the parent connection list's `SrcOuter` matrix, already built at
    // parse time, is queried directly. Under ProjDefinedAtDst this
    // population's own window is the destination axis, so a `DstOuter` view
    // is built ad hoc over the same instances.
    if pop_is_src {
        let matrix = ConnectionMatrix::build(connections, Orientation::SrcOuter);
        for n in own_start..own_end {
            let Some(row) = matrix.row(n) else { continue };
            for (&t, inst) in row.iter() {
                let remote_sub = t / cap;
                let key = (own_sub_idx, remote_sub);
                let b = building.entry(key).or_insert_with(|| Building {
                    remote_sub,
                    src_sub: own_sub_idx,
                    dst_sub: remote_sub,
                    instances: Vec::new(),
                    index_map: Vec::new(),
                    seen_pairs: HashSet::new(),
                });
                let src_local = n % cap;
                let dst_local = t % cap;
                if !b.seen_pairs.insert((src_local, dst_local)) {
                    return Err(ModelError::DuplicateConnection {
                        src: src_local,
                        dst: dst_local,
                        component: synapse.weight_update.name.clone(),
                    }
                    .into());
                }
                let sub_index = b.instances.len() as u32;
                b.instances.push(ConnectionInstance {
                    index: sub_index,
                    src_neuron: src_local,
                    dst_neuron: dst_local,
                    delay: inst.delay,
                });
                b.index_map.push((inst.index, sub_index));
            }
        }
    } else {
        let matrix = ConnectionMatrix::build(connections, Orientation::DstOuter);
        for n in own_start..own_end {
            let Some(row) = matrix.row(n) else { continue };
            for (&s, inst) in row.iter() {
                let remote_sub = s / cap;
                let key = (remote_sub, own_sub_idx);
                let b = building.entry(key).or_insert_with(|| Building {
                    remote_sub,
                    src_sub: remote_sub,
                    dst_sub: own_sub_idx,
                    instances: Vec::new(),
                    index_map: Vec::new(),
                    seen_pairs: HashSet::new(),
                });
                let src_local = s % cap;
                let dst_local = n % cap;
                if !b.seen_pairs.insert((src_local, dst_local)) {
                    return Err(ModelError::DuplicateConnection {
                        src: src_local,
                        dst: dst_local,
                        component: synapse.weight_update.name.clone(),
                    }
                    .into());
                }
                let sub_index = b.instances.len() as u32;
                b.instances.push(ConnectionInstance {
                    index: sub_index,
                    src_neuron: src_local,
                    dst_neuron: dst_local,
                    delay: inst.delay,
                });
                b.index_map.push((inst.index, sub_index));
            }
        }
    }

    synapse.record_sub_syn_count(building.len() as u32);

    let mut out = Vec::with_capacity(building.len());
    for (_, b) in building {
        let remote_sub_size = spinesplit_model::sub_population_size(ctx.size_of(peer_name)?, b.remote_sub, cap);
        let dst_sub_size = if pop_is_src {
            remote_sub_size
        } else {
            own_sub_size
        };
        let window = WeightUpdateWindow::ByInstanceMap { map: b.index_map };
        let connection =
            AbstractionConnection::connection_list(b.instances, Orientation::SrcOuter, clone_delay(&delay.cloned()));
        let new_syn = build_synapse(ctx, connection, synapse, b.src_sub, b.dst_sub, dst_sub_size, &window)?;
        let peer_sub_name = sub_name(peer_name, b.remote_sub);
        out.push(SplitSynapseEntry {
            peer_sub_name,
            synapse: new_syn,
        });
    }
    Ok(out)
}

/// The connectivity kind this synapse carries, exposed for callers that only
/// need to branch without matching the full connection value.
pub fn connectivity_kind(synapse: &Synapse) -> ConnectivityKind {
    synapse.connection.kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::{Property, PropertyValue, SplitterMode};
    use std::collections::BTreeMap as Map;

    fn ctx(sizes: &Map<String, u32>, mode: SplitterMode) -> SplitContext<'_> {
        SplitContext::new(4, mode, sizes)
    }

    fn all_to_all_synapse() -> Synapse {
        Synapse::new(
            AbstractionConnection::AllToAll { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        )
    }

    #[test]
    fn all_to_all_self_projection_produces_cap_squared_subsynapses() {
        // CAP=4, size=10 -> 3 sub-pops; a self-projection yields 3 targets
        // from each of the 3 sub-populations' own splits (9 total across all
        // three calls, 3 from this one).
        let mut sizes = Map::new();
        sizes.insert("P".to_string(), 10);
        let c = ctx(&sizes, SplitterMode::ProjDefinedAtSrc);
        let projection = {
            let mut p = Projection::new("P", 0);
            p.add_synapse(all_to_all_synapse());
            p
        };
        let entries = split_projection(&c, "P", 10, &projection, 0, 4).unwrap();
        assert_eq!(entries.len(), 3);
        let names: Vec<_> = entries.iter().map(|e| e.peer_sub_name.clone()).collect();
        assert!(names.contains(&"P_sub0".to_string()));
        assert!(names.contains(&"P_sub1".to_string()));
        assert!(names.contains(&"P_sub2".to_string()));
    }

    #[test]
    fn one_to_one_size_mismatch_is_fatal() {
        let mut sizes = Map::new();
        sizes.insert("B".to_string(), 6);
        let c = ctx(&sizes, SplitterMode::ProjDefinedAtSrc);
        let synapse = Synapse::new(
            AbstractionConnection::OneToOne { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        );
        let projection = {
            let mut p = Projection::new("B", 0);
            p.add_synapse(synapse);
            p
        };
        let result = split_projection(&c, "A", 8, &projection, 0, 4);
        assert!(result.is_err());
    }

    #[test]
    fn list_connectivity_splits_into_sub_projections_keyed_by_real_pair() {
        // A{8} -> B{6}, CAP=4: connection (0,0) stays within A_sub0/B_sub0.
        let mut sizes = Map::new();
        sizes.insert("B".to_string(), 6);
        let c = ctx(&sizes, SplitterMode::ProjDefinedAtSrc);
        let connections = vec![
            ConnectionInstance {
                index: 0,
                src_neuron: 0,
                dst_neuron: 0,
                delay: None,
            },
            ConnectionInstance {
                index: 1,
                src_neuron: 5,
                dst_neuron: 5,
                delay: None,
            },
        ];
        let connection = AbstractionConnection::connection_list(connections, Orientation::SrcOuter, None);
        let synapse = Synapse::new(
            connection,
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        );
        let projection = {
            let mut p = Projection::new("B", 0);
            p.add_synapse(synapse);
            p
        };
        // sub 0 of A covers neurons [0,4): only (0,0) is in this window.
        let entries = split_projection(&c, "A", 8, &projection, 0, 4).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].peer_sub_name, "B_sub0");
        if let AbstractionConnection::ConnectionList { connections, .. } = &entries[0].synapse.connection {
            assert_eq!(connections.len(), 1);
            assert_eq!(connections[0].src_neuron, 0);
            assert_eq!(connections[0].dst_neuron, 0);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn value_list_weight_update_property_windows_to_flattened_subrange() {
        let mut sizes = Map::new();
        sizes.insert("B".to_string(), 4);
        let c = ctx(&sizes, SplitterMode::ProjDefinedAtSrc);
        let mut entries = Map::new();
        entries.insert(0 * 4 + 0, 1.0);
        let mut wu = WeightUpdate::new("wu", "url", "in", "out");
        wu.properties
            .push(Property::new("w", PropertyValue::ValueList { entries }));
        let synapse = Synapse::new(
            AbstractionConnection::AllToAll { delay: None },
            wu,
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        );
        let projection = {
            let mut p = Projection::new("B", 0);
            p.add_synapse(synapse);
            p
        };
        let entries = split_projection(&c, "A", 4, &projection, 0, 4).unwrap();
        assert_eq!(entries.len(), 1);
        let wu_props = &entries[0].synapse.weight_update.properties;
        assert_eq!(wu_props.len(), 1);
    }
}
