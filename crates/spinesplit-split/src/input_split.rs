//! Input splitting: re-targets every `Input` owned by a `Neuron` or
//! `PostSynapse` so each sub-component draws from the correctly-sized
//! sub-population(s) of its peer.

use std::collections::BTreeMap;

use spinesplit_model::{sub_name, AbstractionConnection, ConnectionInstance, Input, Orientation};

use crate::context::SplitContext;
use crate::delay::clone_delay;
use crate::naming::split_input_group_key;
use crate::error::Result;

/// Split every input in `inputs`, owned by a sub-component at `own_sub_idx`
/// whose own window spans `own_sub_size` local indices (`cap` for every
/// sub-component but a final, ragged one).
///
/// Used both for a `Neuron`'s own inputs (`own_sub_idx` = the population's
/// sub-index) and a `PostSynapse`'s inputs (`own_sub_idx` = the destination
/// sub-index of the synapse being split) — a post-synapse's inputs are
/// always windowed against its destination side, regardless of
/// `SplitterMode`.
pub fn split_inputs(
    ctx: &SplitContext,
    inputs: &BTreeMap<String, Input>,
    own_sub_idx: u32,
    own_sub_size: u32,
) -> Result<BTreeMap<String, Input>> {
    let cap = ctx.cap;
    let mut out = BTreeMap::new();
    for input in inputs.values() {
        match &input.remapping {
            AbstractionConnection::OneToOne { delay } => {
                let remapping = AbstractionConnection::OneToOne {
                    delay: clone_delay(delay),
                };
                let name = sub_name(&input.src, own_sub_idx);
                let sub_input = Input::new_split(
                    name,
                    input.src_port.clone(),
                    input.dst_port.clone(),
                    remapping,
                    input.src.clone(),
                    own_sub_idx,
                );
                out.insert(sub_input.src_key(), sub_input);
                input.record_sub_inp_count(1);
            }
            AbstractionConnection::AllToAll { delay } => {
                let remote_sub_count = ctx.sub_count_of(&input.src)?;
                for k in 0..remote_sub_count {
                    let remapping = AbstractionConnection::AllToAll {
                        delay: clone_delay(delay),
                    };
                    let name = sub_name(&input.src, k);
                    let sub_input = Input::new_split(
                        name,
                        input.src_port.clone(),
                        input.dst_port.clone(),
                        remapping,
                        input.src.clone(),
                        k,
                    );
                    out.insert(sub_input.src_key(), sub_input);
                }
                input.record_sub_inp_count(remote_sub_count);
            }
            AbstractionConnection::FixedProbability {
                probability,
                seed,
                delay,
            } => {
                let remote_sub_count = ctx.sub_count_of(&input.src)?;
                for k in 0..remote_sub_count {
                    let remapping = AbstractionConnection::FixedProbability {
                        probability: *probability,
                        seed: *seed,
                        delay: clone_delay(delay),
                    };
                    let name = sub_name(&input.src, k);
                    let sub_input = Input::new_split(
                        name,
                        input.src_port.clone(),
                        input.dst_port.clone(),
                        remapping,
                        input.src.clone(),
                        k,
                    );
                    out.insert(sub_input.src_key(), sub_input);
                }
                input.record_sub_inp_count(remote_sub_count);
            }
            AbstractionConnection::ConnectionList {
                by_first_key, delay, ..
            } => {
                struct Building {
                    remote_sub_name: String,
                    remote_sub_idx: u32,
                    instances: Vec<ConnectionInstance>,
                }
                let mut created: BTreeMap<String, Building> = BTreeMap::new();
                let start = own_sub_idx * cap;
                for d in start..start + own_sub_size {
                    let Some(row) = by_first_key.row(d) else {
                        continue;
                    };
                    for (&s, inst) in row.iter() {
                        let remote_sub = s / cap;
                        let remote_sub_name = sub_name(&input.src, remote_sub);
                        let key = split_input_group_key(
                            &input.src,
                            remote_sub,
                            &input.src_port,
                            &input.dst_port,
                        );
                        let building = created.entry(key).or_insert_with(|| Building {
                            remote_sub_name: remote_sub_name.clone(),
                            remote_sub_idx: remote_sub,
                            instances: Vec::new(),
                        });
                        let next_index = building.instances.len() as u32;
                        building.instances.push(ConnectionInstance {
                            index: next_index,
                            src_neuron: s % cap,
                            dst_neuron: d % cap,
                            delay: inst.delay,
                        });
                    }
                }
                input.record_sub_inp_count(created.len() as u32);
                for building in created.into_values() {
                    let remapping = AbstractionConnection::connection_list(
                        building.instances,
                        Orientation::DstOuter,
                        clone_delay(delay),
                    );
                    let sub_input = Input::new_split(
                        building.remote_sub_name,
                        input.src_port.clone(),
                        input.dst_port.clone(),
                        remapping,
                        input.src.clone(),
                        building.remote_sub_idx,
                    );
                    out.insert(sub_input.src_key(), sub_input);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::SplitterMode;
    use std::collections::BTreeMap as Map;

    fn ctx(sizes: &Map<String, u32>) -> SplitContext<'_> {
        SplitContext::new(4, SplitterMode::ProjDefinedAtSrc, sizes)
    }

    #[test]
    fn one_to_one_input_targets_matching_sub_index() {
        let sizes = Map::new();
        let c = ctx(&sizes);
        let mut inputs = Map::new();
        let input = Input::new(
            "PopA",
            "spike",
            "exc",
            AbstractionConnection::OneToOne { delay: None },
        );
        inputs.insert(input.src_key(), input);
        let split = split_inputs(&c, &inputs, 2, 4).unwrap();
        assert_eq!(split.len(), 1);
        let sub = split.values().next().unwrap();
        assert_eq!(sub.src, "PopA_sub2");
        assert_eq!(sub.sub_inp_index, Some(2));
    }

    #[test]
    fn all_to_all_input_fans_out_to_every_remote_sub() {
        let mut sizes = Map::new();
        sizes.insert("PopA".to_string(), 10);
        let c = ctx(&sizes);
        let mut inputs = Map::new();
        let input = Input::new(
            "PopA",
            "spike",
            "exc",
            AbstractionConnection::AllToAll { delay: None },
        );
        inputs.insert(input.src_key(), input);
        let split = split_inputs(&c, &inputs, 0, 4).unwrap();
        assert_eq!(split.len(), 3); // ceil(10/4) = 3
    }

    #[test]
    fn list_input_groups_by_remote_sub_and_reindexes_locally() {
        let sizes = Map::new();
        let c = ctx(&sizes);
        let mut inputs = Map::new();
        let instances = vec![
            ConnectionInstance {
                index: 0,
                src_neuron: 0,
                dst_neuron: 0,
                delay: None,
            },
            ConnectionInstance {
                index: 1,
                src_neuron: 5,
                dst_neuron: 1,
                delay: None,
            },
        ];
        let remapping =
            AbstractionConnection::connection_list(instances, Orientation::DstOuter, None);
        let input = Input::new("PopA", "spike", "exc", remapping);
        inputs.insert(input.src_key(), input);
        // Own window is dst in [0,4): both destinations 0 and 1 fall inside.
        let split = split_inputs(&c, &inputs, 0, 4).unwrap();
        assert_eq!(split.len(), 2); // remote subs 0 (src=0) and 1 (src=5)
        let from_sub0 = &split["PopA_sub0_spike_exc"];
        if let AbstractionConnection::ConnectionList { connections, .. } = &from_sub0.remapping {
            assert_eq!(connections.len(), 1);
            assert_eq!(connections[0].src_neuron, 0);
            assert_eq!(connections[0].dst_neuron, 0);
        } else {
            unreachable!();
        }
        let from_sub1 = &split["PopA_sub1_spike_exc"];
        if let AbstractionConnection::ConnectionList { connections, .. } = &from_sub1.remapping {
            assert_eq!(connections.len(), 1);
            assert_eq!(connections[0].src_neuron, 1); // 5 % 4
            assert_eq!(connections[0].dst_neuron, 1);
        } else {
            unreachable!();
        }
    }
}
