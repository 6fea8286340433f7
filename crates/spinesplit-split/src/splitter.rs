//! Top-level entry point: `split` partitions one `Population` into its
//! `ceil(size / cap)` sub-populations.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use spinesplit_model::{Neuron, Population};

use crate::context::SplitContext;
use crate::error::Result;
use crate::input_split::split_inputs;
use crate::projection_split::split_projection;
use crate::property_split::split_population_properties;

/// Partition `pop` into its `ceil(size / cap) ` sub-populations, rewriting
/// every projection, synapse, input, property and delay.
///
/// `pop` is never mutated. Each sub-population is built independently (in
/// parallel across sub-indices when the `parallel` feature is enabled) and
/// the result is returned in ascending sub-index order.
pub fn split(ctx: &SplitContext, pop: &Population) -> Result<Vec<Population>> {
    let cap = ctx.cap;
    let n = pop.sub_count(cap);

    let build = |sub_idx: u32| -> Result<Population> {
        let sub_size = pop.sub_size(sub_idx, cap);

        let mut neuron = Neuron::new(
            spinesplit_model::sub_name(&pop.name, sub_idx),
            pop.neuron.definition_url.clone(),
            sub_size,
        );
        neuron.properties =
            split_population_properties(&pop.neuron.properties, sub_idx, cap, sub_size);
        neuron.inputs = split_inputs(ctx, &pop.neuron.inputs, sub_idx, sub_size)?;

        let mut sub_pop = Population::new(neuron.name.clone(), neuron);

        for projection in pop.projections.values() {
            let synapse_entries =
                split_projection(ctx, &pop.name, pop.size(), projection, sub_idx, sub_size)?;
            for entry in synapse_entries {
                sub_pop
                    .projections
                    .entry(entry.peer_sub_name.clone())
                    .or_insert_with(|| spinesplit_model::Projection::new(entry.peer_sub_name, projection.index))
                    .add_synapse(entry.synapse);
            }
        }

        Ok(sub_pop)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<Result<Population>> = if ctx.parallel {
        (0..n).into_par_iter().map(build).collect()
    } else {
        (0..n).map(build).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Population>> = (0..n).map(build).collect();

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::{
        AbstractionConnection, PostSynapse, Projection, SplitterMode, Synapse, WeightUpdate,
    };
    use std::collections::BTreeMap;

    #[test]
    fn splits_self_projecting_population_into_sized_sub_pops() {
        // CAP=4, size=10, all-to-all self-projection ->
        // 3 sub-pops sized 4, 4, 2; 3x3 = 9 sub-synapses total.
        let neuron = Neuron::new("P", "url", 10);
        let mut pop = Population::new("P", neuron);
        let mut projection = Projection::new("P", 0);
        projection.add_synapse(Synapse::new(
            AbstractionConnection::AllToAll { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        ));
        pop.add_projection(projection);

        let mut sizes = BTreeMap::new();
        sizes.insert("P".to_string(), 10);
        let ctx = SplitContext::new(4, SplitterMode::ProjDefinedAtSrc, &sizes);

        let subs = split(&ctx, &pop).unwrap();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].neuron.size, 4);
        assert_eq!(subs[1].neuron.size, 4);
        assert_eq!(subs[2].neuron.size, 2);

        let total_synapses: usize = subs
            .iter()
            .map(|s| s.projections.values().map(|p| p.synapses.len()).sum::<usize>())
            .sum();
        assert_eq!(total_synapses, 9);

        for sub in &subs {
            assert_eq!(sub.projections.len(), 3);
        }
    }

    #[test]
    fn one_to_one_self_projection_yields_one_subsynapse_per_sub() {
        let neuron = Neuron::new("P", "url", 8);
        let mut pop = Population::new("P", neuron);
        let mut projection = Projection::new("P", 0);
        projection.add_synapse(Synapse::new(
            AbstractionConnection::OneToOne { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        ));
        pop.add_projection(projection);

        let mut sizes = BTreeMap::new();
        sizes.insert("P".to_string(), 8);
        let ctx = SplitContext::new(4, SplitterMode::ProjDefinedAtSrc, &sizes);

        let subs = split(&ctx, &pop).unwrap();
        assert_eq!(subs.len(), 2);
        for sub in &subs {
            assert_eq!(sub.projections.len(), 1);
            let proj = sub.projections.values().next().unwrap();
            assert_eq!(proj.synapses.len(), 1);
        }
    }

    #[test]
    fn splitting_into_a_single_sub_population_is_a_pure_rename() {
        let neuron = Neuron::new("Small", "url", 3);
        let pop = Population::new("Small", neuron);
        let sizes = BTreeMap::new();
        let ctx = SplitContext::new(100, SplitterMode::ProjDefinedAtSrc, &sizes);
        let subs = split(&ctx, &pop).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].name, "Small_sub0");
        assert_eq!(subs[0].neuron.size, 3);
    }
}
