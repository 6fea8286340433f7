//! DAMSON-alias writer: a tabular/array emitter of a split network onto the
//! DAMSON tile-routing model.
//!
//! Every sub-population becomes one block: a routing table mapping incoming
//! `(src_sub_population, src_local_index, src_split_index)` triples to a
//! local destination index, the set of active source ports feeding it, and
//! its flattened neuron/weight-update/post-synapse property arrays. Only
//! `ProjDefinedAtDst` networks are accepted ("DAMSON-alias mode on a
//! src-defined network: fatal error before any output bytes are emitted")
//! — under that mode a sub-population's own `projections` map already holds
//! its *incoming* synapses, which is exactly the direction this writer's
//! routing table is keyed in.
//!
//! The wire format here is a plain line-oriented text block rather than a
//! packed binary schema (see DESIGN.md): the routing table's shape is
//! sparse and per-synapse-kind-dependent, which doesn't fit a fixed-width
//! record the way `shnn-storage`'s VCSR/VMSK formats do for dense graphs,
//! and no concrete byte layout is specified to match. Every name emitted is
//! passed through [`crate::sanitize::sanitize`]: names must be valid target
//! identifiers.

use std::io::Write;

use spinesplit_model::{AbstractionConnection, Population, PropertyValue, SplitterMode};

use crate::error::{Result, WriteError};
use crate::sanitize::sanitize;
use crate::NetworkWriter;

/// Emits the DAMSON-alias tabular form of a split network. Construction
/// fails immediately if the network is not destination-defined, before any
/// byte is written.
pub struct DamsonWriter<W: Write> {
    inner: W,
    cap: u32,
    split_populations: usize,
    split_projections: usize,
    split_inputs: usize,
}

impl<W: Write> DamsonWriter<W> {
    /// Construct a writer over `inner`, bound to `cap` for uniform array
    /// sizing. Fails if `mode` is not [`SplitterMode::ProjDefinedAtDst`].
    pub fn new(inner: W, cap: u32, mode: SplitterMode) -> Result<Self> {
        if mode != SplitterMode::ProjDefinedAtDst {
            return Err(WriteError::DamsonRequiresDstDefined);
        }
        Ok(DamsonWriter {
            inner,
            cap,
            split_populations: 0,
            split_projections: 0,
            split_inputs: 0,
        })
    }

    /// Running counts of emitted sub-populations/projections/inputs, updated
    /// by plain increments — the writer itself is never called concurrently.
    pub fn counters(&self) -> (usize, usize, usize) {
        (self.split_populations, self.split_projections, self.split_inputs)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.inner, "{line}")?;
        Ok(())
    }

    fn write_property_value(&mut self, prefix: &str, name: &str, value: &PropertyValue, size_hint: u32) -> Result<()> {
        match value {
            PropertyValue::Fixed { value } => {
                self.write_line(&format!("{prefix}.{name} = scalar {value}"))?;
            }
            PropertyValue::ValueList { entries } => {
                let mut array = vec![0.0_f64; size_hint as usize];
                for (&idx, &v) in entries {
                    if (idx as usize) < array.len() {
                        array[idx as usize] = v;
                    }
                }
                let rendered: Vec<String> = array.iter().map(|v| v.to_string()).collect();
                self.write_line(&format!("{prefix}.{name} = array [{}]", rendered.join(", ")))?;
            }
            PropertyValue::Uniform { seed, min, max } => {
                let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| "none".into());
                self.write_line(&format!(
                    "{prefix}.{name} = uniform seed={seed} min={min} max={max}"
                ))?;
            }
            PropertyValue::Normal { seed, mean, variance } => {
                let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| "none".into());
                self.write_line(&format!(
                    "{prefix}.{name} = normal seed={seed} mean={mean} variance={variance}"
                ))?;
            }
            PropertyValue::Poisson { seed, mean } => {
                let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| "none".into());
                self.write_line(&format!("{prefix}.{name} = poisson seed={seed} mean={mean}"))?;
            }
        }
        Ok(())
    }

    fn sanitized(name: &str) -> Result<String> {
        let out = sanitize(name);
        if out.is_empty() {
            return Err(WriteError::EmptySanitizedName { name: name.to_string() });
        }
        Ok(out)
    }

    /// The sub-index suffix parsed from a stable `<parent>_sub<i>` name,
    /// used as the routing table's `src_split_index` for non-list
    /// connectivity kinds, where no per-connection dense index exists.
    fn parse_sub_index(name: &str) -> u32 {
        name.rsplit_once("_sub")
            .and_then(|(_, suffix)| suffix.parse().ok())
            .unwrap_or(0)
    }

    fn write_sub_population(&mut self, unsplit: &Population, pop: &Population) -> Result<()> {
        let name = Self::sanitized(&pop.name)?;
        self.write_line(&format!("[population {name}]"))?;
        self.write_line(&format!("size = {}", pop.neuron.size))?;
        self.write_line(&format!("neuron_url = {}", pop.neuron.definition_url))?;
        self.split_populations += 1;

        for property in &pop.neuron.properties {
            self.write_property_value(&format!("properties.neuron.{name}"), &property.name, &property.value, pop.neuron.size)?;
        }

        // Active source ports: every distinct (peer, port) pair feeding this
        // sub-population, across incoming projections and direct inputs.
        let mut ports: Vec<(String, String)> = Vec::new();
        for projection in pop.projections.values() {
            let peer = Self::sanitized(&projection.proj_population)?;
            for synapse in projection.synapses.values() {
                ports.push((peer.clone(), synapse.weight_update.input_src_port.clone()));
            }
        }
        for input in pop.neuron.inputs.values() {
            ports.push((Self::sanitized(&input.src)?, input.src_port.clone()));
        }
        ports.sort();
        ports.dedup();
        for (peer, port) in &ports {
            self.write_line(&format!("active_source_port {name} {peer} {port}"))?;
        }

        // Routing table and per-synapse property arrays, keyed by incoming
        // projection (this population is always the destination under
        // ProjDefinedAtDst).
        for projection in pop.projections.values() {
            let peer = Self::sanitized(&projection.proj_population)?;
            let src_split_index = Self::parse_sub_index(&projection.proj_population);
            self.split_projections += 1;

            for synapse in projection.synapses.values() {
                let wu_name = Self::sanitized(&synapse.weight_update.name)?;
                let ps_name = Self::sanitized(&synapse.post_synapse.name)?;

                match &synapse.connection {
                    AbstractionConnection::OneToOne { delay } => {
                        let delay = render_delay(delay.as_ref());
                        for i in 0..pop.neuron.size {
                            self.write_line(&format!(
                                "route {name} {peer} {i} {src_split_index} -> {i} delay={delay}"
                            ))?;
                        }
                    }
                    AbstractionConnection::AllToAll { delay } => {
                        let delay = render_delay(delay.as_ref());
                        self.write_line(&format!(
                            "route_all {name} {peer} {src_split_index} delay={delay}"
                        ))?;
                    }
                    AbstractionConnection::FixedProbability { probability, seed, delay } => {
                        let delay = render_delay(delay.as_ref());
                        let seed = seed.map(|s| s.to_string()).unwrap_or_else(|| "none".into());
                        self.write_line(&format!(
                            "route_probabilistic {name} {peer} {src_split_index} probability={probability} seed={seed} delay={delay}"
                        ))?;
                    }
                    AbstractionConnection::ConnectionList { connections, .. } => {
                        for inst in connections {
                            let delay = inst
                                .delay
                                .map(|d| d.to_string())
                                .unwrap_or_else(|| "none".into());
                            self.write_line(&format!(
                                "route {name} {peer} {} {src_split_index} -> {} delay={delay}",
                                inst.src_neuron, inst.dst_neuron
                            ))?;
                        }
                    }
                }

                for property in &synapse.weight_update.properties {
                    self.write_property_value(
                        &format!("properties.weight_update.{wu_name}"),
                        &property.name,
                        &property.value,
                        self.cap * self.cap,
                    )?;
                }
                for property in &synapse.post_synapse.properties {
                    self.write_property_value(
                        &format!("properties.postsynapse.{ps_name}"),
                        &property.name,
                        &property.value,
                        pop.neuron.size,
                    )?;
                }
            }

            // Uniform array-sizing hint: the maximum sub-synapse count this
            // projection's unsplit synapses produced across every
            // sub-population of `unsplit`. Maxima stored on unsplit parents
            // size outer array dimensions uniformly across split shards.
            if let Some(unsplit_proj) = unsplit.projections.get(&projection.proj_population) {
                for synapse in unsplit_proj.synapses.values() {
                    let wu_name = Self::sanitized(&synapse.weight_update.name)?;
                    self.write_line(&format!(
                        "expected_subsynapses {wu_name} = {}",
                        synapse.sub_syn_max()
                    ))?;
                }
            }
        }

        self.split_inputs += pop.neuron.inputs.len();
        for input in unsplit.neuron.inputs.values() {
            self.write_line(&format!(
                "expected_subinputs neuron.{} = {}",
                Self::sanitized(&input.src_key())?,
                input.sub_inp_max()
            ))?;
        }

        Ok(())
    }
}

fn render_delay(delay: Option<&PropertyValue>) -> String {
    match delay {
        None => "none".to_string(),
        Some(PropertyValue::Fixed { value }) => value.to_string(),
        Some(other) => format!("{other:?}"),
    }
}

impl<W: Write> NetworkWriter for DamsonWriter<W> {
    fn begin(&mut self) -> Result<()> {
        self.write_line("# spinesplit DAMSON-alias output")
    }

    fn write_population(&mut self, unsplit: &Population, sub_populations: &[Population]) -> Result<()> {
        for pop in sub_populations {
            self.write_sub_population(unsplit, pop)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::{Neuron, PostSynapse, Projection, Synapse, WeightUpdate};

    #[test]
    fn rejects_src_defined_networks_before_any_write() {
        let buf: Vec<u8> = Vec::new();
        let result = DamsonWriter::new(buf, 4, SplitterMode::ProjDefinedAtSrc);
        assert!(result.is_err());
    }

    #[test]
    fn emits_one_to_one_routes_per_local_index() {
        let mut buf = Vec::new();
        {
            let mut writer = DamsonWriter::new(&mut buf, 4, SplitterMode::ProjDefinedAtDst).unwrap();
            writer.begin().unwrap();

            let mut sub_pop = Population::new("B_sub0", Neuron::new("B_sub0", "url", 4));
            let mut proj = Projection::new("A_sub0", 0);
            proj.add_synapse(Synapse::new(
                AbstractionConnection::OneToOne { delay: None },
                WeightUpdate::new("wu_sub0_0", "url", "in", "out"),
                PostSynapse::new("ps_sub0_0", "url", "in", "out", "in2", "out2"),
            ));
            sub_pop.add_projection(proj);

            let unsplit = Population::new("B", Neuron::new("B", "url", 4));
            writer.write_population(&unsplit, std::slice::from_ref(&sub_pop)).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("route B_sub0 A_sub0 0 0 -> 0"));
        assert!(text.contains("route B_sub0 A_sub0 3 0 -> 3"));
    }

    #[test]
    fn list_connectivity_emits_one_route_per_instance() {
        let mut buf = Vec::new();
        {
            let mut writer = DamsonWriter::new(&mut buf, 4, SplitterMode::ProjDefinedAtDst).unwrap();
            writer.begin().unwrap();

            let mut sub_pop = Population::new("B_sub0", Neuron::new("B_sub0", "url", 4));
            let mut proj = Projection::new("A_sub1", 0);
            let connections = vec![spinesplit_model::ConnectionInstance {
                index: 0,
                src_neuron: 2,
                dst_neuron: 1,
                delay: Some(5.0),
            }];
            let connection = AbstractionConnection::connection_list(
                connections,
                spinesplit_model::Orientation::SrcOuter,
                None,
            );
            proj.add_synapse(Synapse::new(
                connection,
                WeightUpdate::new("wu_sub1_0", "url", "in", "out"),
                PostSynapse::new("ps_sub1_0", "url", "in", "out", "in2", "out2"),
            ));
            sub_pop.add_projection(proj);

            let unsplit = Population::new("B", Neuron::new("B", "url", 4));
            writer.write_population(&unsplit, std::slice::from_ref(&sub_pop)).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("route B_sub0 A_sub1 2 1 -> 1 delay=5"));
    }

    #[test]
    fn active_source_ports_are_deduplicated() {
        let mut buf = Vec::new();
        {
            let mut writer = DamsonWriter::new(&mut buf, 4, SplitterMode::ProjDefinedAtDst).unwrap();
            writer.begin().unwrap();
            let mut sub_pop = Population::new("B_sub0", Neuron::new("B_sub0", "url", 4));
            let mut proj = Projection::new("A_sub0", 0);
            proj.add_synapse(Synapse::new(
                AbstractionConnection::AllToAll { delay: None },
                WeightUpdate::new("wu_sub0_0", "url", "spike", "out"),
                PostSynapse::new("ps_sub0_0", "url", "in", "out", "in2", "out2"),
            ));
            sub_pop.add_projection(proj);
            let unsplit = Population::new("B", Neuron::new("B", "url", 4));
            writer.write_population(&unsplit, std::slice::from_ref(&sub_pop)).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let count = text.matches("active_source_port B_sub0 A_sub0 spike").count();
        assert_eq!(count, 1);
    }
}
