//! DOT graph writer: a deduplicated undirected graph of sub-population
//! names. Informational only — imposes no constraint on the splitter
//! beyond the shared name scheme, and PSP-input edges are best-effort, not
//! covered by completeness tests (see DESIGN.md).
//!
//! Built on `petgraph`'s `Dot` formatter (see DESIGN.md for where this
//! dependency comes from).

use std::collections::BTreeMap;
use std::io::Write;

use petgraph::dot::{Config, Dot};
use petgraph::graph::UnGraph;

use spinesplit_model::Population;

use crate::error::Result;
use crate::NetworkWriter;

/// Accumulates sub-population names and their connecting edges across every
/// `write_population` call, then emits a single `petgraph::dot::Dot`
/// rendering of the whole network on `finish`.
pub struct DotWriter<W: Write> {
    inner: W,
    node_index: BTreeMap<String, petgraph::graph::NodeIndex>,
    graph: UnGraph<String, ()>,
}

impl<W: Write> DotWriter<W> {
    /// Construct a writer over `inner`.
    pub fn new(inner: W) -> Self {
        DotWriter {
            inner,
            node_index: BTreeMap::new(),
            graph: UnGraph::new_undirected(),
        }
    }

    fn node(&mut self, name: &str) -> petgraph::graph::NodeIndex {
        if let Some(&idx) = self.node_index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_index.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, a: &str, b: &str) {
        let ai = self.node(a);
        let bi = self.node(b);
        if ai == bi {
            return;
        }
        if !self.graph.contains_edge(ai, bi) {
            self.graph.add_edge(ai, bi, ());
        }
    }
}

impl<W: Write> NetworkWriter for DotWriter<W> {
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_population(&mut self, _unsplit: &Population, sub_populations: &[Population]) -> Result<()> {
        for pop in sub_populations {
            self.node(&pop.name);
            for projection in pop.projections.values() {
                self.add_edge(&pop.name, &projection.proj_population);
            }
            // Input edges. PSP-input edges are collapsed into the same pass
            // as Neuron-input edges since, for this informational graph, the
            // distinction between "feeds the neuron" and "feeds the
            // post-synapse" doesn't change which two sub-populations are
            // linked — only whether that link is complete is left
            // best-effort.
            for input in pop.neuron.inputs.values() {
                self.add_edge(&pop.name, &input.src);
            }
            for projection in pop.projections.values() {
                for synapse in projection.synapses.values() {
                    for input in synapse.post_synapse.inputs.values() {
                        self.add_edge(&pop.name, &input.src);
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let rendered = format!(
            "{:?}",
            Dot::with_config(&self.graph, &[Config::EdgeNoLabel])
        );
        self.inner.write_all(rendered.as_bytes())?;
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::{Neuron, Projection};

    #[test]
    fn dedupes_edges_and_skips_self_loops() {
        let mut buf = Vec::new();
        let mut writer = DotWriter::new(&mut buf);
        writer.begin().unwrap();

        let mut pop_a = Population::new("A_sub0", Neuron::new("A_sub0", "url", 4));
        pop_a.add_projection(Projection::new("A_sub0", 0)); // self-loop, skipped
        pop_a.add_projection(Projection::new("B_sub0", 1));
        let unsplit = Population::new("A", Neuron::new("A", "url", 4));
        writer.write_population(&unsplit, std::slice::from_ref(&pop_a)).unwrap();

        let mut pop_b = Population::new("B_sub0", Neuron::new("B_sub0", "url", 4));
        pop_b.add_projection(Projection::new("A_sub0", 0));
        let unsplit_b = Population::new("B", Neuron::new("B", "url", 4));
        writer.write_population(&unsplit_b, std::slice::from_ref(&pop_b)).unwrap();

        writer.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("A_sub0"));
        assert!(text.contains("B_sub0"));
        // Exactly one A_sub0 <-> B_sub0 edge despite being declared from both sides.
        assert_eq!(writer.graph.edge_count(), 1);
    }

    #[test]
    fn single_population_has_no_edges() {
        let mut buf = Vec::new();
        let mut writer = DotWriter::new(&mut buf);
        writer.begin().unwrap();
        let pop = Population::new("Solo_sub0", Neuron::new("Solo_sub0", "url", 2));
        let unsplit = Population::new("Solo", Neuron::new("Solo", "url", 2));
        writer.write_population(&unsplit, std::slice::from_ref(&pop)).unwrap();
        assert_eq!(writer.graph.edge_count(), 0);
        assert_eq!(writer.graph.node_count(), 1);
    }
}
