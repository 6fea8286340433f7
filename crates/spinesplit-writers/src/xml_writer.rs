//! Generic XML round-trip writer: emits the split network back out in the
//! same schema it was read from, with the `LL:` prefix added to
//! Population/Neuron/Input/Projection/Synapse/WeightUpdate/PostSynapse.
//!
//! Built on `quick_xml::Writer`, the same ecosystem convention
//! `spinesplit-parser` reads with.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer as QuickWriter;

use spinesplit_model::{
    AbstractionConnection, Input, Population, Projection, Property, PropertyValue, Synapse,
    SplitterMode,
};

use crate::error::Result;
use crate::NetworkWriter;

const XMLNS: &str = "http://www.shef.ac.uk/SpineMLNetworkLayer";
const XMLNS_LL: &str = "http://www.shef.ac.uk/SpineMLLowLevelNetworkLayer";
const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.shef.ac.uk/SpineMLLowLevelNetworkLayer SpineMLLowLevelNetworkLayer.xsd";

/// Writes sub-populations as `<LL:Population>` elements inside a single
/// `<SpineML>` root, round-tripping the Low-Level network schema.
pub struct XmlWriter<W: Write> {
    writer: QuickWriter<W>,
    mode: SplitterMode,
}

impl<W: Write> XmlWriter<W> {
    /// Construct a writer over `inner`. `pretty` disables compaction
    /// (`-no_xml_formatting` negated — i.e. pass `!no_xml_formatting`).
    pub fn new(inner: W, mode: SplitterMode, pretty: bool) -> Self {
        let writer = if pretty {
            QuickWriter::new_with_indent(inner, b' ', 2)
        } else {
            QuickWriter::new(inner)
        };
        XmlWriter { writer, mode }
    }

    fn write_population_element(&mut self, pop: &Population) -> Result<()> {
        let mut start = BytesStart::new("LL:Population");
        self.writer.write_event(Event::Start(start.to_owned()))?;

        self.write_neuron(pop)?;
        for projection in pop.projections.values() {
            self.write_projection(projection)?;
        }

        self.writer
            .write_event(Event::End(BytesEnd::new("LL:Population")))?;
        start.clear_attributes();
        Ok(())
    }

    fn write_neuron(&mut self, pop: &Population) -> Result<()> {
        let neuron = &pop.neuron;
        let mut start = BytesStart::new("LL:Neuron");
        start.push_attribute(("name", neuron.name.as_str()));
        start.push_attribute(("url", neuron.definition_url.as_str()));
        start.push_attribute(("size", neuron.size.to_string().as_str()));
        self.writer.write_event(Event::Start(start))?;

        for property in &neuron.properties {
            self.write_property(property)?;
        }
        for input in neuron.inputs.values() {
            self.write_input(input)?;
        }

        self.writer
            .write_event(Event::End(BytesEnd::new("LL:Neuron")))?;
        Ok(())
    }

    fn write_projection(&mut self, projection: &Projection) -> Result<()> {
        let peer_attr = match self.mode {
            SplitterMode::ProjDefinedAtSrc => "dst_population",
            SplitterMode::ProjDefinedAtDst => "src_population",
        };
        let mut start = BytesStart::new("LL:Projection");
        start.push_attribute((peer_attr, projection.proj_population.as_str()));
        self.writer.write_event(Event::Start(start))?;

        for synapse in projection.synapses.values() {
            self.write_synapse(synapse)?;
        }

        self.writer
            .write_event(Event::End(BytesEnd::new("LL:Projection")))?;
        Ok(())
    }

    fn write_synapse(&mut self, synapse: &Synapse) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new("LL:Synapse")))?;

        self.write_connection(&synapse.connection)?;

        let wu = &synapse.weight_update;
        let mut wu_start = BytesStart::new("LL:WeightUpdate");
        wu_start.push_attribute(("name", wu.name.as_str()));
        wu_start.push_attribute(("url", wu.definition_url.as_str()));
        wu_start.push_attribute(("input_src_port", wu.input_src_port.as_str()));
        wu_start.push_attribute(("input_dst_port", wu.input_dst_port.as_str()));
        self.writer.write_event(Event::Start(wu_start))?;
        for property in &wu.properties {
            self.write_property(property)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new("LL:WeightUpdate")))?;

        let ps = &synapse.post_synapse;
        let mut ps_start = BytesStart::new("LL:PostSynapse");
        ps_start.push_attribute(("name", ps.name.as_str()));
        ps_start.push_attribute(("url", ps.definition_url.as_str()));
        ps_start.push_attribute(("input_src_port", ps.input_src_port.as_str()));
        ps_start.push_attribute(("input_dst_port", ps.input_dst_port.as_str()));
        ps_start.push_attribute(("output_src_port", ps.output_src_port.as_str()));
        ps_start.push_attribute(("output_dst_port", ps.output_dst_port.as_str()));
        self.writer.write_event(Event::Start(ps_start))?;
        for property in &ps.properties {
            self.write_property(property)?;
        }
        for input in ps.inputs.values() {
            self.write_input(input)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new("LL:PostSynapse")))?;

        self.writer
            .write_event(Event::End(BytesEnd::new("LL:Synapse")))?;
        Ok(())
    }

    fn write_input(&mut self, input: &Input) -> Result<()> {
        let mut start = BytesStart::new("LL:Input");
        start.push_attribute(("src", input.src.as_str()));
        start.push_attribute(("src_port", input.src_port.as_str()));
        start.push_attribute(("dst_port", input.dst_port.as_str()));
        self.writer.write_event(Event::Start(start))?;
        self.write_connection(&input.remapping)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("LL:Input")))?;
        Ok(())
    }

    fn write_connection(&mut self, connection: &AbstractionConnection) -> Result<()> {
        match connection {
            AbstractionConnection::AllToAll { delay } => {
                self.write_empty_or_wrapped("AllToAllConnection", delay)
            }
            AbstractionConnection::OneToOne { delay } => {
                self.write_empty_or_wrapped("OneToOneConnection", delay)
            }
            AbstractionConnection::FixedProbability {
                probability,
                seed,
                delay,
            } => {
                let mut start = BytesStart::new("FixedProbabilityConnection");
                start.push_attribute(("probability", probability.to_string().as_str()));
                if let Some(seed) = seed {
                    start.push_attribute(("seed", seed.to_string().as_str()));
                }
                self.write_with_optional_delay(start, "FixedProbabilityConnection", delay)
            }
            AbstractionConnection::ConnectionList {
                connections, delay, ..
            } => {
                let start = BytesStart::new("ConnectionList");
                self.writer.write_event(Event::Start(start.to_owned()))?;
                for inst in connections {
                    let mut conn = BytesStart::new("Connection");
                    conn.push_attribute(("src_neuron", inst.src_neuron.to_string().as_str()));
                    conn.push_attribute(("dst_neuron", inst.dst_neuron.to_string().as_str()));
                    if let Some(delay) = inst.delay {
                        conn.push_attribute(("delay", delay.to_string().as_str()));
                    }
                    self.writer.write_event(Event::Empty(conn))?;
                }
                if let Some(delay) = delay {
                    self.write_delay(delay)?;
                }
                self.writer
                    .write_event(Event::End(BytesEnd::new("ConnectionList")))?;
                Ok(())
            }
        }
    }

    fn write_empty_or_wrapped(
        &mut self,
        name: &'static str,
        delay: &Option<PropertyValue>,
    ) -> Result<()> {
        let start = BytesStart::new(name);
        self.write_with_optional_delay(start, name, delay)
    }

    fn write_with_optional_delay(
        &mut self,
        start: BytesStart,
        name: &'static str,
        delay: &Option<PropertyValue>,
    ) -> Result<()> {
        match delay {
            None => {
                self.writer.write_event(Event::Empty(start))?;
            }
            Some(delay) => {
                self.writer.write_event(Event::Start(start))?;
                self.write_delay(delay)?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
        Ok(())
    }

    fn write_delay(&mut self, value: &PropertyValue) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new("Delay")))?;
        self.write_property_value(value)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("Delay")))?;
        Ok(())
    }

    fn write_property(&mut self, property: &Property) -> Result<()> {
        let mut start = BytesStart::new("Property");
        start.push_attribute(("name", property.name.as_str()));
        self.writer.write_event(Event::Start(start))?;
        self.write_property_value(&property.value)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("Property")))?;
        Ok(())
    }

    fn write_property_value(&mut self, value: &PropertyValue) -> Result<()> {
        match value {
            PropertyValue::Fixed { value } => {
                let mut el = BytesStart::new("FixedValue");
                el.push_attribute(("value", value.to_string().as_str()));
                self.writer.write_event(Event::Empty(el))?;
            }
            PropertyValue::ValueList { entries } => {
                self.writer
                    .write_event(Event::Start(BytesStart::new("ValueList")))?;
                for (&index, &value) in entries {
                    let mut el = BytesStart::new("Value");
                    el.push_attribute(("index", index.to_string().as_str()));
                    el.push_attribute(("value", value.to_string().as_str()));
                    self.writer.write_event(Event::Empty(el))?;
                }
                self.writer
                    .write_event(Event::End(BytesEnd::new("ValueList")))?;
            }
            PropertyValue::Uniform { seed, min, max } => {
                let mut el = BytesStart::new("UniformDistribution");
                if let Some(seed) = seed {
                    el.push_attribute(("seed", seed.to_string().as_str()));
                }
                el.push_attribute(("minimum", min.to_string().as_str()));
                el.push_attribute(("maximum", max.to_string().as_str()));
                self.writer.write_event(Event::Empty(el))?;
            }
            PropertyValue::Normal {
                seed,
                mean,
                variance,
            } => {
                let mut el = BytesStart::new("NormalDistribution");
                if let Some(seed) = seed {
                    el.push_attribute(("seed", seed.to_string().as_str()));
                }
                el.push_attribute(("mean", mean.to_string().as_str()));
                el.push_attribute(("variance", variance.to_string().as_str()));
                self.writer.write_event(Event::Empty(el))?;
            }
            PropertyValue::Poisson { seed, mean } => {
                let mut el = BytesStart::new("PoissonDistribution");
                if let Some(seed) = seed {
                    el.push_attribute(("seed", seed.to_string().as_str()));
                }
                el.push_attribute(("mean", mean.to_string().as_str()));
                self.writer.write_event(Event::Empty(el))?;
            }
        }
        Ok(())
    }
}

impl<W: Write> NetworkWriter for XmlWriter<W> {
    fn begin(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("SpineML");
        root.push_attribute(("xmlns", XMLNS));
        root.push_attribute(("xmlns:LL", XMLNS_LL));
        root.push_attribute(("xmlns:xsi", XMLNS_XSI));
        root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
        self.writer.write_event(Event::Start(root))?;
        Ok(())
    }

    fn write_population(&mut self, _unsplit: &Population, sub_populations: &[Population]) -> Result<()> {
        for pop in sub_populations {
            self.write_population_element(pop)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new("SpineML")))?;
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinesplit_model::{Neuron, PostSynapse, WeightUpdate};

    #[test]
    fn writes_root_and_population_elements() {
        let mut buf = Vec::new();
        {
            let mut writer = XmlWriter::new(&mut buf, SplitterMode::ProjDefinedAtSrc, false);
            writer.begin().unwrap();
            let pop = Population::new("P_sub0", Neuron::new("P_sub0", "url", 4));
            writer.write_population(&pop, std::slice::from_ref(&pop)).unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<SpineML"));
        assert!(text.contains("xmlns:LL="));
        assert!(text.contains("<LL:Population>"));
        assert!(text.contains("<LL:Neuron"));
        assert!(text.contains("</SpineML>"));
    }

    #[test]
    fn projection_peer_attribute_follows_mode() {
        let mut buf = Vec::new();
        let mut writer = XmlWriter::new(&mut buf, SplitterMode::ProjDefinedAtDst, false);
        writer.begin().unwrap();
        let mut pop = Population::new("B_sub0", Neuron::new("B_sub0", "url", 4));
        let mut proj = Projection::new("A_sub0", 0);
        proj.add_synapse(Synapse::new(
            AbstractionConnection::OneToOne { delay: None },
            WeightUpdate::new("wu", "url", "in", "out"),
            PostSynapse::new("ps", "url", "in", "out", "in2", "out2"),
        ));
        pop.add_projection(proj);
        writer.write_population(&pop, std::slice::from_ref(&pop)).unwrap();
        writer.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("src_population=\"A_sub0\""));
    }

    #[test]
    fn value_list_property_emits_every_entry() {
        let mut buf = Vec::new();
        let mut writer = XmlWriter::new(&mut buf, SplitterMode::ProjDefinedAtSrc, false);
        writer.begin().unwrap();
        let mut neuron = Neuron::new("P_sub0", "url", 2);
        let mut entries = std::collections::BTreeMap::new();
        entries.insert(0, 1.5);
        entries.insert(1, 2.5);
        neuron
            .properties
            .push(Property::new("tau", PropertyValue::ValueList { entries }));
        let pop = Population::new("P_sub0", neuron);
        writer.write_population(&pop, std::slice::from_ref(&pop)).unwrap();
        writer.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<ValueList>"));
        assert!(text.contains("index=\"0\""));
        assert!(text.contains("index=\"1\""));
    }
}
