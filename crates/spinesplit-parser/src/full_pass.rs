//! The second XML pass: rewinds the document the InfoPass already walked and
//! builds fully materialized `Population` objects, one at a time, including
//! connection instances from inline `<Connection>` elements or a referenced
//! `<BinaryFile>` stream.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{instrument, warn};

use spinesplit_model::{
    AbstractionConnection, ComponentInfo, ConnectionInstance, ConnectivityKind, Input, ModelError,
    Neuron, Orientation, Population, PostSynapse, Projection, Property, PropertyValue,
    SplitterMode, Synapse, WeightUpdate,
};

use crate::binary::read_binary_connections;
use crate::error::{ParseError, Result};
use crate::info_pass::InfoPassOutput;
use crate::line_index::LineIndex;
use crate::value::parse_wrapped_value;
use crate::xml_util::{
    attr, attr_f64, attr_f64_opt, attr_opt, attr_u32, attr_u64_opt, local_name, local_name_end,
};

/// Sizes known from the InfoPass, keyed by component name, used to bounds-
/// check connection instances and value-list indices during the FullPass.
struct SizeTable(BTreeMap<String, u32>);

impl SizeTable {
    fn build(components: &[ComponentInfo]) -> Self {
        let mut map = BTreeMap::new();
        for c in components {
            if let Some(size) = c.size() {
                map.insert(c.name().to_string(), size);
            }
        }
        SizeTable(map)
    }

    fn size(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<u32> {
        self.size(name).ok_or_else(|| {
            ParseError::Model(ModelError::invalid(format!(
                "component '{name}' has no resolved size at FullPass time"
            )))
        })
    }
}

/// Run the FullPass over a network document, given the InfoPass output from
/// a prior parse of the same document text. `network_dir` resolves
/// `<BinaryFile file_name=…>` paths, which are relative to the network file.
/// Returns every top-level Population in file order, fully populated.
#[instrument(skip(xml, info))]
pub fn run_full_pass(xml: &str, info: &InfoPassOutput, network_dir: &Path) -> Result<Vec<Population>> {
    let line_index = LineIndex::build(xml);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let sizes = SizeTable::build(&info.components);
    let mode = info.mode;

    let mut populations = Vec::new();

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Population" => {
                let _ = tag;
                let pop = parse_population(&mut reader, &mut buf, &line_index, &sizes, mode, network_dir)
                    .map_err(|e| wrap_at(e, &reader, &line_index))?;
                populations.push(pop);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(populations)
}

fn wrap_at(err: ParseError, reader: &Reader<&[u8]>, line_index: &LineIndex) -> ParseError {
    if err.line().is_some() {
        err
    } else {
        err.at_line(line_index.line_at(reader.buffer_position()))
    }
}

fn consume_until_end(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>, name: &str) -> Result<()> {
    loop {
        match reader.read_event_into(buf)? {
            Event::End(tag) if local_name_end(&tag) == name => return Ok(()),
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: format!("</{name}>"),
                })
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Drop value-list entries at or beyond `size`, warning once per property
/// with the number dropped (non-fatal, the entry is simply dropped).
fn finalize_property(property: &mut Property, component_name: &str, size: u32) {
    let dropped = property.value.drop_indices_at_or_above(size);
    if dropped > 0 {
        warn!(
            "property '{}' on '{}': {dropped} value-list entr{} at or beyond size {size} dropped",
            property.name,
            component_name,
            if dropped == 1 { "y" } else { "ies" },
        );
    }
}

/// Parse `<Population>…</Population>`, whose `Start` was just consumed.
fn parse_population(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    sizes: &SizeTable,
    mode: Option<SplitterMode>,
    network_dir: &Path,
) -> Result<Population> {
    let mut neuron: Option<Neuron> = None;
    let mut pop_name: Option<String> = None;
    let mut projections: Vec<Projection> = Vec::new();
    let mut proj_index: u32 = 0;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Neuron" => {
                let name = attr(&tag, "name")?;
                let size = attr_u32(&tag, "size")?;
                let url = attr_opt(&tag, "url")?.unwrap_or_default();
                let mut n = Neuron::new(name.clone(), url, size);
                parse_neuron_body(reader, buf, line_index, network_dir, sizes, &mut n)?;
                pop_name = Some(name);
                neuron = Some(n);
            }
            Event::Empty(tag) if local_name(&tag) == "Neuron" => {
                let name = attr(&tag, "name")?;
                let size = attr_u32(&tag, "size")?;
                let url = attr_opt(&tag, "url")?.unwrap_or_default();
                pop_name = Some(name.clone());
                neuron = Some(Neuron::new(name, url, size));
            }
            Event::Start(tag) if local_name(&tag) == "Projection" => {
                let nesting_pop = pop_name.clone().ok_or_else(|| {
                    ParseError::UnexpectedElement {
                        found: "Projection".into(),
                        expected: "Neuron before Projection".into(),
                    }
                })?;
                let resolved_mode = mode.ok_or_else(|| {
                    ParseError::Model(ModelError::invalid(
                        "projection present but SplitterMode unresolved by InfoPass",
                    ))
                })?;
                let projection = parse_projection(
                    reader,
                    buf,
                    line_index,
                    network_dir,
                    sizes,
                    resolved_mode,
                    &nesting_pop,
                    proj_index,
                    &tag,
                )?;
                projections.push(projection);
                proj_index += 1;
            }
            Event::End(tag) if local_name_end(&tag) == "Population" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Population>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    let neuron = neuron.ok_or_else(|| {
        ParseError::UnexpectedElement {
            found: "</Population>".into(),
            expected: "<Neuron> inside Population".into(),
        }
    })?;
    let mut population = Population::new(neuron.name.clone(), neuron);
    for projection in projections {
        population.add_projection(projection);
    }
    Ok(population)
}

/// Parse a Neuron's body (`<Property>*<Input>*`), already past its `Start`.
fn parse_neuron_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    sizes: &SizeTable,
    neuron: &mut Neuron,
) -> Result<()> {
    let neuron_size = neuron.size;
    let neuron_name = neuron.name.clone();
    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Property" => {
                let mut property = parse_property(reader, buf, &tag)?;
                finalize_property(&mut property, &neuron_name, neuron_size);
                neuron.properties.push(property);
            }
            Event::Start(tag) if local_name(&tag) == "Input" => {
                if let Some(input) = parse_input(
                    reader,
                    buf,
                    line_index,
                    network_dir,
                    sizes,
                    &tag,
                    InputHost::Neuron,
                    &neuron_name,
                    neuron_size,
                )? {
                    neuron.add_input(input);
                }
            }
            Event::End(tag) if local_name_end(&tag) == "Neuron" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Neuron>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Parse `<Property name=…>` whose `Start` was just consumed, reading its
/// single value child and the matching `</Property>`.
fn parse_property(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>, tag: &BytesStart) -> Result<Property> {
    let name = attr(tag, "name")?;
    let value = parse_wrapped_value(reader, buf)?;
    consume_until_end(reader, buf, "Property")?;
    Ok(Property::new(name, value))
}

/// Which component an `<Input>` is attached to, governing its one-to-one
/// rejection and self-ignore rules.
enum InputHost<'a> {
    /// A Neuron — one-to-one remappings are permitted.
    Neuron,
    /// A PostSynapse belonging to a projection into `dst_population` — one-
    /// to-one remappings are rejected, except a self-referencing one-to-one
    /// input (`src == dst_population`), which is silently ignored.
    PostSynapse { dst_population: &'a str },
}

/// Parse `<Input src=… src_port=… dst_port=…>…</Input>` whose `Start` was
/// just consumed. Returns `None` when the input should be dropped entirely
/// (the PostSynapse self-one-to-one idempotence rule).
fn parse_input(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    sizes: &SizeTable,
    tag: &BytesStart,
    host: InputHost,
    owner_name: &str,
    owner_size: u32,
) -> Result<Option<Input>> {
    let src = attr(tag, "src")?;
    let src_port = attr(tag, "src_port")?;
    let dst_port = attr(tag, "dst_port")?;

    let (remapping, shape_tag, is_empty) = read_input_connectivity(reader, buf, line_index)?;
    let kind = remapping.kind();

    if kind == ConnectivityKind::OneToOne {
        match host {
            InputHost::PostSynapse { dst_population } if src == dst_population => {
                // DAMSON-specific idempotence: ignore entirely.
                if is_empty {
                    // Already fully consumed (self-closed connectivity element).
                } else {
                    consume_until_end(reader, buf, &local_name(&shape_tag))?;
                }
                consume_until_end(reader, buf, "Input")?;
                return Ok(None);
            }
            InputHost::PostSynapse { .. } => {
                return Err(ParseError::Model(ModelError::OneToOneInputUnsupported {
                    name: owner_name.to_string(),
                }))
            }
            InputHost::Neuron => {
                let src_size = sizes.require(&src)?;
                if src_size != owner_size {
                    return Err(ParseError::Model(ModelError::OneToOneSizeMismatch {
                        src_name: src.clone(),
                        src_size,
                        dst_name: owner_name.to_string(),
                        dst_size: owner_size,
                    }));
                }
            }
        }
    }

    let remapping = if let AbstractionConnection::ConnectionList { delay, .. } = &remapping {
        let src_size = sizes.require(&src)?;
        let component_name = format!("{owner_name} input from {src}");
        let connections = materialize_connection_list(
            reader,
            buf,
            line_index,
            network_dir,
            &shape_tag,
            is_empty,
            src_size,
            owner_size,
            &component_name,
        )?;
        AbstractionConnection::connection_list(connections, Orientation::DstOuter, delay.clone())
    } else {
        if is_empty {
            // Nothing further to consume: the connectivity element closed itself.
        } else {
            consume_until_end(reader, buf, &local_name(&shape_tag))?;
        }
        remapping
    };

    consume_until_end(reader, buf, "Input")?;
    Ok(Some(Input::new(src, src_port, dst_port, remapping)))
}

/// Read the connectivity child that determines an `<Input>`'s shape, without
/// yet materializing a `ConnectionList`'s instances (the caller decides
/// whether and how to re-enter the element to do that, since a `ConnectionList`
/// needs direction-specific bounds the caller alone knows).
fn read_input_connectivity(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
) -> Result<(AbstractionConnection, BytesStart<'static>, bool)> {
    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Empty(tag) => {
                let name = local_name(&tag);
                let conn = match name.as_str() {
                    "AllToAllConnection" => AbstractionConnection::AllToAll { delay: None },
                    "OneToOneConnection" => AbstractionConnection::OneToOne { delay: None },
                    "FixedProbabilityConnection" => AbstractionConnection::FixedProbability {
                        probability: attr_f64(&tag, "probability")?,
                        seed: attr_u64_opt(&tag, "seed")?,
                        delay: None,
                    },
                    "ConnectionList" => {
                        AbstractionConnection::connection_list(Vec::new(), Orientation::DstOuter, None)
                    }
                    other => {
                        return Err(ParseError::UnknownConnectivity {
                            element: other.to_string(),
                        })
                    }
                };
                return Ok((conn, tag.into_owned(), true));
            }
            Event::Start(tag) => {
                let name = local_name(&tag);
                let conn = match name.as_str() {
                    "AllToAllConnection" => AbstractionConnection::AllToAll {
                        delay: parse_optional_delay(reader, buf, &name)?,
                    },
                    "OneToOneConnection" => AbstractionConnection::OneToOne {
                        delay: parse_optional_delay(reader, buf, &name)?,
                    },
                    "FixedProbabilityConnection" => {
                        let probability = attr_f64(&tag, "probability")?;
                        let seed = attr_u64_opt(&tag, "seed")?;
                        let delay = parse_optional_delay(reader, buf, &name)?;
                        AbstractionConnection::FixedProbability {
                            probability,
                            seed,
                            delay,
                        }
                    }
                    "ConnectionList" => {
                        // Deferred: caller re-enters with bounds known. The
                        // reader is left positioned exactly here (just past
                        // the `Start`) for `materialize_connection_list`.
                        return Ok((
                            AbstractionConnection::connection_list(Vec::new(), Orientation::DstOuter, None),
                            tag.into_owned(),
                            false,
                        ));
                    }
                    other => {
                        return Err(ParseError::UnknownConnectivity {
                            element: other.to_string(),
                        })
                    }
                };
                return Ok((conn, tag.into_owned(), true));
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "a connectivity element inside <Input>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Parse an already-open connectivity element's optional `<Delay>` child and
/// consume through its own closing tag.
fn parse_optional_delay(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    element_name: &str,
) -> Result<Option<PropertyValue>> {
    let mut delay = None;
    loop {
        match reader.read_event_into(buf)? {
            Event::Start(tag) if local_name(&tag) == "Delay" => {
                delay = Some(parse_wrapped_value(reader, buf)?);
                consume_until_end(reader, buf, "Delay")?;
            }
            Event::End(tag) if local_name_end(&tag) == element_name => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: format!("</{element_name}>"),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(delay)
}

/// Materialize a `ConnectionList`'s instances, for either a synapse
/// (`Orientation::SrcOuter`) or an input remapping (`Orientation::DstOuter`).
/// The caller has already consumed the `ConnectionList` `Start` tag (if
/// `is_empty` is false) or its `Empty` form (if true, in which case there is
/// nothing to read and an empty list is returned).
#[allow(clippy::too_many_arguments)]
fn materialize_connection_list(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    shape_tag: &BytesStart,
    is_empty: bool,
    max_src_size: u32,
    max_dst_size: u32,
    component_name: &str,
) -> Result<Vec<ConnectionInstance>> {
    let _ = shape_tag;
    if is_empty {
        return Ok(Vec::new());
    }

    let mut connections: Vec<ConnectionInstance> = Vec::new();
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut next_index: u32 = 0;
    let mut pending_binary: Option<(String, u32, bool)> = None;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Empty(tag) if local_name(&tag) == "Connection" => {
                let src = attr_u32(&tag, "src_neuron")?;
                let dst = attr_u32(&tag, "dst_neuron")?;
                let delay = attr_f64_opt(&tag, "delay")?;
                push_connection(
                    &mut connections,
                    &mut seen,
                    &mut next_index,
                    src,
                    dst,
                    delay,
                    max_src_size,
                    max_dst_size,
                    component_name,
                )?;
            }
            Event::Empty(tag) if local_name(&tag) == "BinaryFile" => {
                let file_name = attr(&tag, "file_name")?;
                let num_connections = attr_u32(&tag, "num_connections")?;
                let explicit_delay_flag = attr_u32(&tag, "explicit_delay_flag")? != 0;
                pending_binary = Some((file_name, num_connections, explicit_delay_flag));
            }
            Event::Start(tag) if local_name(&tag) == "Delay" => {
                // A shared fallback delay on the list itself; parsed but not
                // applied per-instance here (AbstractionConnection::delay()
                // carries it for consumers that want the fallback).
                let _ = parse_wrapped_value(reader, buf)?;
                consume_until_end(reader, buf, "Delay")?;
            }
            Event::End(tag) if local_name_end(&tag) == "ConnectionList" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</ConnectionList>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((file_name, num_connections, explicit_delay_flag)) = pending_binary {
        let path = network_dir.join(&file_name);
        let raw = read_binary_connections(&path, num_connections, explicit_delay_flag)?;
        for inst in raw {
            push_connection(
                &mut connections,
                &mut seen,
                &mut next_index,
                inst.src_neuron,
                inst.dst_neuron,
                inst.delay,
                max_src_size,
                max_dst_size,
                component_name,
            )?;
        }
    }

    Ok(connections)
}

#[allow(clippy::too_many_arguments)]
fn push_connection(
    connections: &mut Vec<ConnectionInstance>,
    seen: &mut HashSet<(u32, u32)>,
    next_index: &mut u32,
    src: u32,
    dst: u32,
    delay: Option<f64>,
    max_src_size: u32,
    max_dst_size: u32,
    component_name: &str,
) -> Result<()> {
    if src >= max_src_size {
        return Err(ParseError::Model(ModelError::IndexOutOfBounds {
            axis: "src",
            index: src,
            max: max_src_size.saturating_sub(1),
            component: component_name.to_string(),
        }));
    }
    if dst >= max_dst_size {
        return Err(ParseError::Model(ModelError::IndexOutOfBounds {
            axis: "dst",
            index: dst,
            max: max_dst_size.saturating_sub(1),
            component: component_name.to_string(),
        }));
    }
    if !seen.insert((src, dst)) {
        return Err(ParseError::Model(ModelError::DuplicateConnection {
            src,
            dst,
            component: component_name.to_string(),
        }));
    }
    connections.push(ConnectionInstance {
        index: *next_index,
        src_neuron: src,
        dst_neuron: dst,
        delay,
    });
    *next_index += 1;
    Ok(())
}

/// Parse `<Projection {dst_population|src_population}=…>…</Projection>`
/// whose `Start` tag `tag` has just been consumed by the caller.
#[allow(clippy::too_many_arguments)]
fn parse_projection(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    sizes: &SizeTable,
    mode: SplitterMode,
    nesting_pop: &str,
    proj_index: u32,
    tag: &BytesStart,
) -> Result<Projection> {
    let dst_attr = attr_opt(tag, "dst_population")?;
    let src_attr = attr_opt(tag, "src_population")?;
    let proj_population = match (dst_attr, src_attr) {
        (Some(dst), None) => dst,
        (None, Some(src)) => src,
        _ => {
            return Err(ParseError::Model(ModelError::invalid(
                "<Projection> must declare exactly one of dst_population/src_population",
            )))
        }
    };

    let (src_name, dst_name) = match mode {
        SplitterMode::ProjDefinedAtSrc => (nesting_pop.to_string(), proj_population.clone()),
        SplitterMode::ProjDefinedAtDst => (proj_population.clone(), nesting_pop.to_string()),
    };
    let src_size = sizes.require(&src_name)?;
    let dst_size = sizes.require(&dst_name)?;

    let mut projection = Projection::new(proj_population.clone(), proj_index);
    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Synapse" => {
                let synapse = parse_synapse(
                    reader,
                    buf,
                    line_index,
                    network_dir,
                    sizes,
                    &src_name,
                    &dst_name,
                    src_size,
                    dst_size,
                )?;
                projection.add_synapse(synapse);
            }
            Event::End(tag) if local_name_end(&tag) == "Projection" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Projection>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(projection)
}

/// Parse `<Synapse>…</Synapse>`, whose `Start` was just consumed.
#[allow(clippy::too_many_arguments)]
fn parse_synapse(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    sizes: &SizeTable,
    src_name: &str,
    dst_name: &str,
    src_size: u32,
    dst_size: u32,
) -> Result<Synapse> {
    let mut connection: Option<AbstractionConnection> = None;
    let mut weight_update: Option<WeightUpdate> = None;
    let mut post_synapse: Option<PostSynapse> = None;
    let component_name = format!("{src_name}->{dst_name}");

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Empty(tag) if is_connectivity_name(&local_name(&tag)) => {
                connection = Some(parse_empty_connectivity(&tag, Orientation::SrcOuter)?);
            }
            Event::Start(tag) if is_connectivity_name(&local_name(&tag)) => {
                connection = Some(parse_open_connectivity(
                    reader,
                    buf,
                    line_index,
                    network_dir,
                    &tag,
                    Orientation::SrcOuter,
                    src_size,
                    dst_size,
                    &component_name,
                )?);
            }
            Event::Start(tag) if local_name(&tag) == "WeightUpdate" => {
                let (name, url, isp, idp) = parse_component_ports(&tag)?;
                let mut wu = WeightUpdate::new(name, url, isp, idp);
                parse_weight_update_body(reader, buf, line_index, sizes, &mut wu)?;
                weight_update = Some(wu);
            }
            Event::Empty(tag) if local_name(&tag) == "WeightUpdate" => {
                let (name, url, isp, idp) = parse_component_ports(&tag)?;
                weight_update = Some(WeightUpdate::new(name, url, isp, idp));
            }
            Event::Start(tag) if local_name(&tag) == "PostSynapse" => {
                let (name, url, isp, idp, osp, odp) = parse_post_synapse_ports(&tag)?;
                let mut ps = PostSynapse::new(name, url, isp, idp, osp, odp);
                parse_post_synapse_body(reader, buf, line_index, network_dir, sizes, &mut ps, dst_name)?;
                post_synapse = Some(ps);
            }
            Event::Empty(tag) if local_name(&tag) == "PostSynapse" => {
                let (name, url, isp, idp, osp, odp) = parse_post_synapse_ports(&tag)?;
                post_synapse = Some(PostSynapse::new(name, url, isp, idp, osp, odp));
            }
            Event::End(tag) if local_name_end(&tag) == "Synapse" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Synapse>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    let connection = connection.ok_or_else(|| {
        ParseError::Model(ModelError::invalid(format!(
            "synapse '{component_name}' has no connectivity element"
        )))
    })?;
    let weight_update = weight_update.ok_or_else(|| {
        ParseError::Model(ModelError::invalid(format!(
            "synapse '{component_name}' has no WeightUpdate"
        )))
    })?;
    let post_synapse = post_synapse.ok_or_else(|| {
        ParseError::Model(ModelError::invalid(format!(
            "synapse '{component_name}' has no PostSynapse"
        )))
    })?;
    Ok(Synapse::new(connection, weight_update, post_synapse))
}

fn is_connectivity_name(name: &str) -> bool {
    matches!(
        name,
        "AllToAllConnection" | "OneToOneConnection" | "FixedProbabilityConnection" | "ConnectionList"
    )
}

fn parse_empty_connectivity(tag: &BytesStart, orientation: Orientation) -> Result<AbstractionConnection> {
    match local_name(tag).as_str() {
        "AllToAllConnection" => Ok(AbstractionConnection::AllToAll { delay: None }),
        "OneToOneConnection" => Ok(AbstractionConnection::OneToOne { delay: None }),
        "FixedProbabilityConnection" => Ok(AbstractionConnection::FixedProbability {
            probability: attr_f64(tag, "probability")?,
            seed: attr_u64_opt(tag, "seed")?,
            delay: None,
        }),
        "ConnectionList" => Ok(AbstractionConnection::connection_list(Vec::new(), orientation, None)),
        other => Err(ParseError::UnknownConnectivity {
            element: other.to_string(),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_open_connectivity(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    tag: &BytesStart,
    orientation: Orientation,
    max_src_size: u32,
    max_dst_size: u32,
    component_name: &str,
) -> Result<AbstractionConnection> {
    let name = local_name(tag);
    match name.as_str() {
        "AllToAllConnection" => Ok(AbstractionConnection::AllToAll {
            delay: parse_optional_delay(reader, buf, &name)?,
        }),
        "OneToOneConnection" => Ok(AbstractionConnection::OneToOne {
            delay: parse_optional_delay(reader, buf, &name)?,
        }),
        "FixedProbabilityConnection" => {
            let probability = attr_f64(tag, "probability")?;
            let seed = attr_u64_opt(tag, "seed")?;
            let delay = parse_optional_delay(reader, buf, &name)?;
            Ok(AbstractionConnection::FixedProbability {
                probability,
                seed,
                delay,
            })
        }
        "ConnectionList" => {
            let mut delay: Option<PropertyValue> = None;
            let mut connections: Vec<ConnectionInstance> = Vec::new();
            let mut seen: HashSet<(u32, u32)> = HashSet::new();
            let mut next_index: u32 = 0;
            let mut pending_binary: Option<(String, u32, bool)> = None;

            loop {
                let pos = reader.buffer_position();
                match reader
                    .read_event_into(buf)
                    .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
                {
                    Event::Empty(t) if local_name(&t) == "Connection" => {
                        let src = attr_u32(&t, "src_neuron")?;
                        let dst = attr_u32(&t, "dst_neuron")?;
                        let inst_delay = attr_f64_opt(&t, "delay")?;
                        push_connection(
                            &mut connections,
                            &mut seen,
                            &mut next_index,
                            src,
                            dst,
                            inst_delay,
                            max_src_size,
                            max_dst_size,
                            component_name,
                        )?;
                    }
                    Event::Empty(t) if local_name(&t) == "BinaryFile" => {
                        let file_name = attr(&t, "file_name")?;
                        let num_connections = attr_u32(&t, "num_connections")?;
                        let explicit_delay_flag = attr_u32(&t, "explicit_delay_flag")? != 0;
                        pending_binary = Some((file_name, num_connections, explicit_delay_flag));
                    }
                    Event::Start(t) if local_name(&t) == "Delay" => {
                        delay = Some(parse_wrapped_value(reader, buf)?);
                        consume_until_end(reader, buf, "Delay")?;
                    }
                    Event::End(t) if local_name_end(&t) == "ConnectionList" => break,
                    Event::Eof => {
                        return Err(ParseError::UnexpectedElement {
                            found: "EOF".into(),
                            expected: "</ConnectionList>".into(),
                        })
                    }
                    _ => {}
                }
                buf.clear();
            }

            if let Some((file_name, num_connections, explicit_delay_flag)) = pending_binary {
                let path = network_dir.join(&file_name);
                let raw = read_binary_connections(&path, num_connections, explicit_delay_flag)?;
                for inst in raw {
                    push_connection(
                        &mut connections,
                        &mut seen,
                        &mut next_index,
                        inst.src_neuron,
                        inst.dst_neuron,
                        inst.delay,
                        max_src_size,
                        max_dst_size,
                        component_name,
                    )?;
                }
            }

            Ok(AbstractionConnection::connection_list(connections, orientation, delay))
        }
        other => Err(ParseError::UnknownConnectivity {
            element: other.to_string(),
        }),
    }
}

fn parse_component_ports(tag: &BytesStart) -> Result<(String, String, String, String)> {
    let name = attr(tag, "name")?;
    let url = attr_opt(tag, "url")?.unwrap_or_default();
    let input_src_port = attr(tag, "input_src_port")?;
    let input_dst_port = attr(tag, "input_dst_port")?;
    Ok((name, url, input_src_port, input_dst_port))
}

#[allow(clippy::type_complexity)]
fn parse_post_synapse_ports(
    tag: &BytesStart,
) -> Result<(String, String, String, String, String, String)> {
    let name = attr(tag, "name")?;
    let url = attr_opt(tag, "url")?.unwrap_or_default();
    let input_src_port = attr(tag, "input_src_port")?;
    let input_dst_port = attr(tag, "input_dst_port")?;
    let output_src_port = attr(tag, "output_src_port")?;
    let output_dst_port = attr(tag, "output_dst_port")?;
    Ok((name, url, input_src_port, input_dst_port, output_src_port, output_dst_port))
}

/// Parse a `WeightUpdate` body (`<Property>*`; inputs are rejected — weight-
/// update components may not declare any).
fn parse_weight_update_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    sizes: &SizeTable,
    wu: &mut WeightUpdate,
) -> Result<()> {
    let size = sizes.require(&wu.name)?;
    let wu_name = wu.name.clone();
    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Property" => {
                let mut property = parse_property(reader, buf, &tag)?;
                finalize_property(&mut property, &wu_name, size);
                wu.properties.push(property);
            }
            Event::Start(tag) if local_name(&tag) == "Input" => {
                let _ = tag;
                return Err(ParseError::Model(ModelError::WeightUpdateHasInputs {
                    name: wu_name,
                }));
            }
            Event::Empty(tag) if local_name(&tag) == "Input" => {
                let _ = tag;
                return Err(ParseError::Model(ModelError::WeightUpdateHasInputs {
                    name: wu_name,
                }));
            }
            Event::End(tag) if local_name_end(&tag) == "WeightUpdate" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</WeightUpdate>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Parse a `PostSynapse` body (`<Property>*<Input>*`).
fn parse_post_synapse_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
    network_dir: &Path,
    sizes: &SizeTable,
    ps: &mut PostSynapse,
    dst_population: &str,
) -> Result<()> {
    let size = sizes.require(&ps.name)?;
    let ps_name = ps.name.clone();
    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Property" => {
                let mut property = parse_property(reader, buf, &tag)?;
                finalize_property(&mut property, &ps_name, size);
                ps.properties.push(property);
            }
            Event::Start(tag) if local_name(&tag) == "Input" => {
                if let Some(input) = parse_input(
                    reader,
                    buf,
                    line_index,
                    network_dir,
                    sizes,
                    &tag,
                    InputHost::PostSynapse { dst_population },
                    &ps_name,
                    size,
                )? {
                    ps.inputs.insert(input.src_key(), input);
                }
            }
            Event::End(tag) if local_name_end(&tag) == "PostSynapse" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</PostSynapse>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info_pass::run_info_pass;

    const NETWORK: &str = r#"
<SpineML>
  <Population>
    <Neuron name="A" size="4" url="neuron.xml"/>
  </Population>
  <Population>
    <Neuron name="B" size="4" url="neuron.xml">
      <Property name="tau"><FixedValue value="20"/></Property>
    </Neuron>
    <Projection dst_population="A">
      <Synapse>
        <ConnectionList>
          <Connection src_neuron="0" dst_neuron="0"/>
          <Connection src_neuron="1" dst_neuron="2"/>
        </ConnectionList>
        <WeightUpdate name="B_wu" url="wu.xml" input_src_port="spike" input_dst_port="in">
          <Property name="w"><ValueList><Value index="0" value="1.0"/><Value index="1" value="2.0"/></ValueList></Property>
        </WeightUpdate>
        <PostSynapse name="B_ps" url="ps.xml" input_src_port="in" input_dst_port="in2" output_src_port="out" output_dst_port="out2"/>
      </Synapse>
    </Projection>
  </Population>
</SpineML>
"#;

    fn parse(xml: &str) -> Vec<Population> {
        let info = run_info_pass(xml, 4).unwrap();
        run_full_pass(xml, &info, Path::new(".")).unwrap()
    }

    #[test]
    fn builds_populations_with_connection_list() {
        let pops = parse(NETWORK);
        assert_eq!(pops.len(), 2);
        let b = pops.iter().find(|p| p.name == "B").unwrap();
        let proj = b.projections.get("A").unwrap();
        let synapse = proj.synapses.get("B_wu").unwrap();
        match &synapse.connection {
            AbstractionConnection::ConnectionList { connections, .. } => {
                assert_eq!(connections.len(), 2);
            }
            other => panic!("expected ConnectionList, got {other:?}"),
        }
        assert_eq!(synapse.weight_update.properties.len(), 1);
    }

    #[test]
    fn out_of_bounds_connection_is_fatal() {
        let xml = NETWORK.replace(r#"dst_neuron="2""#, r#"dst_neuron="9""#);
        let info = run_info_pass(&xml, 4).unwrap();
        let err = run_full_pass(&xml, &info, Path::new(".")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::AtLine { source, .. } if matches!(*source, ParseError::Model(ModelError::IndexOutOfBounds { .. }))
        ));
    }

    #[test]
    fn duplicate_connection_is_fatal() {
        let xml = NETWORK.replace(r#"src_neuron="1" dst_neuron="2""#, r#"src_neuron="0" dst_neuron="0""#);
        let info = run_info_pass(&xml, 4).unwrap();
        let err = run_full_pass(&xml, &info, Path::new(".")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::AtLine { source, .. } if matches!(*source, ParseError::Model(ModelError::DuplicateConnection { .. }))
        ));
    }

    #[test]
    fn post_synapse_self_one_to_one_input_is_ignored() {
        let xml = r#"
<SpineML>
  <Population>
    <Neuron name="A" size="4" url="neuron.xml"/>
  </Population>
  <Population>
    <Neuron name="B" size="4" url="neuron.xml"/>
    <Projection dst_population="B">
      <Synapse>
        <AllToAllConnection/>
        <WeightUpdate name="A_wu" url="wu.xml" input_src_port="spike" input_dst_port="in"/>
        <PostSynapse name="A_ps" url="ps.xml" input_src_port="in" input_dst_port="in2" output_src_port="out" output_dst_port="out2">
          <Input src="B" src_port="spike" dst_port="in2">
            <OneToOneConnection/>
          </Input>
        </PostSynapse>
      </Synapse>
    </Projection>
  </Population>
</SpineML>
"#;
        let pops = parse(xml);
        let a = pops.iter().find(|p| p.name == "A").unwrap();
        let proj = a.projections.get("B").unwrap();
        let synapse = proj.synapses.get("A_wu").unwrap();
        assert!(synapse.post_synapse.inputs.is_empty());
    }
}
