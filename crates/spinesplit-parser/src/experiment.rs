//! Single-pass reader for the experiment document: `<Model
//! network_layer_url=…/>`, `<Simulation duration=…><EulerIntegration
//! dt=…/></Simulation>`, and zero or more `<LogOutput>` requests.
//!
//! The experiment file carries no connection data of its own, so unlike the
//! network file it needs only one pass — the rewind/two-pass machinery
//! (InfoPass then FullPass) is for the *network* file only.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{instrument, warn};

use spinesplit_model::experiment::parse_indices;
use spinesplit_model::{EulerIntegration, Experiment, LogOutput};

use crate::error::{ParseError, Result};
use crate::line_index::LineIndex;
use crate::xml_util::{attr, attr_f64_opt, attr_opt, local_name, local_name_end, skip_element};

/// Parse an experiment document into an [`Experiment`].
///
/// A second `<Experiment>` element anywhere in the document is a non-fatal
/// warning ("additional `<Experiment>` elements found (ignored)"); only the
/// first is consumed.
#[instrument(skip(xml))]
pub fn run_experiment_pass(xml: &str) -> Result<Experiment> {
    let line_index = LineIndex::build(xml);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut experiment: Option<Experiment> = None;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Start(tag) if local_name(&tag) == "Experiment" => {
                if experiment.is_some() {
                    warn!("additional <Experiment> element found at line {}, ignored", line_index.line_at(pos));
                    skip_element(&mut reader, &mut buf)
                        .map_err(|e| wrap_at(e, &reader, &line_index))?;
                } else {
                    let parsed = parse_experiment_body(&mut reader, &mut buf, &line_index)
                        .map_err(|e| wrap_at(e, &reader, &line_index))?;
                    experiment = Some(parsed);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    experiment.ok_or_else(|| ParseError::UnexpectedElement {
        found: "EOF".into(),
        expected: "<Experiment>".into(),
    })
}

fn wrap_at(err: ParseError, reader: &Reader<&[u8]>, line_index: &LineIndex) -> ParseError {
    if err.line().is_some() {
        err
    } else {
        err.at_line(line_index.line_at(reader.buffer_position()))
    }
}

/// Parse `<Experiment>…</Experiment>`, whose `Start` was just consumed.
fn parse_experiment_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    line_index: &LineIndex,
) -> Result<Experiment> {
    let mut network_layer_url: Option<String> = None;
    let mut duration: Option<f64> = None;
    let mut dt: Option<f64> = None;
    let mut log_outputs = Vec::new();

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(buf)
            .map_err(|e| ParseError::from(e).at_line(line_index.line_at(pos)))?
        {
            Event::Empty(tag) | Event::Start(tag) if local_name(&tag) == "Model" => {
                network_layer_url = Some(attr(&tag, "network_layer_url")?);
            }
            Event::Start(tag) if local_name(&tag) == "Simulation" => {
                duration = Some(attr(&tag, "duration")?.parse().map_err(|_| {
                    ParseError::missing_attribute("Simulation", "duration")
                })?);
                dt = Some(parse_simulation_body(reader, buf)?);
            }
            Event::Empty(tag) if local_name(&tag) == "LogOutput" => {
                log_outputs.push(parse_log_output(&tag)?);
            }
            Event::Start(tag) if local_name(&tag) == "LogOutput" => {
                log_outputs.push(parse_log_output(&tag)?);
                skip_element(reader, buf)?;
            }
            Event::End(tag) if local_name_end(&tag) == "Experiment" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Experiment>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    let network_layer_url = network_layer_url.ok_or_else(|| {
        ParseError::missing_attribute("Model", "network_layer_url")
    })?;
    let duration = duration.ok_or_else(|| ParseError::missing_attribute("Simulation", "duration"))?;
    let dt = dt.ok_or_else(|| ParseError::missing_attribute("EulerIntegration", "dt"))?;

    let mut experiment = Experiment::new(duration, EulerIntegration { dt }, network_layer_url);
    for log_output in log_outputs {
        experiment.add_log_output(log_output);
    }
    Ok(experiment)
}

/// Parse `<Simulation>…</Simulation>`'s body, which must contain exactly one
/// `<EulerIntegration dt=…/>` child; no other integration scheme is accepted.
fn parse_simulation_body(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<f64> {
    loop {
        match reader.read_event_into(buf)? {
            Event::Empty(tag) if local_name(&tag) == "EulerIntegration" => {
                let dt = attr(&tag, "dt")?
                    .parse()
                    .map_err(|_| ParseError::missing_attribute("EulerIntegration", "dt"))?;
                consume_until_end(reader, buf, "Simulation")?;
                return Ok(dt);
            }
            Event::Start(tag) if local_name(&tag) == "EulerIntegration" => {
                let dt = attr(&tag, "dt")?
                    .parse()
                    .map_err(|_| ParseError::missing_attribute("EulerIntegration", "dt"))?;
                skip_element(reader, buf)?;
                consume_until_end(reader, buf, "Simulation")?;
                return Ok(dt);
            }
            Event::Start(tag) => {
                return Err(ParseError::UnexpectedElement {
                    found: local_name(&tag),
                    expected: "EulerIntegration".into(),
                })
            }
            Event::End(tag) if local_name_end(&tag) == "Simulation" => {
                return Err(ParseError::missing_attribute("Simulation", "EulerIntegration"))
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</Simulation>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
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

fn parse_log_output(tag: &quick_xml::events::BytesStart) -> Result<LogOutput> {
    let name = attr(tag, "name")?;
    let target = attr(tag, "target")?;
    let port = attr(tag, "port")?;
    let start_time = attr_f64_opt(tag, "start_time")?;
    let end_time = attr_f64_opt(tag, "end_time")?;
    let indices = match attr_opt(tag, "indices")? {
        Some(raw) => Some(parse_indices(&raw).map_err(|_| {
            ParseError::missing_attribute("LogOutput", "indices")
        })?),
        None => None,
    };
    Ok(LogOutput {
        name,
        target,
        port,
        start_time,
        end_time,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPERIMENT_XML: &str = r#"
<SpineML>
  <Experiment>
    <Model network_layer_url="network.xml"/>
    <Simulation duration="1000">
      <EulerIntegration dt="0.1"/>
    </Simulation>
    <LogOutput name="log1" target="PopA" port="spike" indices="0,1,2"/>
  </Experiment>
</SpineML>
"#;

    #[test]
    fn parses_model_simulation_and_log_output() {
        let experiment = run_experiment_pass(EXPERIMENT_XML).unwrap();
        assert_eq!(experiment.network_layer_url, "network.xml");
        assert_eq!(experiment.duration, 1000.0);
        assert_eq!(experiment.time_step.dt, 0.1);
        let logs = experiment.log_outputs.get("PopA").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].indices, Some(vec![0, 1, 2]));
    }

    #[test]
    fn rejects_non_euler_integration() {
        let xml = r#"
<SpineML>
  <Experiment>
    <Model network_layer_url="network.xml"/>
    <Simulation duration="1000">
      <RungeKuttaIntegration dt="0.1"/>
    </Simulation>
  </Experiment>
</SpineML>
"#;
        assert!(run_experiment_pass(xml).is_err());
    }

    #[test]
    fn additional_experiment_elements_are_ignored_not_fatal() {
        let xml = r#"
<SpineML>
  <Experiment>
    <Model network_layer_url="network.xml"/>
    <Simulation duration="1000"><EulerIntegration dt="0.1"/></Simulation>
  </Experiment>
  <Experiment>
    <Model network_layer_url="other.xml"/>
    <Simulation duration="2000"><EulerIntegration dt="0.2"/></Simulation>
  </Experiment>
</SpineML>
"#;
        let experiment = run_experiment_pass(xml).unwrap();
        assert_eq!(experiment.network_layer_url, "network.xml");
    }
}
