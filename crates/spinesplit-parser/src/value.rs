//! Shared parsing for `<Property>`/`<Delay>` value bodies: `FixedValue`,
//! `ValueList`, `UniformDistribution`, `NormalDistribution`,
//! `PoissonDistribution`.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use spinesplit_model::PropertyValue;

use crate::error::{ParseError, Result};
use crate::xml_util::{attr_f64, attr_u32, attr_u64_opt, local_name, local_name_end};

/// Parse a self-closed value element (`FixedValue`, the three distributions,
/// or an empty `ValueList`).
pub fn parse_value_empty(tag: &BytesStart) -> Result<PropertyValue> {
    match local_name(tag).as_str() {
        "FixedValue" => Ok(PropertyValue::Fixed {
            value: attr_f64(tag, "value")?,
        }),
        "UniformDistribution" => Ok(PropertyValue::Uniform {
            seed: attr_u64_opt(tag, "seed")?,
            min: attr_f64(tag, "minimum")?,
            max: attr_f64(tag, "maximum")?,
        }),
        "NormalDistribution" => Ok(PropertyValue::Normal {
            seed: attr_u64_opt(tag, "seed")?,
            mean: attr_f64(tag, "mean")?,
            variance: attr_f64(tag, "variance")?,
        }),
        "PoissonDistribution" => Ok(PropertyValue::Poisson {
            seed: attr_u64_opt(tag, "seed")?,
            mean: attr_f64(tag, "mean")?,
        }),
        "ValueList" => Ok(PropertyValue::ValueList {
            entries: BTreeMap::new(),
        }),
        other => Err(ParseError::UnexpectedElement {
            found: other.to_string(),
            expected: "FixedValue|ValueList|UniformDistribution|NormalDistribution|PoissonDistribution".into(),
        }),
    }
}

/// Parse a `ValueList` whose `Start` tag has already been consumed, reading
/// nested `<Value index=… value=…/>` entries until the matching `</ValueList>`.
///
/// A repeated index is a non-fatal warning: the first value written wins, a
/// second identical value is noted, a second differing value is noted and
/// dropped.
pub fn parse_value_list_body(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<PropertyValue> {
    let mut entries = BTreeMap::new();
    loop {
        match reader.read_event_into(buf)? {
            Event::Empty(e) if local_name(&e) == "Value" => {
                let index = attr_u32(&e, "index")?;
                let value = attr_f64(&e, "value")?;
                match entries.get(&index) {
                    Some(&existing) if existing == value => {
                        warn!("duplicate ValueList entry at index {index} with identical value {value}, ignored");
                    }
                    Some(&existing) => {
                        warn!(
                            "duplicate ValueList entry at index {index}: keeping {existing}, ignoring {value}"
                        );
                    }
                    None => {
                        entries.insert(index, value);
                    }
                }
            }
            Event::End(e) if local_name_end(&e) == "ValueList" => break,
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "</ValueList>".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(PropertyValue::ValueList { entries })
}

/// Read the single value child of a `<Property>` or `<Delay>` wrapper whose
/// `Start` tag has already been consumed, returning the decoded
/// [`PropertyValue`]. Leaves the reader positioned so the next event is the
/// wrapper's own closing tag.
pub fn parse_wrapped_value(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<PropertyValue> {
    loop {
        match reader.read_event_into(buf)? {
            Event::Empty(e) => return parse_value_empty(&e),
            Event::Start(e) if local_name(&e) == "ValueList" => {
                return parse_value_list_body(reader, buf)
            }
            Event::Start(e) => {
                return Err(ParseError::UnexpectedElement {
                    found: local_name(&e),
                    expected: "FixedValue|ValueList|UniformDistribution|NormalDistribution|PoissonDistribution".into(),
                })
            }
            Event::Text(_) | Event::Comment(_) => {}
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "a property/delay value element".into(),
                })
            }
            other => {
                return Err(ParseError::UnexpectedElement {
                    found: format!("{other:?}"),
                    expected: "a property/delay value element".into(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(xml: &str) -> Result<PropertyValue> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        // Consume the wrapper's own Start tag first.
        match reader.read_event_into(&mut buf).unwrap() {
            Event::Start(_) => {}
            other => panic!("expected wrapper start, got {other:?}"),
        }
        buf.clear();
        parse_wrapped_value(&mut reader, &mut buf)
    }

    #[test]
    fn fixed_value() {
        let value = run("<Property name=\"tau\"><FixedValue value=\"20\"/></Property>").unwrap();
        assert_eq!(value, PropertyValue::Fixed { value: 20.0 });
    }

    #[test]
    fn value_list_entries() {
        let value = run(
            "<Property name=\"w\"><ValueList><Value index=\"0\" value=\"1\"/><Value index=\"2\" value=\"3\"/></ValueList></Property>",
        )
        .unwrap();
        match value {
            PropertyValue::ValueList { entries } => {
                assert_eq!(entries.get(&0), Some(&1.0));
                assert_eq!(entries.get(&2), Some(&3.0));
            }
            _ => panic!("expected ValueList"),
        }
    }

    #[test]
    fn uniform_distribution() {
        let value = run(
            "<Delay><UniformDistribution seed=\"7\" minimum=\"1\" maximum=\"5\"/></Delay>",
        )
        .unwrap();
        assert_eq!(
            value,
            PropertyValue::Uniform {
                seed: Some(7),
                min: 1.0,
                max: 5.0
            }
        );
    }
}
