//! Small attribute-decoding helpers shared by the InfoPass, FullPass, and
//! experiment reader.

use quick_xml::events::{BytesEnd, BytesStart};

use crate::error::{ParseError, Result};

/// The element's local name (namespace prefix, e.g. `LL:`, stripped) as a
/// plain `String`.
pub fn local_name(tag: &BytesStart) -> String {
    let qname = tag.name();
    let local = qname.local_name();
    String::from_utf8_lossy(local.as_ref()).into_owned()
}

/// The local name of a closing tag, stripped of any namespace prefix.
pub fn local_name_end(tag: &BytesEnd) -> String {
    let qname = tag.name();
    let local = qname.local_name();
    String::from_utf8_lossy(local.as_ref()).into_owned()
}

/// Consume events until (and including) the `End` matching the element whose
/// `Start` was just consumed by the caller, ignoring everything in between.
/// Used by the InfoPass to skip `<Property>`/`<Delay>` subtrees it doesn't
/// need to interpret.
pub fn skip_element(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> Result<()> {
    use quick_xml::events::Event;
    let mut depth: u32 = 0;
    loop {
        match reader.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(ParseError::UnexpectedElement {
                    found: "EOF".into(),
                    expected: "matching closing tag".into(),
                })
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Fetch a required attribute's unescaped string value.
pub fn attr(tag: &BytesStart, name: &str) -> Result<String> {
    for attribute in tag.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == name.as_bytes() {
            return Ok(attribute.unescape_value()?.into_owned());
        }
    }
    Err(ParseError::missing_attribute(local_name(tag), name))
}

/// Fetch an optional attribute's unescaped string value.
pub fn attr_opt(tag: &BytesStart, name: &str) -> Result<Option<String>> {
    for attribute in tag.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == name.as_bytes() {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Fetch and parse a required `u32` attribute.
pub fn attr_u32(tag: &BytesStart, name: &str) -> Result<u32> {
    let raw = attr(tag, name)?;
    raw.parse::<u32>()
        .map_err(|_| ParseError::missing_attribute(local_name(tag), name))
}

/// Fetch and parse a required `f64` attribute.
pub fn attr_f64(tag: &BytesStart, name: &str) -> Result<f64> {
    let raw = attr(tag, name)?;
    raw.parse::<f64>()
        .map_err(|_| ParseError::missing_attribute(local_name(tag), name))
}

/// Fetch and parse an optional `u64` attribute (used for distribution seeds).
pub fn attr_u64_opt(tag: &BytesStart, name: &str) -> Result<Option<u64>> {
    match attr_opt(tag, name)? {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ParseError::missing_attribute(local_name(tag), name)),
        None => Ok(None),
    }
}

/// Fetch and parse an optional `f64` attribute.
pub fn attr_f64_opt(tag: &BytesStart, name: &str) -> Result<Option<f64>> {
    match attr_opt(tag, name)? {
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ParseError::missing_attribute(local_name(tag), name)),
        None => Ok(None),
    }
}
