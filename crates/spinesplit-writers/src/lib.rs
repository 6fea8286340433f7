//! Output sinks for a split SpineML Low-Level network: a generic XML
//! round-trip writer, a DAMSON-alias tabular/array emitter, and a DOT graph
//! writer.
//!
//! Every sub-entity a writer emits is looked up by the stable name scheme
//! `spinesplit-split` produces (`<parent>_sub<i>`, `<name>_sub<i>_<j>`); no
//! writer here imposes extra constraints on the splitter beyond that.

pub mod damson_writer;
pub mod dot_writer;
pub mod error;
pub mod sanitize;
pub mod xml_writer;

pub use damson_writer::DamsonWriter;
pub use dot_writer::DotWriter;
pub use error::{Result, WriteError};
pub use xml_writer::XmlWriter;

use spinesplit_model::SplitterMode;

/// Options shared across writers, resolved from CLI flags / config.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// The build-time sub-population cap, needed to size DAMSON arrays.
    pub cap: u32,
    /// The network's resolved projection-direction mode.
    pub mode: SplitterMode,
    /// Disable pretty-indentation in the XML writer (`--no-xml-formatting`).
    pub no_xml_formatting: bool,
}

/// A streaming sink for a network's sub-populations, written one top-level
/// `Population`'s worth of sub-populations at a time, in file order.
///
/// Mirrors the driver's data flow: `begin` opens the document,
/// `write_population` is called once per top-level `Population` (already
/// split into its sub-populations by the caller), and `finish` closes it.
pub trait NetworkWriter {
    /// Open the output sink and write any leading boilerplate (root element,
    /// header block, graph preamble). Called exactly once, before any
    /// `write_population` call.
    fn begin(&mut self) -> Result<()>;

    /// Emit one top-level population's sub-populations, in ascending
    /// sub-index order.
    ///
    /// `unsplit` is the original, pre-split `Population` the caller invoked
    /// the splitter on. Its own synapses/inputs carry the final
    /// `sub_syn_max`/`sub_inp_max` counters once `split` has returned (each
    /// is only ever written to while splitting `unsplit`'s own sub-entities,
    /// so the value is complete by the time the writer sees it) — the
    /// DAMSON-alias writer uses these to size arrays uniformly across
    /// shards; the XML and DOT writers ignore it.
    fn write_population(
        &mut self,
        unsplit: &spinesplit_model::Population,
        sub_populations: &[spinesplit_model::Population],
    ) -> Result<()>;

    /// Flush and close the output sink.
    fn finish(&mut self) -> Result<()>;
}
