//! Two-pass SpineML Low-Level XML reader.
//!
//! [`info_pass::run_info_pass`] walks the network document once to register
//! names, sizes, the projection-direction [`spinesplit_model::SplitterMode`],
//! and the src→port multimap. [`full_pass::run_full_pass`] rewinds and builds
//! the full in-memory model, materializing connection instances from inline
//! `<Connection>` elements or a referenced `<BinaryFile>` stream.
//! [`experiment::run_experiment_pass`] reads the (much smaller) experiment
//! document in a single pass.

pub mod binary;
pub mod error;
pub mod experiment;
pub mod full_pass;
pub mod info_pass;
pub mod line_index;
pub mod value;
pub mod xml_util;

pub use error::{ParseError, Result};
pub use experiment::run_experiment_pass;
pub use full_pass::run_full_pass;
pub use info_pass::{run_info_pass, InfoPassOutput};
pub use line_index::LineIndex;
