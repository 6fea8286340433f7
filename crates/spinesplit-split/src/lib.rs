//! **Core.** Partitions a [`spinesplit_model::Population`] into bounded-size
//! sub-populations, rewriting every projection, synapse, input, property and
//! delay under a per-connectivity-type re-indexing scheme.
//!
//! The splitter never mutates its input: [`SplitContext`] borrows the
//! population being split plus the sizes of every peer it projects to or
//! receives inputs from, and [`split`] returns freshly constructed
//! sub-populations. Maxima the DAMSON writer needs later
//! (`Synapse::sub_syn_max`, `Input::sub_inp_max`) are recorded on the
//! *unsplit* parent via atomic max-updates as a side effect.

pub mod context;
pub mod delay;
pub mod error;
pub mod input_split;
pub mod naming;
pub mod projection_split;
pub mod property_split;
pub mod splitter;

pub use context::SplitContext;
pub use error::{Result, SplitError};
pub use splitter::split;
