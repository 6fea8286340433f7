//! Delay cloning.
//!
//! Every sub-connection the splitter produces carries a verbatim copy of its
//! parent's `Delay`: [`spinesplit_model::clone_delay`] already implements the
//! deep-copy rule, so this module is a thin, locally-named re-export used
//! everywhere the splitter clones a connection's delay.

pub use spinesplit_model::clone_delay;
