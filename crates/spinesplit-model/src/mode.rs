//! `SplitterMode`: whether projections in this network file are declared on
//! the source side or the destination side.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{ModelError, Result};

/// Whether `<Projection>` elements in this network file carry
/// `dst_population` (declared at the source population) or `src_population`
/// (declared at the destination population). A single network file may use
/// only one; mixing the two within a single network file is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterMode {
    /// `<Projection dst_population=…>`, nested under the source population.
    ProjDefinedAtSrc,
    /// `<Projection src_population=…>`, nested under the destination population.
    ProjDefinedAtDst,
}

const UNSET: u8 = 0;
const AT_SRC: u8 = 1;
const AT_DST: u8 = 2;

/// A write-once cell for [`SplitterMode`], set on the first `<Projection>`
/// seen during the InfoPass and checked against on every subsequent one.
#[derive(Debug)]
pub struct SplitterModeCell(AtomicU8);

impl SplitterModeCell {
    /// Construct an unset cell.
    pub fn new() -> Self {
        SplitterModeCell(AtomicU8::new(UNSET))
    }

    /// Set the mode on first use, or verify it matches on subsequent calls.
    /// Mixing modes within one file is a fatal error.
    pub fn set_or_check(&self, mode: SplitterMode) -> Result<()> {
        let encoded = match mode {
            SplitterMode::ProjDefinedAtSrc => AT_SRC,
            SplitterMode::ProjDefinedAtDst => AT_DST,
        };
        match self
            .0
            .compare_exchange(UNSET, encoded, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(existing) if existing == encoded => Ok(()),
            Err(_) => Err(ModelError::invalid(
                "src- and dst-defined projections mixed within one network file",
            )),
        }
    }

    /// The resolved mode, if any projection has been seen yet.
    pub fn get(&self) -> Option<SplitterMode> {
        match self.0.load(Ordering::Acquire) {
            AT_SRC => Some(SplitterMode::ProjDefinedAtSrc),
            AT_DST => Some(SplitterMode::ProjDefinedAtDst),
            _ => None,
        }
    }
}

impl Default for SplitterModeCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_wins_consistent_reads_succeed() {
        let cell = SplitterModeCell::new();
        cell.set_or_check(SplitterMode::ProjDefinedAtSrc).unwrap();
        cell.set_or_check(SplitterMode::ProjDefinedAtSrc).unwrap();
        assert_eq!(cell.get(), Some(SplitterMode::ProjDefinedAtSrc));
    }

    #[test]
    fn mixing_modes_is_fatal() {
        let cell = SplitterModeCell::new();
        cell.set_or_check(SplitterMode::ProjDefinedAtSrc).unwrap();
        assert!(cell.set_or_check(SplitterMode::ProjDefinedAtDst).is_err());
    }
}
