//! Filter descriptions and chains fed to the codec engine.

mod chain;
mod delta;
mod lzma;

pub use chain::{FilterChain, MAX_FILTERS};
pub(crate) use chain::RawChain;
pub use delta::{DeltaOptions, DELTA_DIST_MAX, DELTA_DIST_MIN};
pub use lzma::{
    LzmaOptions, LzmaOverrides, MatchFinder, Mode, Preset, DICT_SIZE_DEFAULT, DICT_SIZE_MAX,
    DICT_SIZE_MIN, LCLP_MAX, LCLP_MIN, NICE_LEN_MAX, NICE_LEN_MIN, PB_MAX, PB_MIN,
    PRESET_DEFAULT_LEVEL, PRESET_EXTREME, PRESET_LEVEL_MASK,
};

use crate::error::{Error, Result};

/// Identifier of a filter kind, with liblzma's stable numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum FilterKind {
    /// Legacy LZMA1 filter, only usable in raw and `.lzma` containers.
    Lzma1 = 0x4000_0000_0000_0001,
    /// LZMA2 filter, the only compression filter `.xz` accepts last.
    Lzma2 = 0x21,
    /// Byte-wise delta filter, usable in front of a compression filter.
    Delta = 0x03,
}

impl FilterKind {
    /// Map a raw filter id onto a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] carrying the id when it is not one
    /// of the kinds this crate models.
    pub fn from_raw(id: u64) -> Result<FilterKind> {
        match id {
            x if x == FilterKind::Lzma1 as u64 => Ok(FilterKind::Lzma1),
            x if x == FilterKind::Lzma2 as u64 => Ok(FilterKind::Lzma2),
            x if x == FilterKind::Delta as u64 => Ok(FilterKind::Delta),
            other => Err(Error::InvalidFilter { id: other }),
        }
    }

    /// The raw liblzma filter id.
    pub fn to_raw(self) -> u64 {
        self as u64
    }
}

/// One configured filter, ready to take part in a chain.
#[derive(Debug, Clone)]
pub enum Filter {
    /// LZMA1 with resolved options.
    Lzma1(LzmaOptions),
    /// LZMA2 with resolved options.
    Lzma2(LzmaOptions),
    /// Delta with the given options.
    Delta(DeltaOptions),
}

impl Filter {
    /// LZMA1 filter from a preset plus overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionsError`] when the preset cannot be resolved.
    pub fn lzma1(preset: Preset, overrides: &LzmaOverrides) -> Result<Filter> {
        Ok(Filter::Lzma1(LzmaOptions::resolve(preset, overrides)?))
    }

    /// LZMA2 filter from a preset plus overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionsError`] when the preset cannot be resolved.
    pub fn lzma2(preset: Preset, overrides: &LzmaOverrides) -> Result<Filter> {
        Ok(Filter::Lzma2(LzmaOptions::resolve(preset, overrides)?))
    }

    /// Delta filter with the given byte distance.
    pub fn delta(distance: u32) -> Filter {
        Filter::Delta(DeltaOptions::new(distance))
    }

    /// The kind of this filter.
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Lzma1(_) => FilterKind::Lzma1,
            Filter::Lzma2(_) => FilterKind::Lzma2,
            Filter::Delta(_) => FilterKind::Delta,
        }
    }
}
