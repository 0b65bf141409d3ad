//! LZMA1/LZMA2 compression options and preset resolution.

use std::mem;

use crate::error::{Error, Result};
use crate::ffi;

/// Raw preset bit reserved for the extreme variant.
pub const PRESET_EXTREME: u32 = 1 << 31;

/// Mask covering the compression level bits of a raw preset.
pub const PRESET_LEVEL_MASK: u32 = 0x1f;

/// Default compression level.
pub const PRESET_DEFAULT_LEVEL: u32 = 6;

/// Smallest dictionary size liblzma accepts, in bytes.
pub const DICT_SIZE_MIN: u32 = 4096;

/// Dictionary size used by the default preset, in bytes.
pub const DICT_SIZE_DEFAULT: u32 = 1 << 23;

/// Largest dictionary size liblzma accepts, 1.5 GiB.
pub const DICT_SIZE_MAX: u32 = 1536 << 20;

/// Smallest value of `lc`, `lp` and of their sum.
pub const LCLP_MIN: u32 = 0;

/// Largest value of `lc + lp`.
pub const LCLP_MAX: u32 = 4;

/// Smallest number of position bits.
pub const PB_MIN: u32 = 0;

/// Largest number of position bits.
pub const PB_MAX: u32 = 4;

/// Smallest accepted nice length of a match.
pub const NICE_LEN_MIN: u32 = 2;

/// Largest accepted nice length of a match, the format's match length cap.
pub const NICE_LEN_MAX: u32 = 273;

/// Compression preset: a level in `0..=9` plus an optional extreme flag.
///
/// A preset is only a seed. [`LzmaOptions::resolve`] expands it into the
/// full option set, after which individual fields can be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    level: u32,
    extreme: bool,
}

impl Preset {
    /// Build a preset from a level in `0..=9`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadPreset`] when the level is out of range.
    pub fn new(level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::BadPreset { bits: level });
        }
        Ok(Preset {
            level,
            extreme: false,
        })
    }

    /// Mark this preset as extreme, trading speed for ratio.
    pub fn extreme(mut self) -> Self {
        self.extreme = true;
        self
    }

    /// Parse a raw preset value as liblzma encodes it: level bits plus the
    /// extreme flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadPreset`] carrying the offending flag bits when
    /// any bit outside the level mask and the extreme flag is set, or the
    /// raw level when it exceeds 9.
    pub fn from_raw(raw: u32) -> Result<Self> {
        let stray = raw & !PRESET_LEVEL_MASK & !PRESET_EXTREME;
        if stray != 0 {
            return Err(Error::BadPreset { bits: stray });
        }
        let level = raw & PRESET_LEVEL_MASK;
        if level > 9 {
            return Err(Error::BadPreset { bits: level });
        }
        Ok(Preset {
            level,
            extreme: raw & PRESET_EXTREME != 0,
        })
    }

    /// Encode this preset back into liblzma's raw form.
    pub fn to_raw(self) -> u32 {
        let mut raw = self.level;
        if self.extreme {
            raw |= PRESET_EXTREME;
        }
        raw
    }

    /// The compression level, `0..=9`.
    pub fn level(self) -> u32 {
        self.level
    }

    /// Whether the extreme flag is set.
    pub fn is_extreme(self) -> bool {
        self.extreme
    }
}

impl Default for Preset {
    fn default() -> Self {
        Preset {
            level: PRESET_DEFAULT_LEVEL,
            extreme: false,
        }
    }
}

/// Compression mode of the LZMA match encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Favour speed over ratio.
    Fast,
    /// Favour ratio over speed.
    Normal,
}

impl Mode {
    pub(crate) fn from_raw(raw: u32) -> Option<Mode> {
        match raw {
            x if x == liblzma_sys::LZMA_MODE_FAST as u32 => Some(Mode::Fast),
            x if x == liblzma_sys::LZMA_MODE_NORMAL as u32 => Some(Mode::Normal),
            _ => None,
        }
    }
}

impl From<Mode> for liblzma_sys::lzma_mode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Fast => liblzma_sys::LZMA_MODE_FAST,
            Mode::Normal => liblzma_sys::LZMA_MODE_NORMAL,
        }
    }
}

/// Match finder algorithm used during encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFinder {
    /// Hash chain with 2- and 3-byte hashing.
    Hc3,
    /// Hash chain with 2-, 3- and 4-byte hashing.
    Hc4,
    /// Binary tree with 2-byte hashing.
    Bt2,
    /// Binary tree with 2- and 3-byte hashing.
    Bt3,
    /// Binary tree with 2-, 3- and 4-byte hashing.
    Bt4,
}

impl MatchFinder {
    pub(crate) fn from_raw(raw: u32) -> Option<MatchFinder> {
        match raw {
            x if x == liblzma_sys::LZMA_MF_HC3 as u32 => Some(MatchFinder::Hc3),
            x if x == liblzma_sys::LZMA_MF_HC4 as u32 => Some(MatchFinder::Hc4),
            x if x == liblzma_sys::LZMA_MF_BT2 as u32 => Some(MatchFinder::Bt2),
            x if x == liblzma_sys::LZMA_MF_BT3 as u32 => Some(MatchFinder::Bt3),
            x if x == liblzma_sys::LZMA_MF_BT4 as u32 => Some(MatchFinder::Bt4),
            _ => None,
        }
    }
}

impl From<MatchFinder> for liblzma_sys::lzma_match_finder {
    fn from(mf: MatchFinder) -> Self {
        match mf {
            MatchFinder::Hc3 => liblzma_sys::LZMA_MF_HC3,
            MatchFinder::Hc4 => liblzma_sys::LZMA_MF_HC4,
            MatchFinder::Bt2 => liblzma_sys::LZMA_MF_BT2,
            MatchFinder::Bt3 => liblzma_sys::LZMA_MF_BT3,
            MatchFinder::Bt4 => liblzma_sys::LZMA_MF_BT4,
        }
    }
}

/// Per-field overrides applied on top of a resolved preset.
///
/// `None` fields keep the preset's value. liblzma validates the combined
/// result when the engine is constructed, not here.
#[derive(Debug, Clone, Default)]
pub struct LzmaOverrides {
    /// Dictionary size in bytes.
    pub dict_size: Option<u32>,
    /// Preset dictionary contents; the options keep an owned copy.
    pub preset_dict: Option<Vec<u8>>,
    /// Number of literal context bits.
    pub lc: Option<u32>,
    /// Number of literal position bits.
    pub lp: Option<u32>,
    /// Number of position bits.
    pub pb: Option<u32>,
    /// Compression mode.
    pub mode: Option<Mode>,
    /// Nice length of a match.
    pub nice_len: Option<u32>,
    /// Match finder algorithm.
    pub match_finder: Option<MatchFinder>,
    /// Match finder search depth; 0 lets liblzma choose.
    pub depth: Option<u32>,
}

/// Fully resolved LZMA1/LZMA2 options.
///
/// Obtained by [`LzmaOptions::resolve`], never constructed field by field,
/// so every instance started from a liblzma preset.
#[derive(Debug, Clone)]
pub struct LzmaOptions {
    pub dict_size: u32,
    pub preset_dict: Option<Vec<u8>>,
    pub lc: u32,
    pub lp: u32,
    pub pb: u32,
    pub mode: Mode,
    pub nice_len: u32,
    pub match_finder: MatchFinder,
    pub depth: u32,
}

impl LzmaOptions {
    /// Expand a preset into the full option set, then apply overrides.
    ///
    /// Overridden values are forwarded verbatim; liblzma performs the final
    /// consistency validation when a coder is initialised over the chain,
    /// reporting [`Error::OptionsError`] there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionsError`] when liblzma rejects the preset
    /// value itself.
    pub fn resolve(preset: Preset, overrides: &LzmaOverrides) -> Result<Self> {
        // SAFETY: lzma_options_lzma is a plain C struct; all-zero is a
        // valid starting state for lzma_lzma_preset to fill in.
        let mut raw: liblzma_sys::lzma_options_lzma = unsafe { mem::zeroed() };
        ffi::lzma_preset(&mut raw, preset.to_raw())?;

        let mut options = LzmaOptions {
            dict_size: raw.dict_size,
            preset_dict: None,
            lc: raw.lc,
            lp: raw.lp,
            pb: raw.pb,
            mode: Mode::from_raw(raw.mode as u32).unwrap_or(Mode::Normal),
            nice_len: raw.nice_len,
            match_finder: MatchFinder::from_raw(raw.mf as u32).unwrap_or(MatchFinder::Bt4),
            depth: raw.depth,
        };

        if let Some(dict_size) = overrides.dict_size {
            options.dict_size = dict_size;
        }
        if let Some(dict) = &overrides.preset_dict {
            options.preset_dict = Some(dict.clone());
        }
        if let Some(lc) = overrides.lc {
            options.lc = lc;
        }
        if let Some(lp) = overrides.lp {
            options.lp = lp;
        }
        if let Some(pb) = overrides.pb {
            options.pb = pb;
        }
        if let Some(mode) = overrides.mode {
            options.mode = mode;
        }
        if let Some(nice_len) = overrides.nice_len {
            options.nice_len = nice_len;
        }
        if let Some(mf) = overrides.match_finder {
            options.match_finder = mf;
        }
        if let Some(depth) = overrides.depth {
            options.depth = depth;
        }

        Ok(options)
    }

    /// Lower these options into the raw struct liblzma consumes.
    ///
    /// The returned box pairs with the preset dictionary copy kept by
    /// [`crate::filter::RawChain`]; the raw struct borrows that copy.
    pub(crate) fn to_raw(
        &self,
    ) -> (Box<liblzma_sys::lzma_options_lzma>, Option<Box<[u8]>>) {
        // SAFETY: as in resolve, all-zero is a valid base state.
        let mut raw: liblzma_sys::lzma_options_lzma = unsafe { mem::zeroed() };
        raw.dict_size = self.dict_size;
        raw.lc = self.lc;
        raw.lp = self.lp;
        raw.pb = self.pb;
        raw.mode = self.mode.into();
        raw.nice_len = self.nice_len;
        raw.mf = self.match_finder.into();
        raw.depth = self.depth;

        let dict = self
            .preset_dict
            .as_ref()
            .map(|d| d.clone().into_boxed_slice());
        if let Some(dict) = &dict {
            if !dict.is_empty() {
                raw.preset_dict = dict.as_ptr();
                raw.preset_dict_size = dict.len() as u32;
            }
        }

        (Box::new(raw), dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test level range validation.
    #[test]
    fn preset_levels() {
        for level in 0..=9 {
            let preset = Preset::new(level).unwrap();
            assert_eq!(preset.level(), level);
            assert!(!preset.is_extreme());
        }
        assert_eq!(Preset::new(10), Err(Error::BadPreset { bits: 10 }));
    }

    /// Test raw round-trip including the extreme flag.
    #[test]
    fn preset_raw_round_trip() {
        let preset = Preset::from_raw(9 | PRESET_EXTREME).unwrap();
        assert_eq!(preset.level(), 9);
        assert!(preset.is_extreme());
        assert_eq!(preset.to_raw(), 9 | PRESET_EXTREME);

        assert_eq!(Preset::default().to_raw(), PRESET_DEFAULT_LEVEL);
        assert_eq!(Preset::new(3).unwrap().extreme().to_raw(), 3 | PRESET_EXTREME);
    }

    /// Test stray flag bits are reported masked, without level bits.
    #[test]
    fn preset_rejects_stray_bits() {
        let raw = 6 | 0x40;
        assert_eq!(Preset::from_raw(raw), Err(Error::BadPreset { bits: 0x40 }));

        let raw = 0x0300_0000 | PRESET_EXTREME;
        assert_eq!(
            Preset::from_raw(raw),
            Err(Error::BadPreset { bits: 0x0300_0000 })
        );
    }

    /// Test the option bounds carry liblzma's stable ABI values.
    #[test]
    fn option_bounds_match_the_abi() {
        assert_eq!(DICT_SIZE_MIN, 4096);
        assert_eq!(DICT_SIZE_MAX, 1536 * 1024 * 1024);
        assert_eq!((LCLP_MIN, LCLP_MAX), (0, 4));
        assert_eq!((PB_MIN, PB_MAX), (0, 4));
        assert_eq!((NICE_LEN_MIN, NICE_LEN_MAX), (2, 273));
    }

    /// Test preset resolution populates every field with sane values.
    #[test]
    fn resolve_default_preset() {
        let options = LzmaOptions::resolve(Preset::default(), &LzmaOverrides::default()).unwrap();
        assert_eq!(options.dict_size, DICT_SIZE_DEFAULT);
        assert!(options.dict_size >= DICT_SIZE_MIN);
        assert!(options.dict_size <= DICT_SIZE_MAX);
        assert_eq!(options.lc, 3);
        assert_eq!(options.lp, 0);
        assert_eq!(options.pb, 2);
        assert!(options.lc + options.lp <= LCLP_MAX);
        assert!(options.pb <= PB_MAX);
        assert!(options.nice_len >= NICE_LEN_MIN);
        assert!(options.nice_len <= NICE_LEN_MAX);
        assert!(options.preset_dict.is_none());
    }

    /// Test resolving the same preset twice yields the same options.
    #[test]
    fn resolve_is_deterministic() {
        let a = LzmaOptions::resolve(Preset::new(1).unwrap(), &LzmaOverrides::default()).unwrap();
        let b = LzmaOptions::resolve(Preset::new(1).unwrap(), &LzmaOverrides::default()).unwrap();
        assert_eq!(a.dict_size, b.dict_size);
        assert_eq!(a.nice_len, b.nice_len);
        assert_eq!(a.mode, b.mode);
        assert_eq!(a.match_finder, b.match_finder);
    }

    /// Test overrides touch only the fields they name.
    #[test]
    fn overrides_apply_selectively() {
        let base = LzmaOptions::resolve(Preset::default(), &LzmaOverrides::default()).unwrap();

        let overrides = LzmaOverrides {
            lc: Some(0),
            lp: Some(2),
            dict_size: Some(1 << 20),
            ..LzmaOverrides::default()
        };
        let custom = LzmaOptions::resolve(Preset::default(), &overrides).unwrap();

        assert_eq!(custom.lc, 0);
        assert_eq!(custom.lp, 2);
        assert_eq!(custom.dict_size, 1 << 20);
        assert_eq!(custom.pb, base.pb);
        assert_eq!(custom.nice_len, base.nice_len);
        assert_eq!(custom.match_finder, base.match_finder);
    }

    /// Test the raw lowering borrows the owned dictionary copy.
    #[test]
    fn raw_lowering_keeps_dict_alive() {
        let overrides = LzmaOverrides {
            preset_dict: Some(vec![0xAA; 64]),
            ..LzmaOverrides::default()
        };
        let options = LzmaOptions::resolve(Preset::default(), &overrides).unwrap();
        let (raw, dict) = options.to_raw();

        let dict = dict.expect("dictionary copy must be kept");
        assert_eq!(raw.preset_dict, dict.as_ptr());
        assert_eq!(raw.preset_dict_size, 64);
    }
}
