//! Delta filter options.

use std::mem;

/// Smallest supported delta distance, in bytes.
pub const DELTA_DIST_MIN: u32 = 1;

/// Largest supported delta distance, in bytes, matching liblzma's
/// `LZMA_DELTA_DIST_MAX` (256, one more than a byte can express).
pub const DELTA_DIST_MAX: u32 = 256;

/// Options for the byte-wise delta filter.
///
/// The distance is forwarded as given; liblzma rejects out-of-range values
/// with an options error when the coder is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaOptions {
    /// Distance between subtracted bytes, `1..=256`.
    pub distance: u32,
}

impl DeltaOptions {
    /// Options with the given distance.
    pub fn new(distance: u32) -> Self {
        DeltaOptions { distance }
    }

    pub(crate) fn to_raw(self) -> Box<liblzma_sys::lzma_options_delta> {
        // SAFETY: lzma_options_delta is a plain C struct; all-zero is a
        // valid base state for the fields we do not set.
        let mut raw: liblzma_sys::lzma_options_delta = unsafe { mem::zeroed() };
        raw.type_ = liblzma_sys::lzma_delta_type_LZMA_DELTA_TYPE_BYTE;
        raw.dist = self.distance;
        Box::new(raw)
    }
}

impl Default for DeltaOptions {
    fn default() -> Self {
        DeltaOptions {
            distance: DELTA_DIST_MIN,
        }
    }
}
