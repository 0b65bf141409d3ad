//! Integrity check kinds for `.xz` streams.

use crate::error::{Error, Result};
use crate::ffi;

/// Integrity check computed over the uncompressed payload.
///
/// The default is CRC64, matching the `xz` tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CheckKind {
    /// No check at all.
    None = 0,
    /// 32-bit cyclic redundancy check.
    Crc32 = 1,
    /// 64-bit cyclic redundancy check.
    Crc64 = 4,
    /// SHA-256 digest.
    Sha256 = 10,
}

impl CheckKind {
    /// Map a raw `lzma_check` value onto a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCheck`] for values this crate does not
    /// model, including the reserved ids.
    pub fn from_raw(raw: u32) -> Result<CheckKind> {
        match raw {
            x if x == CheckKind::None as u32 => Ok(CheckKind::None),
            x if x == CheckKind::Crc32 as u32 => Ok(CheckKind::Crc32),
            x if x == CheckKind::Crc64 as u32 => Ok(CheckKind::Crc64),
            x if x == CheckKind::Sha256 as u32 => Ok(CheckKind::Sha256),
            _ => Err(Error::UnsupportedCheck),
        }
    }

    /// The raw `lzma_check` value.
    pub fn to_raw(self) -> u32 {
        self as u32
    }

    /// Size of the stored check field, in bytes.
    pub fn size(self) -> usize {
        match self {
            CheckKind::None => 0,
            CheckKind::Crc32 => 4,
            CheckKind::Crc64 => 8,
            CheckKind::Sha256 => 32,
        }
    }

    /// Whether the linked liblzma build can compute this check.
    pub fn is_supported(self) -> bool {
        ffi::check_is_supported(self.to_raw() as liblzma_sys::lzma_check)
    }
}

impl Default for CheckKind {
    fn default() -> Self {
        CheckKind::Crc64
    }
}

impl From<CheckKind> for liblzma_sys::lzma_check {
    fn from(kind: CheckKind) -> Self {
        kind.to_raw() as liblzma_sys::lzma_check
    }
}
