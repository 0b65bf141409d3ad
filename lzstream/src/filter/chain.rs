//! Ordered filter chains and their raw lowering.

use std::ptr;

use crate::error::{Error, Result};
use crate::filter::Filter;

/// Maximum number of filters a chain may carry, matching
/// `LZMA_FILTERS_MAX`.
pub const MAX_FILTERS: usize = 4;

/// Raw id terminating a lowered filter array.
const VLI_UNKNOWN: u64 = u64::MAX;

/// An ordered chain of up to [`MAX_FILTERS`] filters.
///
/// Order is significant: filters apply head to tail when encoding and in
/// reverse when decoding. The chain itself only enforces the length cap;
/// semantic rules such as "LZMA2 must come last in `.xz`" are liblzma's to
/// enforce at engine construction.
#[derive(Debug, Clone)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    /// Build a chain from the given filters, in application order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChainTooLong`] carrying the supplied count when
    /// more than [`MAX_FILTERS`] filters are given.
    pub fn build(filters: Vec<Filter>) -> Result<Self> {
        if filters.len() > MAX_FILTERS {
            return Err(Error::ChainTooLong {
                given: filters.len(),
            });
        }
        Ok(FilterChain { filters })
    }

    /// Convenience chain holding a single LZMA2 filter at the default
    /// preset.
    pub fn lzma2_default() -> Result<Self> {
        use crate::filter::{LzmaOverrides, Preset};
        FilterChain::build(vec![Filter::lzma2(Preset::default(), &LzmaOverrides::default())?])
    }

    /// Number of filters in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain holds no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The filters in application order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Lower the chain into the terminated array liblzma consumes.
    pub(crate) fn prepare(&self) -> RawChain {
        let mut owned = Vec::with_capacity(self.filters.len());
        let mut entries = Vec::with_capacity(self.filters.len() + 1);

        for filter in &self.filters {
            let (id, options) = match filter {
                Filter::Lzma1(opts) => {
                    let (raw, dict) = opts.to_raw();
                    (filter.kind().to_raw(), OwnedOptions::Lzma { raw, dict })
                }
                Filter::Lzma2(opts) => {
                    let (raw, dict) = opts.to_raw();
                    (filter.kind().to_raw(), OwnedOptions::Lzma { raw, dict })
                }
                Filter::Delta(opts) => {
                    (filter.kind().to_raw(), OwnedOptions::Delta(opts.to_raw()))
                }
            };
            owned.push(options);
            entries.push(liblzma_sys::lzma_filter {
                id,
                options: owned.last().map(OwnedOptions::as_mut_ptr).unwrap_or(ptr::null_mut()),
            });
        }

        entries.push(liblzma_sys::lzma_filter {
            id: VLI_UNKNOWN,
            options: ptr::null_mut(),
        });

        RawChain { entries, owned }
    }
}

/// Heap-backed option blocks referenced by a lowered chain.
pub(crate) enum OwnedOptions {
    Lzma {
        raw: Box<liblzma_sys::lzma_options_lzma>,
        // The raw struct's preset_dict pointer targets this buffer.
        #[allow(dead_code)]
        dict: Option<Box<[u8]>>,
    },
    Delta(Box<liblzma_sys::lzma_options_delta>),
}

impl OwnedOptions {
    fn as_mut_ptr(&self) -> *mut std::ffi::c_void {
        match self {
            OwnedOptions::Lzma { raw, .. } => {
                raw.as_ref() as *const liblzma_sys::lzma_options_lzma as *mut _
            }
            OwnedOptions::Delta(raw) => {
                raw.as_ref() as *const liblzma_sys::lzma_options_delta as *mut _
            }
        }
    }
}

/// A lowered filter chain: the terminated `lzma_filter` array plus the
/// option blocks its pointers target.
///
/// Must stay alive for as long as the stream initialised over it, so the
/// engine stores it next to its stream handle.
pub(crate) struct RawChain {
    entries: Vec<liblzma_sys::lzma_filter>,
    #[allow(dead_code)]
    owned: Vec<OwnedOptions>,
}

impl RawChain {
    pub(crate) fn as_ptr(&self) -> *const liblzma_sys::lzma_filter {
        self.entries.as_ptr()
    }
}

// SAFETY: the raw pointers inside the entries target the boxed option
// blocks owned by the same value; nothing is shared or thread-affine.
unsafe impl Send for RawChain {}
