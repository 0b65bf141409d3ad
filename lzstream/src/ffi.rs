//! Thin wrappers around liblzma entry points.
//!
//! Every unsafe call the crate makes lives here, next to the invariant
//! that makes it sound. Callers deal in [`Status`] values and safe types.

use crate::error::{Error, Result, Status};
use crate::stream::Stream;

/// How many times an allocating call is attempted before `MemError` is
/// surfaced. Between attempts the caller's reclaim hook runs once.
pub(crate) const ALLOC_ATTEMPTS: usize = 2;

/// Run an allocating initialiser with a bounded reclaim-and-retry pass.
///
/// On `MemError` the reclaim hook (when present) is invoked and the
/// initialiser retried once. Any other failing status is surfaced
/// immediately.
pub(crate) fn retry_alloc(
    reclaim: Option<&(dyn Fn() + Send + Sync)>,
    mut init: impl FnMut() -> Status,
) -> Result<()> {
    let mut status = init();
    for _ in 1..ALLOC_ATTEMPTS {
        if status != Status::MemError {
            break;
        }
        if let Some(hook) = reclaim {
            hook();
        }
        status = init();
    }
    status.into_init_result()
}

/// Initialise a `.xz` stream encoder over the given raw filter chain.
///
/// # Safety contract
///
/// `filters` must point at a chain terminated by `LZMA_VLI_UNKNOWN` whose
/// options outlive the stream. [`crate::filter::RawChain`] upholds this.
pub(crate) fn stream_encoder(
    stream: &mut Stream,
    filters: *const liblzma_sys::lzma_filter,
    check: liblzma_sys::lzma_check,
) -> Status {
    // SAFETY: the stream pointer is valid and the chain contract above
    // guarantees a properly terminated filter array.
    let ret = unsafe { liblzma_sys::lzma_stream_encoder(stream.as_mut_ptr(), filters, check) };
    Status::from_raw(ret as u32)
}

/// Initialise a `.xz` stream decoder.
pub(crate) fn stream_decoder(stream: &mut Stream, memlimit: u64, flags: u32) -> Status {
    // SAFETY: the stream pointer is valid for the duration of the call.
    let ret = unsafe { liblzma_sys::lzma_stream_decoder(stream.as_mut_ptr(), memlimit, flags) };
    Status::from_raw(ret as u32)
}

/// Initialise a decoder that sniffs `.xz` and legacy `.lzma` input.
pub(crate) fn auto_decoder(stream: &mut Stream, memlimit: u64, flags: u32) -> Status {
    // SAFETY: the stream pointer is valid for the duration of the call.
    let ret = unsafe { liblzma_sys::lzma_auto_decoder(stream.as_mut_ptr(), memlimit, flags) };
    Status::from_raw(ret as u32)
}

/// Initialise a headerless (raw) encoder over the given filter chain.
pub(crate) fn raw_encoder(
    stream: &mut Stream,
    filters: *const liblzma_sys::lzma_filter,
) -> Status {
    // SAFETY: same chain contract as [`stream_encoder`].
    let ret = unsafe { liblzma_sys::lzma_raw_encoder(stream.as_mut_ptr(), filters) };
    Status::from_raw(ret as u32)
}

/// Initialise a headerless (raw) decoder over the given filter chain.
pub(crate) fn raw_decoder(
    stream: &mut Stream,
    filters: *const liblzma_sys::lzma_filter,
) -> Status {
    // SAFETY: same chain contract as [`stream_encoder`].
    let ret = unsafe { liblzma_sys::lzma_raw_decoder(stream.as_mut_ptr(), filters) };
    Status::from_raw(ret as u32)
}

/// Run one coding step with the stream's current windows.
pub(crate) fn code(stream: &mut Stream, action: liblzma_sys::lzma_action) -> Status {
    // SAFETY: the input and output windows were pointed at live buffers by
    // the caller immediately before this call.
    let ret = unsafe { liblzma_sys::lzma_code(stream.as_mut_ptr(), action) };
    Status::from_raw(ret as u32)
}

/// Query the integrity check kind of the stream being decoded.
pub(crate) fn get_check(stream: &Stream) -> u32 {
    // SAFETY: read-only query on a valid stream pointer.
    unsafe { liblzma_sys::lzma_get_check(stream.as_ptr()) as u32 }
}

/// Current memory usage of the coder, in bytes.
pub(crate) fn memusage(stream: &Stream) -> u64 {
    // SAFETY: read-only query on a valid stream pointer.
    unsafe { liblzma_sys::lzma_memusage(stream.as_ptr()) }
}

/// Current memory usage limit of the coder, in bytes.
pub(crate) fn memlimit_get(stream: &Stream) -> u64 {
    // SAFETY: read-only query on a valid stream pointer.
    unsafe { liblzma_sys::lzma_memlimit_get(stream.as_ptr()) }
}

/// Seed an options block from a raw preset value.
///
/// Returns `Err(Error::OptionsError)` when liblzma rejects the preset;
/// callers validate the value beforehand so this is a backstop.
pub(crate) fn lzma_preset(
    options: &mut liblzma_sys::lzma_options_lzma,
    preset: u32,
) -> Result<()> {
    // SAFETY: options points at a caller-owned struct; lzma_lzma_preset
    // only writes to it.
    let failed = unsafe { liblzma_sys::lzma_lzma_preset(options, preset) };
    if failed != 0 {
        return Err(Error::OptionsError);
    }
    Ok(())
}

/// Whether this liblzma build can compute the given check kind.
pub(crate) fn check_is_supported(check: liblzma_sys::lzma_check) -> bool {
    // SAFETY: pure query, no pointers involved.
    unsafe { liblzma_sys::lzma_check_is_supported(check) != 0 }
}
