//! RAII wrapper around the raw `lzma_stream` handle.

use std::mem;
use std::ptr;

/// Owned `lzma_stream`, released with `lzma_end` on drop.
///
/// Input and output windows are re-pointed before every coding step; the
/// struct never keeps references into caller buffers across calls.
pub(crate) struct Stream {
    inner: liblzma_sys::lzma_stream,
}

impl Stream {
    /// Create a zero-initialised stream, equivalent to `LZMA_STREAM_INIT`.
    pub(crate) fn new() -> Self {
        Stream {
            // SAFETY: lzma_stream is a plain C struct and its documented
            // initial state is all-zero.
            inner: unsafe { mem::zeroed() },
        }
    }

    /// Point the input window at `data` for the next coding step.
    ///
    /// An empty slice maps to a null pointer, which liblzma treats as
    /// "no input available".
    pub(crate) fn set_input(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.inner.next_in = ptr::null();
            self.inner.avail_in = 0;
        } else {
            self.inner.next_in = data.as_ptr();
            self.inner.avail_in = data.len();
        }
    }

    /// Point the output window at `data` for the next coding step.
    pub(crate) fn set_output(&mut self, data: &mut [u8]) {
        self.inner.next_out = data.as_mut_ptr();
        self.inner.avail_out = data.len();
    }

    pub(crate) fn avail_in(&self) -> usize {
        self.inner.avail_in
    }

    pub(crate) fn avail_out(&self) -> usize {
        self.inner.avail_out
    }

    /// Total bytes consumed over the stream's lifetime.
    pub(crate) fn total_in(&self) -> u64 {
        self.inner.total_in
    }

    /// Total bytes produced over the stream's lifetime.
    pub(crate) fn total_out(&self) -> u64 {
        self.inner.total_out
    }

    pub(crate) fn as_ptr(&self) -> *const liblzma_sys::lzma_stream {
        &self.inner
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut liblzma_sys::lzma_stream {
        &mut self.inner
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // SAFETY: the pointer is valid and lzma_end is a no-op on a stream
        // whose internal state is null (never initialised, or ended).
        unsafe { liblzma_sys::lzma_end(&mut self.inner) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test window setters update the exposed counters.
    #[test]
    fn windows_track_availability() {
        let mut stream = Stream::new();
        assert_eq!(stream.avail_in(), 0);
        assert_eq!(stream.avail_out(), 0);

        let input = [1u8, 2, 3, 4];
        let mut output = [0u8; 16];
        stream.set_input(&input);
        stream.set_output(&mut output);
        assert_eq!(stream.avail_in(), 4);
        assert_eq!(stream.avail_out(), 16);

        stream.set_input(&[]);
        assert_eq!(stream.avail_in(), 0);
    }

    /// Test dropping an uninitialised stream is harmless.
    #[test]
    fn drop_without_init() {
        let stream = Stream::new();
        assert_eq!(stream.total_in(), 0);
        assert_eq!(stream.total_out(), 0);
        drop(stream);
    }
}
