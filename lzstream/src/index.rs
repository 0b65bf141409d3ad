//! In-memory model of a `.xz` index.
//!
//! The index records block sizes so a reader can seek inside a stream.
//! This type models and sizes an index; serialising one to or from the
//! container's index field is not part of this crate's surface.

use std::ptr::{self, NonNull};

use crate::error::{Error, Result, Status};

/// Owned, growable `.xz` index.
pub struct Index {
    inner: NonNull<liblzma_sys::lzma_index>,
}

impl Index {
    /// An empty index describing one stream with no blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemError`] when allocation fails.
    pub fn new() -> Result<Self> {
        // SAFETY: a null allocator selects malloc/free.
        let raw = unsafe { liblzma_sys::lzma_index_init(ptr::null()) };
        NonNull::new(raw)
            .map(|inner| Index { inner })
            .ok_or(Error::MemError)
    }

    /// Approximate memory needed for an index covering the given numbers
    /// of streams and blocks, in bytes.
    pub fn memusage(streams: u64, blocks: u64) -> u64 {
        // SAFETY: pure computation, no pointers involved.
        unsafe { liblzma_sys::lzma_index_memusage(streams, blocks) }
    }

    /// Memory currently held by this index, in bytes.
    pub fn memused(&self) -> u64 {
        // SAFETY: read-only query on an owned, live index.
        unsafe { liblzma_sys::lzma_index_memused(self.inner.as_ptr()) }
    }

    /// Record one block by its unpadded compressed size and uncompressed
    /// size, both in bytes.
    ///
    /// # Errors
    ///
    /// Fails when a size is out of range or when growing the index runs
    /// out of memory.
    pub fn append(&mut self, unpadded_size: u64, uncompressed_size: u64) -> Result<()> {
        // SAFETY: the index pointer is owned and live; a null allocator
        // selects malloc/free.
        let ret = unsafe {
            liblzma_sys::lzma_index_append(
                self.inner.as_ptr(),
                ptr::null(),
                unpadded_size,
                uncompressed_size,
            )
        };
        Status::from_raw(ret as u32).into_init_result()
    }

    /// Number of blocks recorded across all streams.
    pub fn block_count(&self) -> u64 {
        // SAFETY: read-only query on an owned, live index.
        unsafe { liblzma_sys::lzma_index_block_count(self.inner.as_ptr()) }
    }

    /// Number of streams in the index.
    pub fn stream_count(&self) -> u64 {
        // SAFETY: read-only query on an owned, live index.
        unsafe { liblzma_sys::lzma_index_stream_count(self.inner.as_ptr()) }
    }

    /// Total uncompressed size the index describes, in bytes.
    pub fn uncompressed_size(&self) -> u64 {
        // SAFETY: read-only query on an owned, live index.
        unsafe { liblzma_sys::lzma_index_uncompressed_size(self.inner.as_ptr()) }
    }

    /// Size of the whole `.xz` file the index describes, in bytes.
    pub fn file_size(&self) -> u64 {
        // SAFETY: read-only query on an owned, live index.
        unsafe { liblzma_sys::lzma_index_file_size(self.inner.as_ptr()) }
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        // SAFETY: the pointer came from lzma_index_init and is dropped
        // exactly once.
        unsafe { liblzma_sys::lzma_index_end(self.inner.as_ptr(), ptr::null()) };
    }
}

// SAFETY: the index is owned outright and liblzma index objects have no
// thread affinity.
unsafe impl Send for Index {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_index_is_empty() {
        let index = Index::new().unwrap();
        assert_eq!(index.block_count(), 0);
        assert_eq!(index.stream_count(), 1);
        assert_eq!(index.uncompressed_size(), 0);
        assert!(index.memused() > 0);
    }

    #[test]
    fn append_accumulates_blocks() {
        let mut index = Index::new().unwrap();
        index.append(4096, 65536).unwrap();
        index.append(2048, 32768).unwrap();

        assert_eq!(index.block_count(), 2);
        assert_eq!(index.uncompressed_size(), 65536 + 32768);
        assert!(index.file_size() > 0);
    }

    #[test]
    fn memusage_estimate_is_positive() {
        assert!(Index::memusage(1, 1) > 0);
        assert!(Index::memusage(2, 100) >= Index::memusage(1, 1));
    }

    /// Out-of-range sizes are rejected by liblzma, not silently clamped.
    #[test]
    fn append_rejects_absurd_sizes() {
        let mut index = Index::new().unwrap();
        assert!(index.append(u64::MAX - 1, 16).is_err());
    }
}
