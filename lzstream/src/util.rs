//! Checksums and buffer sizing helpers.

/// CRC-32 over `data`, chained onto `seed`. Pass 0 to start fresh.
pub fn crc32(data: &[u8], seed: u32) -> u32 {
    // SAFETY: pointer and length come from the same live slice; a zero
    // length is fine regardless of the pointer.
    unsafe { liblzma_sys::lzma_crc32(data.as_ptr(), data.len(), seed) }
}

/// CRC-64 over `data`, chained onto `seed`. Pass 0 to start fresh.
pub fn crc64(data: &[u8], seed: u64) -> u64 {
    // SAFETY: as in [`crc32`].
    unsafe { liblzma_sys::lzma_crc64(data.as_ptr(), data.len(), seed) }
}

/// Worst-case `.xz` stream size for `uncompressed_size` input bytes.
///
/// Returns 0 when the input size is too large to express.
pub fn stream_buffer_bound(uncompressed_size: usize) -> usize {
    // SAFETY: pure computation.
    unsafe { liblzma_sys::lzma_stream_buffer_bound(uncompressed_size) }
}

/// Worst-case single-block size for `uncompressed_size` input bytes.
///
/// Returns 0 when the input size is too large to express.
pub fn block_buffer_bound(uncompressed_size: usize) -> usize {
    // SAFETY: pure computation.
    unsafe { liblzma_sys::lzma_block_buffer_bound(uncompressed_size) }
}
