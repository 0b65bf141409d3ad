//! Pipeline configuration and run summaries.

use lzstream::{
    CheckKind, CodecEngine, DecoderFlags, DecoderOptions, FilterChain, LzmaOverrides, Preset,
};

/// Default chunk size for reads from the source, in bytes.
pub const DEFAULT_READ_CAPACITY: usize = 64 * 1024;

/// Configuration of a compression pipeline.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    preset: Preset,
    check: CheckKind,
    filters: Option<FilterChain>,
    read_capacity: usize,
}

impl CompressOptions {
    pub fn new() -> Self {
        CompressOptions::default()
    }

    /// Compression preset used when no explicit filter chain is set.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = preset;
        self
    }

    /// Integrity check stored in the stream.
    pub fn check(mut self, check: CheckKind) -> Self {
        self.check = check;
        self
    }

    /// Explicit filter chain; overrides the preset.
    pub fn filters(mut self, chain: FilterChain) -> Self {
        self.filters = Some(chain);
        self
    }

    /// Chunk size for reads from the source, in bytes.
    pub fn read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity.max(1);
        self
    }

    pub(crate) fn capacity(&self) -> usize {
        self.read_capacity
    }

    pub(crate) fn build_engine(&self) -> Result<CodecEngine, lzstream::Error> {
        let chain = match &self.filters {
            Some(chain) => chain.clone(),
            None => FilterChain::build(vec![lzstream::Filter::lzma2(
                self.preset,
                &LzmaOverrides::default(),
            )?])?,
        };
        CodecEngine::encoder(chain, self.check)
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        CompressOptions {
            preset: Preset::default(),
            check: CheckKind::default(),
            filters: None,
            read_capacity: DEFAULT_READ_CAPACITY,
        }
    }
}

/// Which container headers the decompression pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Strict `.xz` input only.
    #[default]
    Xz,
    /// Detect `.xz` or legacy `.lzma` input from the header bytes.
    Auto,
}

/// Configuration of a decompression pipeline.
#[derive(Debug, Clone)]
pub struct DecompressOptions {
    mode: DecodeMode,
    memlimit: u64,
    flags: DecoderFlags,
    read_capacity: usize,
}

impl DecompressOptions {
    pub fn new() -> Self {
        DecompressOptions::default()
    }

    /// Accepted container formats.
    pub fn mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Decoder memory usage cap, in bytes.
    pub fn memlimit(mut self, memlimit: u64) -> Self {
        self.memlimit = memlimit;
        self
    }

    /// Decoder behaviour flags, for example concatenated-stream decoding.
    pub fn flags(mut self, flags: DecoderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Chunk size for reads from the source, in bytes.
    pub fn read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity.max(1);
        self
    }

    pub(crate) fn capacity(&self) -> usize {
        self.read_capacity
    }

    pub(crate) fn build_engine(&self) -> Result<CodecEngine, lzstream::Error> {
        let options = DecoderOptions::new()
            .memlimit(self.memlimit)
            .flags(self.flags);
        match self.mode {
            DecodeMode::Xz => CodecEngine::decoder(&options),
            DecodeMode::Auto => CodecEngine::auto_decoder(&options),
        }
    }
}

impl Default for DecompressOptions {
    fn default() -> Self {
        DecompressOptions {
            mode: DecodeMode::Xz,
            memlimit: u64::MAX,
            flags: DecoderFlags::empty(),
            read_capacity: DEFAULT_READ_CAPACITY,
        }
    }
}

/// Byte totals of one completed pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Bytes consumed from the source.
    pub bytes_read: u64,
    /// Bytes written to the sink.
    pub bytes_written: u64,
}

impl Summary {
    /// Output size relative to input size, or `None` for an empty input.
    pub fn ratio(&self) -> Option<f64> {
        if self.bytes_read == 0 {
            return None;
        }
        Some(self.bytes_written as f64 / self.bytes_read as f64)
    }
}
