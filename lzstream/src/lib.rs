//! Incremental streaming LZMA/XZ codec engine built on liblzma.
//!
//! The central type is [`CodecEngine`]: one coding stream in one of five
//! modes (`.xz` encode, `.xz` decode, auto-detecting decode, raw encode,
//! raw decode) behind a single byte-in/byte-out transform surface. The
//! engine attaches no I/O; callers feed slices and collect buffers, which
//! makes it equally usable under files, sockets or in-memory pipelines.
//!
//! Compression behaviour is described by a [`FilterChain`] of up to four
//! configured [`Filter`]s, each resolved from a [`Preset`] plus optional
//! field [`LzmaOverrides`]. Container streams carry an integrity
//! [`CheckKind`] (CRC64 by default); raw streams carry nothing and require
//! the identical chain when decoding.
//!
//! # Example
//!
//! ```
//! use lzstream::{Action, CheckKind, CodecEngine, DecoderOptions, FilterChain};
//!
//! let chain = FilterChain::lzma2_default()?;
//! let mut encoder = CodecEngine::encoder(chain, CheckKind::default())?;
//! let mut compressed = encoder.transform(b"hello from lzstream", Action::Finish)?;
//! compressed.extend(encoder.finish()?);
//!
//! let mut decoder = CodecEngine::decoder(&DecoderOptions::default())?;
//! let decoded = decoder.transform(&compressed, Action::Finish)?;
//! assert_eq!(decoded, b"hello from lzstream");
//! # Ok::<(), lzstream::Error>(())
//! ```

mod check;
mod engine;
mod error;
mod ffi;
mod filter;
mod index;
mod stream;
pub mod util;

pub use check::CheckKind;
pub use engine::{
    Action, CodecEngine, DecoderFlags, DecoderOptions, EngineBuilder, Notice,
    DEFAULT_SCRATCH_CAPACITY, MIN_SCRATCH_CAPACITY,
};
pub use error::{Error, Result, Status};
pub use filter::{
    DeltaOptions, Filter, FilterChain, FilterKind, LzmaOptions, LzmaOverrides, MatchFinder, Mode,
    Preset, DELTA_DIST_MAX, DELTA_DIST_MIN, DICT_SIZE_DEFAULT, DICT_SIZE_MAX, DICT_SIZE_MIN,
    LCLP_MAX, LCLP_MIN, MAX_FILTERS, NICE_LEN_MAX, NICE_LEN_MIN, PB_MAX, PB_MIN,
    PRESET_DEFAULT_LEVEL, PRESET_EXTREME, PRESET_LEVEL_MASK,
};
pub use index::Index;
