//! Reader/writer pipelines over the [`lzstream`] codec engine.
//!
//! The engine itself is byte-in/byte-out; this crate attaches it to
//! `std::io` readers and writers, and with the `async` feature (enabled
//! by default) to tokio's async equivalents. Coding steps in the async
//! pipelines run on the blocking thread pool so the reactor is never
//! stalled by compression work.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use lzstream_io::{compress, decompress, CompressOptions, DecompressOptions};
//!
//! let input = b"pipelines attach i/o to the engine".to_vec();
//!
//! let mut compressed = Vec::new();
//! compress(Cursor::new(&input), &mut compressed, &CompressOptions::default())?;
//!
//! let mut decoded = Vec::new();
//! decompress(Cursor::new(&compressed), &mut decoded, &DecompressOptions::default())?;
//! assert_eq!(decoded, input);
//! # Ok::<(), lzstream_io::Error>(())
//! ```

mod config;
mod error;
mod pipeline;

pub use config::{
    CompressOptions, DecodeMode, DecompressOptions, Summary, DEFAULT_READ_CAPACITY,
};
pub use error::{Error, Result};
#[cfg(feature = "async")]
pub use pipeline::r#async as aio;
pub use pipeline::sync::{compress, decompress};
