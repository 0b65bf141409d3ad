//! Blocking pipelines over `std::io` readers and writers.

use std::io::{Read, Write};

use crate::config::{CompressOptions, DecompressOptions, Summary};
use crate::error::Result;

/// Compress everything from `reader` into `writer`.
///
/// # Errors
///
/// Returns the underlying I/O error or the engine's codec error; either
/// way the sink may have received partial output.
pub fn compress<R, W>(mut reader: R, mut writer: W, options: &CompressOptions) -> Result<Summary>
where
    R: Read,
    W: Write,
{
    let mut engine = options.build_engine()?;
    let mut buf = vec![0u8; options.capacity()];
    let mut summary = Summary::default();

    loop {
        let read = read_chunk(&mut reader, &mut buf)?;
        if read == 0 {
            break;
        }
        summary.bytes_read += read as u64;
        let out = engine.update(&buf[..read])?;
        writer.write_all(&out)?;
        summary.bytes_written += out.len() as u64;
    }

    let out = engine.finish()?;
    writer.write_all(&out)?;
    summary.bytes_written += out.len() as u64;
    writer.flush()?;
    Ok(summary)
}

/// Decompress everything from `reader` into `writer`.
///
/// Reading stops at the logical end of the compressed stream; bytes after
/// it are left unread unless concatenated-stream decoding was requested.
///
/// # Errors
///
/// Truncated or corrupt input surfaces as the engine's codec error.
pub fn decompress<R, W>(
    mut reader: R,
    mut writer: W,
    options: &DecompressOptions,
) -> Result<Summary>
where
    R: Read,
    W: Write,
{
    let mut engine = options.build_engine()?;
    let mut buf = vec![0u8; options.capacity()];
    let mut summary = Summary::default();

    loop {
        let read = read_chunk(&mut reader, &mut buf)?;
        if read == 0 {
            break;
        }
        summary.bytes_read += read as u64;
        let out = engine.update(&buf[..read])?;
        writer.write_all(&out)?;
        summary.bytes_written += out.len() as u64;
        if engine.stream_ended() {
            break;
        }
    }

    let out = engine.finish()?;
    writer.write_all(&out)?;
    summary.bytes_written += out.len() as u64;
    writer.flush()?;
    Ok(summary)
}

/// One read, retried over spurious interrupts.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
