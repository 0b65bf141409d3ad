//! Async pipelines over tokio readers and writers.
//!
//! Coding steps are CPU-bound, so each one is handed to the blocking
//! thread pool; the engine is moved into the task and back out, never
//! shared.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task;

use crate::config::{CompressOptions, DecompressOptions, Summary};
use crate::error::{Error, Result};
use lzstream::CodecEngine;

/// Compress everything from `reader` into `writer`.
///
/// # Errors
///
/// Returns the underlying I/O error or the engine's codec error; either
/// way the sink may have received partial output.
pub async fn compress<R, W>(
    mut reader: R,
    mut writer: W,
    options: &CompressOptions,
) -> Result<Summary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut engine = options.build_engine()?;
    let mut buf = vec![0u8; options.capacity()];
    let mut summary = Summary::default();

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        summary.bytes_read += read as u64;
        let chunk = buf[..read].to_vec();
        let (returned, result) = run_step(engine, move |engine| engine.update(&chunk)).await?;
        engine = returned;
        let out = result?;
        writer.write_all(&out).await?;
        summary.bytes_written += out.len() as u64;
    }

    let (_, result) = run_step(engine, CodecEngine::finish).await?;
    let out = result?;
    writer.write_all(&out).await?;
    summary.bytes_written += out.len() as u64;
    writer.flush().await?;
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
pub async fn decompress<R, W>(
    mut reader: R,
    mut writer: W,
    options: &DecompressOptions,
) -> Result<Summary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut engine = options.build_engine()?;
    let mut buf = vec![0u8; options.capacity()];
    let mut summary = Summary::default();

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        summary.bytes_read += read as u64;
        let chunk = buf[..read].to_vec();
        let (returned, result) = run_step(engine, move |engine| engine.update(&chunk)).await?;
        engine = returned;
        let out = result?;
        writer.write_all(&out).await?;
        summary.bytes_written += out.len() as u64;
        if engine.stream_ended() {
            break;
        }
    }

    let (_, result) = run_step(engine, CodecEngine::finish).await?;
    let out = result?;
    writer.write_all(&out).await?;
    summary.bytes_written += out.len() as u64;
    writer.flush().await?;
    Ok(summary)
}

/// Run one engine step on the blocking pool, handing the engine back
/// alongside its result.
async fn run_step<F>(
    mut engine: CodecEngine,
    step: F,
) -> Result<(CodecEngine, lzstream::Result<Vec<u8>>)>
where
    F: FnOnce(&mut CodecEngine) -> lzstream::Result<Vec<u8>> + Send + 'static,
{
    task::spawn_blocking(move || {
        let result = step(&mut engine);
        (engine, result)
    })
    .await
    .map_err(|err| Error::Io(io::Error::new(io::ErrorKind::Other, err)))
}
