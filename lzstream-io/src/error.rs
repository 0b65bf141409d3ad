//! Error type shared by the sync and async pipelines.

use std::fmt;
use std::io;

/// Type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// A pipeline failure: either the codec engine or the surrounding I/O.
#[derive(Debug)]
pub enum Error {
    /// The codec engine rejected input or configuration.
    Codec(lzstream::Error),
    /// Reading or writing failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Codec(err) => write!(f, "codec error: {err}"),
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Codec(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<lzstream::Error> for Error {
    fn from(err: lzstream::Error) -> Self {
        Error::Codec(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
