//! Status codes and error types used by the codec engine.

use std::fmt;

/// Type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

const RAW_OK: u32 = liblzma_sys::LZMA_OK as u32;
const RAW_STREAM_END: u32 = liblzma_sys::LZMA_STREAM_END as u32;
const RAW_NO_CHECK: u32 = liblzma_sys::LZMA_NO_CHECK as u32;
const RAW_UNSUPPORTED_CHECK: u32 = liblzma_sys::LZMA_UNSUPPORTED_CHECK as u32;
const RAW_GET_CHECK: u32 = liblzma_sys::LZMA_GET_CHECK as u32;
const RAW_MEM_ERROR: u32 = liblzma_sys::LZMA_MEM_ERROR as u32;
const RAW_MEMLIMIT_ERROR: u32 = liblzma_sys::LZMA_MEMLIMIT_ERROR as u32;
const RAW_FORMAT_ERROR: u32 = liblzma_sys::LZMA_FORMAT_ERROR as u32;
const RAW_OPTIONS_ERROR: u32 = liblzma_sys::LZMA_OPTIONS_ERROR as u32;
const RAW_DATA_ERROR: u32 = liblzma_sys::LZMA_DATA_ERROR as u32;
const RAW_BUF_ERROR: u32 = liblzma_sys::LZMA_BUF_ERROR as u32;
const RAW_PROG_ERROR: u32 = liblzma_sys::LZMA_PROG_ERROR as u32;

/// Raw coder status, mirroring `lzma_ret` one to one.
///
/// `Ok`, [`Status::StreamEnd`] and the three informational values
/// (`NoCheck`, `UnsupportedCheck`, `GetCheck`) are success signals, not
/// errors. The low-level [`crate::CodecEngine::code`] primitive returns a
/// `Status` directly; the higher-level transform API folds the hard values
/// into [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation completed, coding may continue (`LZMA_OK`).
    Ok,

    /// Logical end of the stream was reached (`LZMA_STREAM_END`).
    StreamEnd,

    /// The input stream carries no integrity check (`LZMA_NO_CHECK`).
    NoCheck,

    /// The stream's check kind cannot be verified by this build
    /// (`LZMA_UNSUPPORTED_CHECK`).
    UnsupportedCheck,

    /// The check kind is now known and can be queried (`LZMA_GET_CHECK`).
    GetCheck,

    /// Memory allocation failed (`LZMA_MEM_ERROR`).
    MemError,

    /// Configured memory limit was exceeded (`LZMA_MEMLIMIT_ERROR`).
    MemlimitError,

    /// Input is not a recognised container (`LZMA_FORMAT_ERROR`).
    FormatError,

    /// Invalid or inconsistent coder options (`LZMA_OPTIONS_ERROR`).
    OptionsError,

    /// Corrupted compressed data (`LZMA_DATA_ERROR`).
    DataError,

    /// No progress is possible (`LZMA_BUF_ERROR`).
    BufError,

    /// API misuse or internal invariant violation (`LZMA_PROG_ERROR`).
    ProgError,

    /// Status code not known to this crate.
    Unknown(u32),
}

impl Status {
    /// Map a raw `lzma_ret` value onto a `Status`.
    pub fn from_raw(raw: u32) -> Status {
        match raw {
            RAW_OK => Status::Ok,
            RAW_STREAM_END => Status::StreamEnd,
            RAW_NO_CHECK => Status::NoCheck,
            RAW_UNSUPPORTED_CHECK => Status::UnsupportedCheck,
            RAW_GET_CHECK => Status::GetCheck,
            RAW_MEM_ERROR => Status::MemError,
            RAW_MEMLIMIT_ERROR => Status::MemlimitError,
            RAW_FORMAT_ERROR => Status::FormatError,
            RAW_OPTIONS_ERROR => Status::OptionsError,
            RAW_DATA_ERROR => Status::DataError,
            RAW_BUF_ERROR => Status::BufError,
            RAW_PROG_ERROR => Status::ProgError,
            other => Status::Unknown(other),
        }
    }

    /// Return the raw `lzma_ret` value for this status.
    pub fn to_raw(self) -> u32 {
        match self {
            Status::Ok => RAW_OK,
            Status::StreamEnd => RAW_STREAM_END,
            Status::NoCheck => RAW_NO_CHECK,
            Status::UnsupportedCheck => RAW_UNSUPPORTED_CHECK,
            Status::GetCheck => RAW_GET_CHECK,
            Status::MemError => RAW_MEM_ERROR,
            Status::MemlimitError => RAW_MEMLIMIT_ERROR,
            Status::FormatError => RAW_FORMAT_ERROR,
            Status::OptionsError => RAW_OPTIONS_ERROR,
            Status::DataError => RAW_DATA_ERROR,
            Status::BufError => RAW_BUF_ERROR,
            Status::ProgError => RAW_PROG_ERROR,
            Status::Unknown(code) => code,
        }
    }

    /// Whether this status reports success or an informational condition
    /// rather than a failure.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Status::Ok
                | Status::StreamEnd
                | Status::NoCheck
                | Status::UnsupportedCheck
                | Status::GetCheck
        )
    }

    /// Translate an initialisation status into a `Result`.
    ///
    /// Only `Ok` counts as success here; informational values never occur
    /// during coder construction.
    pub(crate) fn into_init_result(self) -> Result<()> {
        if self == Status::Ok {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

/// Error values produced by the engine and its configuration types.
///
/// Variants that correspond to a coder status expose the original code via
/// [`Error::raw_code`]; construction-time validation errors carry their
/// detail inline instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Memory allocation failed, even after the bounded reclaim-and-retry
    /// pass (`LZMA_MEM_ERROR`).
    MemError,

    /// The configured memory limit was exceeded while decoding
    /// (`LZMA_MEMLIMIT_ERROR`). Terminal for the engine instance; re-create
    /// the decoder with a higher limit to retry.
    MemlimitError,

    /// Input bytes are not a recognised container (`LZMA_FORMAT_ERROR`).
    FormatError,

    /// Invalid filter or engine configuration (`LZMA_OPTIONS_ERROR`).
    OptionsError,

    /// Corrupted or inconsistent compressed data (`LZMA_DATA_ERROR`).
    DataError,

    /// No progress possible: no output space and no input consumed
    /// (`LZMA_BUF_ERROR`).
    BufError,

    /// API misuse, for example transforming on an engine that already
    /// failed (`LZMA_PROG_ERROR`).
    ProgError,

    /// The requested integrity check kind is not supported
    /// (`LZMA_UNSUPPORTED_CHECK`).
    UnsupportedCheck,

    /// More filters were supplied than a chain can hold.
    ChainTooLong {
        /// Number of filters that were supplied.
        given: usize,
    },

    /// A raw filter id does not name a known filter kind.
    InvalidFilter {
        /// The unrecognised filter id.
        id: u64,
    },

    /// A raw preset value is outside 0..=9 or carries stray flag bits.
    BadPreset {
        /// The offending masked bits (or the raw value when the level
        /// itself is out of range).
        bits: u32,
    },

    /// The engine has been finished and released; it must be re-created
    /// before further transforms.
    NotInitialized,

    /// The caller's interrupt flag was observed during a transform.
    Interrupted,

    /// Fallback for status codes not known to this crate.
    Unknown(u32),
}

impl Error {
    /// The raw coder status behind this error, when one exists.
    ///
    /// Construction-time validation errors ([`Error::ChainTooLong`],
    /// [`Error::InvalidFilter`], [`Error::BadPreset`]) and the driver-side
    /// conditions ([`Error::NotInitialized`], [`Error::Interrupted`]) have
    /// no coder status and return `None`.
    pub fn raw_code(self) -> Option<u32> {
        match self {
            Error::MemError => Some(Status::MemError.to_raw()),
            Error::MemlimitError => Some(Status::MemlimitError.to_raw()),
            Error::FormatError => Some(Status::FormatError.to_raw()),
            Error::OptionsError => Some(Status::OptionsError.to_raw()),
            Error::DataError => Some(Status::DataError.to_raw()),
            Error::BufError => Some(Status::BufError.to_raw()),
            Error::ProgError => Some(Status::ProgError.to_raw()),
            Error::UnsupportedCheck => Some(Status::UnsupportedCheck.to_raw()),
            Error::Unknown(code) => Some(code),
            Error::ChainTooLong { .. }
            | Error::InvalidFilter { .. }
            | Error::BadPreset { .. }
            | Error::NotInitialized
            | Error::Interrupted => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MemError => write!(f, "memory allocation failed"),
            Error::MemlimitError => write!(f, "memory usage limit was reached"),
            Error::FormatError => write!(f, "input format not recognised"),
            Error::OptionsError => write!(f, "invalid or unsupported options"),
            Error::DataError => write!(f, "compressed data is corrupt"),
            Error::BufError => write!(f, "no progress is possible"),
            Error::ProgError => write!(f, "engine misuse or internal error"),
            Error::UnsupportedCheck => write!(f, "integrity check kind is not supported"),
            Error::ChainTooLong { given } => write!(
                f,
                "filter chain too long (max {}, but given {given})",
                crate::filter::MAX_FILTERS
            ),
            Error::InvalidFilter { id } => write!(f, "not a known filter id: {id:#x}"),
            Error::BadPreset { bits } => write!(f, "bad preset bits ({bits:#010x})"),
            Error::NotInitialized => write!(f, "engine is not initialised"),
            Error::Interrupted => write!(f, "transform was interrupted"),
            Error::Unknown(code) => write!(f, "unknown status code: {code}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Status> for Error {
    /// Fold a failing status into an error.
    ///
    /// Success and informational statuses are handled before this point by
    /// the transform loop; mapping them here falls back to the raw code.
    fn from(status: Status) -> Error {
        match status {
            Status::MemError => Error::MemError,
            Status::MemlimitError => Error::MemlimitError,
            Status::FormatError => Error::FormatError,
            Status::OptionsError => Error::OptionsError,
            Status::DataError => Error::DataError,
            Status::BufError => Error::BufError,
            Status::ProgError => Error::ProgError,
            Status::UnsupportedCheck => Error::UnsupportedCheck,
            other => Error::Unknown(other.to_raw()),
        }
    }
}
