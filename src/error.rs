//! Unified error types for the Improv serial firmware.
//!
//! None of these ever reach the host as a fault: the service maps protocol
//! failures onto Improv error frames and logs everything else. They exist so
//! the codec, decoder and configuration layers can report precisely what
//! went wrong to their callers (tests, host tooling, `main`).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible non-port operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A wire frame could not be built or validated.
    Frame(FrameError),
    /// An RPC payload could not be decoded.
    Decode(DecodeError),
    /// A device identity field was rejected.
    Identity(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Identity(msg) => write!(f, "identity: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Framing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Payload (or a string field) does not fit the one-byte length prefix.
    PayloadTooLong(usize),
    /// Fewer bytes than the header and declared length require.
    Truncated,
    /// The first six bytes are not `IMPROV`.
    BadMagic,
    /// Unsupported protocol version byte.
    BadVersion(u8),
    /// Trailing checksum does not match the sum of the preceding bytes.
    BadChecksum { expected: u8, found: u8 },
    /// Bytes remain after the checksum.
    TrailingBytes(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLong(n) => write!(f, "payload of {n} bytes exceeds 255"),
            Self::Truncated => write!(f, "frame truncated"),
            Self::BadMagic => write!(f, "missing IMPROV header"),
            Self::BadVersion(v) => write!(f, "unsupported version {v}"),
            Self::BadChecksum { expected, found } => {
                write!(f, "checksum mismatch (expected 0x{expected:02X}, found 0x{found:02X})")
            }
            Self::TrailingBytes(n) => write!(f, "{n} bytes after checksum"),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for FrameError {}

impl std::error::Error for DecodeError {}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// RPC payload decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// RPC payload has no command byte or no data-length byte.
    Empty,
    /// Inner data-length byte disagrees with the bytes actually present.
    LengthMismatch { declared: usize, actual: usize },
    /// A length-prefixed field runs past the end of the data.
    FieldOverrun,
    /// A field is longer than its fixed capacity.
    FieldTooLong,
    /// A string field is not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty RPC payload"),
            Self::LengthMismatch { declared, actual } => {
                write!(f, "data length {declared} declared, {actual} present")
            }
            Self::FieldOverrun => write!(f, "field overruns payload"),
            Self::FieldTooLong => write!(f, "field exceeds capacity"),
            Self::InvalidUtf8 => write!(f, "field is not valid UTF-8"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
