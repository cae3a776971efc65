//! Error types for the box codec.
//!
//! - [`EncodingError`]: a box cannot be represented on the wire. Raised before
//!   any bytes are produced, so no partial box is ever written.
//! - [`FramingError`]: received bytes do not form a valid box.
//! - [`EofError`]: the stream ended, either cleanly between boxes or inside one.
//! - [`CodecError`]: the top-level wrapper, including transport I/O failures.

use std::{fmt, io};

use thiserror::Error;

/// Which half of a key/value pair a frame carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePart {
    /// A key frame.
    Key,
    /// A value frame.
    Value,
}

impl fmt::Display for FramePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Value => f.write_str("value"),
        }
    }
}

/// A box that cannot be serialized.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// A zero-length key would be read back as the box terminator.
    #[error("box keys must not be empty")]
    EmptyKey,

    /// Key longer than the configured maximum.
    #[error("key {key:?} has length {len}, longer than max length {max}")]
    KeyTooLong {
        /// Offending key.
        key: String,
        /// Key length in bytes.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Value longer than the configured maximum.
    #[error("value for key {key:?} has length {len}, longer than max length {max}")]
    ValueTooLong {
        /// Key the value is stored under.
        key: String,
        /// Value length in bytes.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// Received bytes that do not form a valid box.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// An in-memory buffer too short to hold even a terminator.
    #[error("serialized box length was {len}, shorter than two bytes")]
    BufferTooShort {
        /// Buffer length.
        len: usize,
    },

    /// Frame bytes are not valid UTF-8.
    #[error("{part} is not a valid utf-8 string")]
    InvalidUtf8 {
        /// Whether the key or the value was malformed.
        part: FramePart,
    },

    /// Frame length exceeds the configured maximum.
    #[error("{part} frame of length {len} exceeds max length {max}")]
    Oversized {
        /// Whether the key or the value was too long.
        part: FramePart,
        /// Length announced by the prefix.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// End-of-stream conditions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The stream ended between boxes.
    #[error("stream closed cleanly at box boundary")]
    CleanClose,

    /// The stream ended inside a box.
    #[error("premature EOF: stream closed after {bytes_received} bytes of an unterminated box")]
    MidBox {
        /// Bytes of the partial box received before EOF.
        bytes_received: usize,
    },
}

/// Top-level codec error.
///
/// # Examples
///
/// ```
/// use ampframe::codec::{CodecError, EofError};
///
/// assert!(CodecError::Eof(EofError::CleanClose).is_clean_close());
/// assert!(!CodecError::Eof(EofError::MidBox { bytes_received: 3 }).is_clean_close());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// The box could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The received bytes are malformed.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End of stream.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns `true` if the peer closed the stream between boxes.
    #[must_use]
    pub fn is_clean_close(&self) -> bool { matches!(self, Self::Eof(EofError::CleanClose)) }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(inner) => inner,
            CodecError::Encoding(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            CodecError::Framing(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            CodecError::Eof(_) => io::Error::new(io::ErrorKind::UnexpectedEof, err),
        }
    }
}
