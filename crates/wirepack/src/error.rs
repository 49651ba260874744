//! # Error Definitions
//!
//! Every failure the codec can raise. Transport failures travel inside
//! `Error::Transport`; everything else means the byte stream can no longer be trusted.

use crate::transport::TransportError;
use crate::transport::TransportErrorKind;
use crate::types::WireType;

/// Wirepack serialization and deserialization errors.
#[derive(Debug, Clone)]
pub enum Error {
    /// The underlying byte stream failed.
    Transport(TransportError),
    /// A versioned envelope carried a version other than the one this codec speaks.
    BadVersion(u32),
    /// A strict reader received an unversioned (legacy) envelope.
    MissingVersion,
    /// Byte does not correspond to an assigned `WireType`.
    InvalidWireType(u8),
    /// Byte does not correspond to a `MessageKind`.
    InvalidMessageKind(u8),
    /// A length prefix was negative.
    NegativeSize(i32),
    /// A length exceeded the configured limit or does not fit in an i32.
    SizeLimit { size: usize, limit: usize },
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// A container or field carried a different wire type than the reader expects.
    UnexpectedType { expected: WireType, found: WireType },
    /// The nested depth of a value exceeded the safety limit.
    DepthLimitExceeded,
}

impl Error {
    /// True when the peer closed the stream cleanly between values.
    pub fn is_end_of_file(&self) -> bool {
        matches!(self, Error::Transport(e) if e.kind() == TransportErrorKind::EndOfFile)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport: {}", e),
            Error::BadVersion(v) => write!(f, "bad version in message header: {:#010x}", v),
            Error::MissingVersion => write!(f, "missing version in message header"),
            Error::InvalidWireType(b) => write!(f, "invalid wire type byte: {:#04x}", b),
            Error::InvalidMessageKind(b) => write!(f, "invalid message kind byte: {:#04x}", b),
            Error::NegativeSize(n) => write!(f, "negative length prefix: {}", n),
            Error::SizeLimit { size, limit } => write!(f, "length {} exceeds limit {}", size, limit),
            Error::UnexpectedType { expected, found } => {
                write!(f, "unexpected wire type: expected {:?}, found {:?}", expected, found)
            }
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self { Self::Transport(e) }
}

/// Specialized `Result` for wirepack operations.
pub type Result<T> = std::result::Result<T, Error>;
