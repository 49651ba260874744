//! # Error Definitions
//!
//! Failures are sorted by blast radius. An `Application` error spoils one call and
//! has already been answered on the wire; everything else spoils the connection.

use crate::exception::ApplicationException;
use wirepack::TransportError;

/// RPC-level failures.
#[derive(Debug, Clone)]
pub enum Error {
    /// Encoding, decoding or transport failed. The stream cannot be trusted any more.
    Protocol(wirepack::Error),
    /// A single call failed; the connection remains usable.
    Application(ApplicationException),
    /// The server's worker runtime could not be built or driven.
    Runtime(String),
}

impl Error {
    /// True when the connection must be torn down.
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(self, Error::Application(_))
    }

    /// True when the peer hung up between messages.
    pub fn is_end_of_file(&self) -> bool {
        matches!(self, Error::Protocol(e) if e.is_end_of_file())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Protocol(e) => write!(f, "protocol: {}", e),
            Error::Application(e) => write!(f, "application: {}", e),
            Error::Runtime(msg) => write!(f, "runtime: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Protocol(e) => Some(e),
            Error::Application(e) => Some(e),
            Error::Runtime(_) => None,
        }
    }
}

impl From<wirepack::Error> for Error {
    fn from(e: wirepack::Error) -> Self { Self::Protocol(e) }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self { Self::Protocol(e.into()) }
}

impl From<ApplicationException> for Error {
    fn from(e: ApplicationException) -> Self { Self::Application(e) }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a handler may fail with.
///
/// `Declared` exceptions are part of the method's signature and travel inside the
/// result struct. A `Fault` is anything else, and the caller sees it as an
/// `ApplicationException` of kind `Unknown`.
#[derive(Debug)]
pub enum HandlerError<E> {
    Declared(E),
    Fault(Box<dyn std::error::Error + Send + Sync>),
}

impl<E> HandlerError<E> {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into().into())
    }
}

impl<E> From<E> for HandlerError<E> {
    fn from(e: E) -> Self { Self::Declared(e) }
}
