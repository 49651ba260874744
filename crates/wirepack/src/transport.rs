//! # Transport Abstraction
//!
//! A minimal, blocking interface for moving bytes over an ordered stream.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: A Transport knows nothing about envelopes, fields or wire types.
//! - **Exact Reads**: `read_exact` fills the whole buffer or fails. There are no short reads.
//! - **Flush is a Boundary**: once `flush` returns, everything written before it has been
//!   handed to the peer. Buffering implementations must drain on flush.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Closed set of transport failure kinds. The codes are shared with the wire exception.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Unknown = 0,
    NotOpen = 1,
    AlreadyOpen = 2,
    TimedOut = 3,
    EndOfFile = 4,
}

impl TransportErrorKind {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::NotOpen),
            2 => Some(Self::AlreadyOpen),
            3 => Some(Self::TimedOut),
            4 => Some(Self::EndOfFile),
            _ => None,
        }
    }
}

/// Errors that occur at the byte-stream layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn not_open(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NotOpen, message)
    }

    pub fn end_of_file(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::EndOfFile, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let kind = match e.kind() {
            ErrorKind::UnexpectedEof => TransportErrorKind::EndOfFile,
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportErrorKind::TimedOut,
            ErrorKind::NotConnected => TransportErrorKind::NotOpen,
            _ => TransportErrorKind::Unknown,
        };
        Self::new(kind, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// An ordered, blocking, point-to-point byte stream.
///
/// # Invariants
/// - `read_exact` either fills `buf` completely or returns an error.
/// - `write_all` may buffer; `flush` must deliver everything written so far.
pub trait Transport {
    fn open(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// A transport that accepts new point-to-point connections.
pub trait ServerTransport {
    type Connection: Transport + Send + 'static;

    /// Binds and begins accepting.
    fn listen(&mut self) -> Result<()>;
    fn is_listening(&self) -> bool;
    /// Blocks until a new connection arrives.
    fn accept(&mut self) -> Result<Self::Connection>;
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> { (**self).open() }
    fn close(&mut self) -> Result<()> { (**self).close() }
    fn is_open(&self) -> bool { (**self).is_open() }
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> { (**self).read_exact(buf) }
    fn write_all(&mut self, buf: &[u8]) -> Result<()> { (**self).write_all(buf) }
    fn flush(&mut self) -> Result<()> { (**self).flush() }
}

// ============================================================================
//  IN-MEMORY TRANSPORT
// ============================================================================

/// A transport over two in-memory buffers: reads drain `input`, writes append to `output`.
///
/// Useful for serializing values to bytes and for driving a processor without sockets.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    input: Vec<u8>,
    pos: usize,
    output: Vec<u8>,
    open: bool,
}

impl MemoryTransport {
    /// Creates an open transport with nothing to read.
    pub fn new() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Creates an open transport whose reads yield `input`.
    pub fn from_bytes(input: impl Into<Vec<u8>>) -> Self {
        Self { input: input.into(), pos: 0, output: Vec::new(), open: true }
    }

    /// Appends bytes to the unread input.
    pub fn extend_input(&mut self, bytes: &[u8]) {
        self.input.extend_from_slice(bytes);
    }

    /// Number of input bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Takes the written bytes, leaving the output empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::not_open("memory transport is closed"));
        }
        if buf.len() > self.remaining() {
            return Err(TransportError::end_of_file(format!(
                "wanted {} bytes, {} remaining",
                buf.len(),
                self.remaining()
            )));
        }
        buf.copy_from_slice(&self.input[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::not_open("memory transport is closed"));
        }
        self.output.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
//  SHARED HANDLES
// ============================================================================

/// A handle onto a transport owned jointly by several protocol instances on one thread.
///
/// A connection is wrapped as both an input and an output protocol; each needs
/// its own `Transport`. Clones refer to the same underlying stream.
pub struct SharedTransport<T> {
    inner: Rc<RefCell<T>>,
}

impl<T: Transport> SharedTransport<T> {
    pub fn new(transport: T) -> Self {
        Self { inner: Rc::new(RefCell::new(transport)) }
    }

    /// Splits one transport into two handles, typically (input, output).
    pub fn pair(transport: T) -> (Self, Self) {
        let a = Self::new(transport);
        let b = a.clone();
        (a, b)
    }

    /// Runs `f` with exclusive access to the underlying transport.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<T> Clone for SharedTransport<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Transport> Transport for SharedTransport<T> {
    fn open(&mut self) -> Result<()> { self.inner.borrow_mut().open() }
    fn close(&mut self) -> Result<()> { self.inner.borrow_mut().close() }
    fn is_open(&self) -> bool { self.inner.borrow().is_open() }
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> { self.inner.borrow_mut().read_exact(buf) }
    fn write_all(&mut self, buf: &[u8]) -> Result<()> { self.inner.borrow_mut().write_all(buf) }
    fn flush(&mut self) -> Result<()> { self.inner.borrow_mut().flush() }
}
