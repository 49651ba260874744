//! # TCP Transports
//!
//! Blocking TCP realizations of the transport contract: a buffered client
//! `Socket` and a listening `ServerSocket` that hands out connected `Socket`s.

use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::net::Shutdown;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::time::Duration;

use crate::transport::Result;
use crate::transport::ServerTransport;
use crate::transport::Transport;
use crate::transport::TransportError;
use crate::transport::TransportErrorKind;

struct Stream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Stream {
    fn new(stream: TcpStream, timeout: Option<Duration>) -> Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { reader, writer: BufWriter::new(stream) })
    }
}

/// A buffered TCP client connection.
///
/// Writes are buffered until `flush`; reads are buffered internally.
pub struct Socket {
    addr: Option<String>,
    timeout: Option<Duration>,
    stream: Option<Stream>,
}

impl Socket {
    /// Creates a closed socket that connects to `addr` on `open`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: Some(addr.into()), timeout: None, stream: None }
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        Ok(Self { addr: None, timeout: None, stream: Some(Stream::new(stream, None)?) })
    }

    /// Bounds every blocking read and write. Expiry surfaces as `TimedOut`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.writer.get_ref().peer_addr().ok())
    }

    fn stream(&mut self) -> Result<&mut Stream> {
        self.stream.as_mut().ok_or_else(|| TransportError::not_open("socket is not open"))
    }
}

impl Transport for Socket {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(TransportError::new(TransportErrorKind::AlreadyOpen, "socket already open"));
        }
        let addr = self.addr.as_deref().ok_or_else(|| TransportError::not_open("socket has no address"))?;
        let stream = TcpStream::connect(addr)?;
        self.stream = Some(Stream::new(stream, self.timeout)?);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            let flushed = stream.writer.flush();
            // The peer may already be gone; shutting down a dead socket is not an error.
            let _ = stream.writer.get_ref().shutdown(Shutdown::Both);
            flushed?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream()?.reader.read_exact(buf)?;
        Ok(())
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.stream()?.writer.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stream()?.writer.flush()?;
        Ok(())
    }
}

/// A listening TCP socket.
pub struct ServerSocket {
    addr: String,
    timeout: Option<Duration>,
    listener: Option<TcpListener>,
}

impl ServerSocket {
    /// Creates a socket that binds `addr` on `listen`. Port 0 picks a free port.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), timeout: None, listener: None }
    }

    /// Read/write timeout applied to every accepted connection.
    pub fn with_client_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The bound address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}

impl ServerTransport for ServerSocket {
    type Connection = Socket;

    fn listen(&mut self) -> Result<()> {
        if self.listener.is_some() {
            return Err(TransportError::new(TransportErrorKind::AlreadyOpen, "already listening"));
        }
        self.listener = Some(TcpListener::bind(&self.addr)?);
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn accept(&mut self) -> Result<Socket> {
        let listener = self.listener.as_ref().ok_or_else(|| TransportError::not_open("server socket is not listening"))?;
        let (stream, _) = listener.accept()?;
        Ok(Socket {
            addr: None,
            timeout: self.timeout,
            stream: Some(Stream::new(stream, self.timeout)?),
        })
    }

    fn close(&mut self) -> Result<()> {
        self.listener = None;
        Ok(())
    }
}
