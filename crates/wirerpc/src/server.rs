//! # Server
//!
//! Accepts connections and runs each one through a `Processor` on its own worker.
//!
//! The accept loop runs on the thread that calls `serve`. Connections are served on
//! the blocking pool of a tokio runtime owned by the server, and a semaphore bounds
//! how many are served at once. A failed accept is retried after a pause that
//! doubles up to one second. A connection lives until the peer hangs up or a
//! connection-fatal error occurs; per-call failures leave it open.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::Semaphore;
use tracing::debug;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use wirepack::BinaryProtocol;
use wirepack::ProtocolConfig;
use wirepack::ServerTransport;
use wirepack::SharedTransport;
use wirepack::Transport;
use wirepack::TransportErrorKind;

use crate::error::Error;
use crate::error::Result;
use crate::processor::Processor;

/// First pause after a failed accept. Doubles with each further failure.
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Settings for a `Server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connections served concurrently. Further accepts wait for a slot.
    pub max_connections: usize,
    /// Upper bound on worker threads, shared by connections and timed handlers.
    pub blocking_threads: usize,
    /// Protocol settings applied to every connection.
    pub protocol: ProtocolConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            blocking_threads: 512,
            protocol: ProtocolConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = n;
        self
    }

    pub fn blocking_threads(mut self, n: usize) -> Self {
        self.blocking_threads = n;
        self
    }

    pub fn protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }
}

pub struct Server<S> {
    processor: Arc<Processor>,
    transport: S,
    config: ServerConfig,
}

impl<S: ServerTransport> Server<S> {
    pub fn new(processor: Arc<Processor>, transport: S) -> Self {
        Self { processor, transport, config: ServerConfig::default() }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Listens (unless already listening) and serves until the listener fails.
    ///
    /// Blocks the calling thread, which must not be inside a tokio runtime.
    /// Only returns with an error: `NotOpen` from the listener, or a runtime failure.
    /// Connections still being served when it returns are abandoned to finish on
    /// their own.
    pub fn serve(mut self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.config.blocking_threads.max(1))
            .thread_name("wirerpc-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let result = self.accept_loop(&runtime);
        runtime.shutdown_background();
        result
    }

    fn accept_loop(&mut self, runtime: &Runtime) -> Result<()> {
        if !self.transport.is_listening() {
            self.transport.listen()?;
        }
        info!(max_connections = self.config.max_connections, "listening");

        let slots = Arc::new(Semaphore::new(self.config.max_connections.max(1)));
        let mut next_id: u64 = 0;
        let mut backoff = ACCEPT_BACKOFF_MIN;

        loop {
            let permit = runtime
                .block_on(Arc::clone(&slots).acquire_owned())
                .map_err(|e| Error::Runtime(e.to_string()))?;

            let connection = match self.transport.accept() {
                Ok(connection) => connection,
                Err(e) if e.kind() == TransportErrorKind::NotOpen => {
                    warn!(error = %e, "listener closed");
                    return Err(e.into());
                },
                Err(e) => {
                    warn!(error = %e, ?backoff, "accept failed");
                    drop(permit);
                    runtime.block_on(tokio::time::sleep(backoff));
                    backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                    continue;
                },
            };
            backoff = ACCEPT_BACKOFF_MIN;

            next_id += 1;
            let id = next_id;
            let processor = Arc::clone(&self.processor);
            let protocol = self.config.protocol.clone();
            runtime.spawn_blocking(move || {
                let _permit = permit;
                let span = info_span!("connection", id);
                let _enter = span.enter();
                debug!("accepted");
                serve_connection(&processor, connection, protocol);
            });
        }
    }
}

/// Processes messages until the connection ends, then closes it.
fn serve_connection<T: Transport>(processor: &Processor, connection: T, config: ProtocolConfig) {
    let (input, output) = SharedTransport::pair(connection);
    let mut input = BinaryProtocol::with_config(input, config.clone());
    let mut output = BinaryProtocol::with_config(output, config);

    loop {
        match processor.process(&mut input, &mut output) {
            Ok(()) => {},
            Err(e) if !e.is_connection_fatal() => debug!(error = %e, "call failed"),
            Err(e) if e.is_end_of_file() => {
                debug!("peer disconnected");
                break;
            },
            Err(e) => {
                warn!(error = %e, "closing connection");
                break;
            },
        }
    }

    if let Err(e) = input.transport_mut().close() {
        debug!(error = %e, "close failed");
    }
}
