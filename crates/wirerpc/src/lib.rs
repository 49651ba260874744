//! # Wirerpc
//!
//! Request/response RPC over the `wirepack` binary protocol.
//!
//! ## Architecture
//!
//! A call is one envelope (method name, kind, sequence id) followed by an argument
//! struct. The reply echoes name and sequence id and carries either a result struct
//! or an `ApplicationException`. The `Processor` owns the server side of that
//! exchange, the `Server` feeds it connections, and the `Client` drives it from
//! the other end.
//!
//! ## Failure Model
//!
//! - Per-call failures are answered on the wire and leave the connection usable.
//! - Codec and transport failures end the connection.
//! - Handler failures outside a method's declared exceptions surface as
//!   `ApplicationException` of kind `Unknown`; panics and timeouts as `InternalError`.

pub mod client;
pub mod error;
pub mod exception;
pub mod processor;
pub mod result;
pub mod server;


pub use client::Client;
pub use error::Error;
pub use error::HandlerError;
pub use error::Result;
pub use exception::ApplicationErrorKind;
pub use exception::ApplicationException;
pub use exception::Exception;
pub use exception::ExceptionKind;
pub use exception::TransportException;
pub use processor::Processor;
pub use result::MethodResult;
pub use result::NoException;
pub use result::Throws;
pub use server::Server;
pub use server::ServerConfig;
