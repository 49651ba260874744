//! # Wirepack
//!
//! A strictly framed, big-endian binary protocol for typed structured values.
//!
//! ## Philosophy
//!
//! - **Field ids, not names**: a struct field is identified on the wire by its id alone,
//!   so renaming is free and changing an id is a breaking change.
//! - **Skippable**: every value can be consumed knowing only its wire type. Readers
//!   built against an older schema step over what they do not understand.
//! - **Unbuffered**: the protocol writes straight through to its `Transport`. Buffering,
//!   if any, belongs to the transport, and `flush` is the delivery boundary.
//!
//! ## Layers
//!
//! - `types`: `WireType`, `MessageKind` and the ephemeral headers.
//! - `transport`: the byte-stream contract, plus memory and shared handles; `socket` for TCP.
//! - `protocol`: the object-safe `InputProtocol` / `OutputProtocol` interface.
//! - `binary`: `BinaryProtocol`, the one concrete encoding.
//! - `skip`, `value`, `codec`: schema-less skipping, dynamic values, typed values.

pub mod binary;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod skip;
pub mod socket;
pub mod transport;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;

pub use binary::BinaryProtocol;
pub use codec::Empty;
pub use codec::Wire;
pub use codec::read_field_into;
pub use codec::read_fields;
pub use codec::write_field;
pub use codec::write_optional_field;
pub use error::Error;
pub use error::Result;
pub use protocol::InputProtocol;
pub use protocol::OutputProtocol;
pub use protocol::ProtocolConfig;
pub use skip::skip;
pub use socket::ServerSocket;
pub use socket::Socket;
pub use transport::MemoryTransport;
pub use transport::ServerTransport;
pub use transport::SharedTransport;
pub use transport::Transport;
pub use transport::TransportError;
pub use transport::TransportErrorKind;
pub use types::FieldHeader;
pub use types::ListHeader;
pub use types::MapHeader;
pub use types::MessageHeader;
pub use types::MessageKind;
pub use types::SetHeader;
pub use types::WireType;
pub use value::Value;
pub use value::read_value;
pub use value::write_value;
