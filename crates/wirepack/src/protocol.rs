//! # Protocol Interface
//!
//! The encode/decode surface every protocol variant implements. Structured
//! values are written as a sequence of begin/end markers, headers and scalars;
//! a variant decides which of those produce bytes.
//!
//! Both traits are object-safe so that processors, skip and generated code can
//! work against `&mut dyn InputProtocol` / `&mut dyn OutputProtocol`.

use crate::error::Result;
use crate::types::FieldHeader;
use crate::types::ListHeader;
use crate::types::MapHeader;
use crate::types::MessageHeader;
use crate::types::SetHeader;

pub trait OutputProtocol {
    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<()>;
    fn write_message_end(&mut self) -> Result<()>;
    /// `name` is diagnostic only.
    fn write_struct_begin(&mut self, name: &str) -> Result<()>;
    fn write_struct_end(&mut self) -> Result<()>;
    fn write_field_begin(&mut self, header: &FieldHeader) -> Result<()>;
    fn write_field_end(&mut self) -> Result<()>;
    fn write_field_stop(&mut self) -> Result<()>;
    fn write_map_begin(&mut self, header: &MapHeader) -> Result<()>;
    fn write_map_end(&mut self) -> Result<()>;
    fn write_list_begin(&mut self, header: &ListHeader) -> Result<()>;
    fn write_list_end(&mut self) -> Result<()>;
    fn write_set_begin(&mut self, header: &SetHeader) -> Result<()>;
    fn write_set_end(&mut self) -> Result<()>;

    fn write_bool(&mut self, v: bool) -> Result<()>;
    fn write_byte(&mut self, v: i8) -> Result<()>;
    fn write_i16(&mut self, v: i16) -> Result<()>;
    fn write_i32(&mut self, v: i32) -> Result<()>;
    fn write_i64(&mut self, v: i64) -> Result<()>;
    fn write_double(&mut self, v: f64) -> Result<()>;
    fn write_string(&mut self, v: &str) -> Result<()>;
    fn write_binary(&mut self, v: &[u8]) -> Result<()>;

    /// Delivers everything written so far to the peer.
    fn flush(&mut self) -> Result<()>;
}

pub trait InputProtocol {
    fn read_message_begin(&mut self) -> Result<MessageHeader>;
    fn read_message_end(&mut self) -> Result<()>;
    fn read_struct_begin(&mut self) -> Result<()>;
    fn read_struct_end(&mut self) -> Result<()>;
    /// Returns a header whose type is `Stop` when the struct ends.
    fn read_field_begin(&mut self) -> Result<FieldHeader>;
    fn read_field_end(&mut self) -> Result<()>;
    fn read_map_begin(&mut self) -> Result<MapHeader>;
    fn read_map_end(&mut self) -> Result<()>;
    fn read_list_begin(&mut self) -> Result<ListHeader>;
    fn read_list_end(&mut self) -> Result<()>;
    fn read_set_begin(&mut self) -> Result<SetHeader>;
    fn read_set_end(&mut self) -> Result<()>;

    fn read_bool(&mut self) -> Result<bool>;
    fn read_byte(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_binary(&mut self) -> Result<Vec<u8>>;
}

/// Settings for a protocol instance.
///
/// The defaults are strict in both directions with no length limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Reject unversioned envelopes.
    pub strict_read: bool,
    /// Write versioned envelopes.
    pub strict_write: bool,
    /// Upper bound for string and binary lengths on read.
    pub string_limit: Option<usize>,
    /// Upper bound for container element counts on read.
    pub container_limit: Option<usize>,
}

impl ProtocolConfig {
    /// Accepts both envelope forms, writes the versioned one.
    pub fn lenient() -> Self {
        Self { strict_read: false, ..Self::default() }
    }

    pub fn strict_read(mut self, strict: bool) -> Self {
        self.strict_read = strict;
        self
    }

    pub fn strict_write(mut self, strict: bool) -> Self {
        self.strict_write = strict;
        self
    }

    pub fn string_limit(mut self, limit: usize) -> Self {
        self.string_limit = Some(limit);
        self
    }

    pub fn container_limit(mut self, limit: usize) -> Self {
        self.container_limit = Some(limit);
        self
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            strict_read: true,
            strict_write: true,
            string_limit: None,
            container_limit: None,
        }
    }
}
