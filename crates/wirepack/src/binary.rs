//! # Binary Protocol
//!
//! The fixed-width, big-endian encoding.
//!
//! ## Format
//!
//! - **Scalars**: bool as one byte `0`/`1`; byte verbatim; i16/i32/i64 big-endian
//!   two's-complement; double as the big-endian IEEE-754 bit pattern.
//! - **Blobs**: `[Len: i32][Data: Len]`. No terminator.
//! - **Fields**: `[Type: 1b][Id: i16]`, or a single `0` byte (STOP) closing a struct.
//!   Struct begin/end write nothing.
//! - **Containers**: map `[KeyType: 1b][ValueType: 1b][Size: i32]`,
//!   list/set `[ElemType: 1b][Size: i32]`, followed by the elements.
//! - **Envelope**: strict `[0x80010000 | kind: i32][Name][Seq: i32]`,
//!   legacy `[Name][Kind: 1b][Seq: i32]`.
//!
//! The codec does not check that elements match their declared container types.

use crate::error::Error;
use crate::error::Result;
use crate::protocol::InputProtocol;
use crate::protocol::OutputProtocol;
use crate::protocol::ProtocolConfig;
use crate::transport::Transport;
use crate::types::FieldHeader;
use crate::types::ListHeader;
use crate::types::MapHeader;
use crate::types::MessageHeader;
use crate::types::MessageKind;
use crate::types::SetHeader;
use crate::types::WireType;

pub const VERSION_MASK: u32 = 0xffff_0000;
pub const VERSION_1: u32 = 0x8001_0000;
pub const KIND_MASK: u32 = 0x0000_00ff;

/// Largest allocation made ahead of the bytes that fill it.
const READ_CHUNK: usize = 64 * 1024;

/// Binary codec bound to one transport for the lifetime of a connection.
pub struct BinaryProtocol<T> {
    transport: T,
    config: ProtocolConfig,
}

impl<T: Transport> BinaryProtocol<T> {
    /// Creates a strict protocol over `transport`.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ProtocolConfig::default())
    }

    pub fn with_config(transport: T, config: ProtocolConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write_all(bytes)?;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| Error::SizeLimit { size: len, limit: i32::MAX as usize })?;
        self.write_i32(len)
    }

    fn write_type(&mut self, wire_type: WireType) -> Result<()> {
        self.write_raw(&[wire_type as u8])
    }

    fn read_type(&mut self) -> Result<WireType> {
        let [b] = self.read_array::<1>()?;
        WireType::from_u8(b).ok_or(Error::InvalidWireType(b))
    }

    /// Reads a length prefix and validates it against `limit` before anything is allocated.
    fn read_len(&mut self, limit: Option<usize>) -> Result<usize> {
        let raw = self.read_i32()?;
        Self::check_len(raw, limit)
    }

    fn check_len(raw: i32, limit: Option<usize>) -> Result<usize> {
        if raw < 0 {
            return Err(Error::NegativeSize(raw));
        }
        let size = raw as usize;
        match limit {
            Some(limit) if size > limit => Err(Error::SizeLimit { size, limit }),
            _ => Ok(size),
        }
    }

    /// Grows the buffer as bytes arrive, so a length prefix alone never reserves more
    /// than `READ_CHUNK`.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
        while buf.len() < len {
            let start = buf.len();
            let end = len.min(start + READ_CHUNK);
            buf.resize(end, 0);
            self.transport.read_exact(&mut buf[start..end])?;
        }
        Ok(buf)
    }

    fn read_kind(&mut self, b: u8) -> Result<MessageKind> {
        MessageKind::from_u8(b).ok_or(Error::InvalidMessageKind(b))
    }
}

impl<T: Transport> OutputProtocol for BinaryProtocol<T> {
    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<()> {
        if self.config.strict_write {
            self.write_i32((VERSION_1 | header.kind as u32) as i32)?;
            self.write_string(&header.name)?;
        } else {
            self.write_string(&header.name)?;
            self.write_raw(&[header.kind as u8])?;
        }
        self.write_i32(header.seq)
    }

    fn write_message_end(&mut self) -> Result<()> { Ok(()) }
    fn write_struct_begin(&mut self, _name: &str) -> Result<()> { Ok(()) }
    fn write_struct_end(&mut self) -> Result<()> { Ok(()) }

    fn write_field_begin(&mut self, header: &FieldHeader) -> Result<()> {
        self.write_type(header.wire_type)?;
        self.write_i16(header.id)
    }

    fn write_field_end(&mut self) -> Result<()> { Ok(()) }

    fn write_field_stop(&mut self) -> Result<()> {
        self.write_type(WireType::Stop)
    }

    fn write_map_begin(&mut self, header: &MapHeader) -> Result<()> {
        self.write_type(header.key_type)?;
        self.write_type(header.value_type)?;
        self.write_len(header.size)
    }

    fn write_map_end(&mut self) -> Result<()> { Ok(()) }

    fn write_list_begin(&mut self, header: &ListHeader) -> Result<()> {
        self.write_type(header.element_type)?;
        self.write_len(header.size)
    }

    fn write_list_end(&mut self) -> Result<()> { Ok(()) }

    fn write_set_begin(&mut self, header: &SetHeader) -> Result<()> {
        self.write_list_begin(header)
    }

    fn write_set_end(&mut self) -> Result<()> { Ok(()) }

    fn write_bool(&mut self, v: bool) -> Result<()> { self.write_raw(&[v as u8]) }
    fn write_byte(&mut self, v: i8) -> Result<()> { self.write_raw(&v.to_be_bytes()) }
    fn write_i16(&mut self, v: i16) -> Result<()> { self.write_raw(&v.to_be_bytes()) }
    fn write_i32(&mut self, v: i32) -> Result<()> { self.write_raw(&v.to_be_bytes()) }
    fn write_i64(&mut self, v: i64) -> Result<()> { self.write_raw(&v.to_be_bytes()) }
    fn write_double(&mut self, v: f64) -> Result<()> { self.write_raw(&v.to_bits().to_be_bytes()) }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        self.write_len(v.len())?;
        self.write_raw(v)
    }

    fn flush(&mut self) -> Result<()> {
        self.transport.flush()?;
        Ok(())
    }
}

impl<T: Transport> InputProtocol for BinaryProtocol<T> {
    /// The sign of the first four bytes decides the envelope form.
    fn read_message_begin(&mut self) -> Result<MessageHeader> {
        let size = self.read_i32()?;
        if size < 0 {
            let version = size as u32 & VERSION_MASK;
            if version != VERSION_1 {
                return Err(Error::BadVersion(version));
            }
            let kind = self.read_kind((size as u32 & KIND_MASK) as u8)?;
            let name = self.read_string()?;
            let seq = self.read_i32()?;
            Ok(MessageHeader { name, kind, seq })
        } else {
            if self.config.strict_read {
                return Err(Error::MissingVersion);
            }
            let len = Self::check_len(size, self.config.string_limit)?;
            let name = String::from_utf8(self.read_bytes(len)?).map_err(|_| Error::InvalidUtf8)?;
            let [b] = self.read_array::<1>()?;
            let kind = self.read_kind(b)?;
            let seq = self.read_i32()?;
            Ok(MessageHeader { name, kind, seq })
        }
    }

    fn read_message_end(&mut self) -> Result<()> { Ok(()) }
    fn read_struct_begin(&mut self) -> Result<()> { Ok(()) }
    fn read_struct_end(&mut self) -> Result<()> { Ok(()) }

    fn read_field_begin(&mut self) -> Result<FieldHeader> {
        let wire_type = self.read_type()?;
        if wire_type == WireType::Stop {
            return Ok(FieldHeader::stop());
        }
        let id = self.read_i16()?;
        Ok(FieldHeader { wire_type, id })
    }

    fn read_field_end(&mut self) -> Result<()> { Ok(()) }

    fn read_map_begin(&mut self) -> Result<MapHeader> {
        let key_type = self.read_type()?;
        let value_type = self.read_type()?;
        let size = self.read_len(self.config.container_limit)?;
        Ok(MapHeader { key_type, value_type, size })
    }

    fn read_map_end(&mut self) -> Result<()> { Ok(()) }

    fn read_list_begin(&mut self) -> Result<ListHeader> {
        let element_type = self.read_type()?;
        let size = self.read_len(self.config.container_limit)?;
        Ok(ListHeader { element_type, size })
    }

    fn read_list_end(&mut self) -> Result<()> { Ok(()) }

    fn read_set_begin(&mut self) -> Result<SetHeader> {
        self.read_list_begin()
    }

    fn read_set_end(&mut self) -> Result<()> { Ok(()) }

    fn read_bool(&mut self) -> Result<bool> {
        let [b] = self.read_array::<1>()?;
        Ok(b != 0)
    }

    fn read_byte(&mut self) -> Result<i8> { Ok(i8::from_be_bytes(self.read_array()?)) }
    fn read_i16(&mut self) -> Result<i16> { Ok(i16::from_be_bytes(self.read_array()?)) }
    fn read_i32(&mut self) -> Result<i32> { Ok(i32::from_be_bytes(self.read_array()?)) }
    fn read_i64(&mut self) -> Result<i64> { Ok(i64::from_be_bytes(self.read_array()?)) }
    fn read_double(&mut self) -> Result<f64> { Ok(f64::from_bits(u64::from_be_bytes(self.read_array()?))) }

    fn read_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_binary()?).map_err(|_| Error::InvalidUtf8)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len(self.config.string_limit)?;
        self.read_bytes(len)
    }
}
