//! # Dynamic Values
//!
//! A schema-less tree mirroring the wire model one to one. Reading needs only the
//! wire type, which makes `Value` the natural carrier for tooling, proxies and tests
//! that do not know the schema.
//!
//! ## Invariants
//! - Containers carry their declared element types, so empty containers round-trip exactly.
//! - Recursion is bounded by `MAX_VALUE_DEPTH`.

use crate::error::Error;
use crate::error::Result;
use crate::protocol::InputProtocol;
use crate::protocol::OutputProtocol;
use crate::types::FieldHeader;
use crate::types::ListHeader;
use crate::types::MapHeader;
use crate::types::WireType;

/// The maximum nesting depth for Values before failing.
pub const MAX_VALUE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    /// A STRING payload that is valid UTF-8.
    String(String),
    /// A STRING payload that is not valid UTF-8.
    Binary(Vec<u8>),
    /// Fields in wire order.
    Struct(Vec<(i16, Value)>),
    Map { key_type: WireType, value_type: WireType, entries: Vec<(Value, Value)> },
    Set { element_type: WireType, items: Vec<Value> },
    List { element_type: WireType, items: Vec<Value> },
}

impl Value {
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Bool(_) => WireType::Bool,
            Value::Byte(_) => WireType::Byte,
            Value::I16(_) => WireType::I16,
            Value::I32(_) => WireType::I32,
            Value::I64(_) => WireType::I64,
            Value::Double(_) => WireType::Double,
            Value::String(_) | Value::Binary(_) => WireType::String,
            Value::Struct(_) => WireType::Struct,
            Value::Map { .. } => WireType::Map,
            Value::Set { .. } => WireType::Set,
            Value::List { .. } => WireType::List,
        }
    }

    /// Looks up a struct field by id.
    pub fn field(&self, id: i16) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(fid, _)| *fid == id).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::I32(v) }
}

/// Encodes a `Value` into the output stream.
///
/// # Errors
/// Returns `Error::DepthLimitExceeded` if the value is too deeply nested.
pub fn write_value(out: &mut dyn OutputProtocol, value: &Value) -> Result<()> {
    write_value_impl(out, value, 0)
}

fn write_value_impl(out: &mut dyn OutputProtocol, value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_VALUE_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }

    match value {
        Value::Bool(v) => out.write_bool(*v)?,
        Value::Byte(v) => out.write_byte(*v)?,
        Value::I16(v) => out.write_i16(*v)?,
        Value::I32(v) => out.write_i32(*v)?,
        Value::I64(v) => out.write_i64(*v)?,
        Value::Double(v) => out.write_double(*v)?,
        Value::String(v) => out.write_string(v)?,
        Value::Binary(v) => out.write_binary(v)?,
        Value::Struct(fields) => {
            out.write_struct_begin("Value")?;
            for (id, field) in fields {
                out.write_field_begin(&FieldHeader::new(field.wire_type(), *id))?;
                write_value_impl(out, field, depth + 1)?;
                out.write_field_end()?;
            }
            out.write_field_stop()?;
            out.write_struct_end()?;
        },
        Value::Map { key_type, value_type, entries } => {
            out.write_map_begin(&MapHeader::new(*key_type, *value_type, entries.len()))?;
            for (k, v) in entries {
                write_value_impl(out, k, depth + 1)?;
                write_value_impl(out, v, depth + 1)?;
            }
            out.write_map_end()?;
        },
        Value::Set { element_type, items } => {
            out.write_set_begin(&ListHeader::new(*element_type, items.len()))?;
            for item in items {
                write_value_impl(out, item, depth + 1)?;
            }
            out.write_set_end()?;
        },
        Value::List { element_type, items } => {
            out.write_list_begin(&ListHeader::new(*element_type, items.len()))?;
            for item in items {
                write_value_impl(out, item, depth + 1)?;
            }
            out.write_list_end()?;
        },
    }
    Ok(())
}

/// Decodes one value of type `wire_type`.
///
/// # Errors
/// Returns `Error::UnexpectedType` for `Stop` and `Void`, which carry no value.
pub fn read_value(input: &mut dyn InputProtocol, wire_type: WireType) -> Result<Value> {
    read_value_impl(input, wire_type, 0)
}

fn read_value_impl(input: &mut dyn InputProtocol, wire_type: WireType, depth: usize) -> Result<Value> {
    if depth > MAX_VALUE_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }

    let value = match wire_type {
        WireType::Bool => Value::Bool(input.read_bool()?),
        WireType::Byte => Value::Byte(input.read_byte()?),
        WireType::I16 => Value::I16(input.read_i16()?),
        WireType::I32 => Value::I32(input.read_i32()?),
        WireType::I64 => Value::I64(input.read_i64()?),
        WireType::Double => Value::Double(input.read_double()?),
        WireType::String => {
            let bytes = input.read_binary()?;
            match String::from_utf8(bytes) {
                Ok(s) => Value::String(s),
                Err(e) => Value::Binary(e.into_bytes()),
            }
        },
        WireType::Struct => {
            input.read_struct_begin()?;
            let mut fields = Vec::new();
            loop {
                let field = input.read_field_begin()?;
                if field.is_stop() {
                    break;
                }
                fields.push((field.id, read_value_impl(input, field.wire_type, depth + 1)?));
                input.read_field_end()?;
            }
            input.read_struct_end()?;
            Value::Struct(fields)
        },
        WireType::Map => {
            let header = input.read_map_begin()?;
            let mut entries = Vec::with_capacity(header.size.min(1024));
            for _ in 0..header.size {
                let k = read_value_impl(input, header.key_type, depth + 1)?;
                let v = read_value_impl(input, header.value_type, depth + 1)?;
                entries.push((k, v));
            }
            input.read_map_end()?;
            Value::Map { key_type: header.key_type, value_type: header.value_type, entries }
        },
        WireType::Set => {
            let header = input.read_set_begin()?;
            let items = read_items(input, header.element_type, header.size, depth)?;
            input.read_set_end()?;
            Value::Set { element_type: header.element_type, items }
        },
        WireType::List => {
            let header = input.read_list_begin()?;
            let items = read_items(input, header.element_type, header.size, depth)?;
            input.read_list_end()?;
            Value::List { element_type: header.element_type, items }
        },
        WireType::Stop | WireType::Void => {
            return Err(Error::UnexpectedType { expected: WireType::Struct, found: wire_type });
        },
    };
    Ok(value)
}

fn read_items(input: &mut dyn InputProtocol, element_type: WireType, size: usize, depth: usize) -> Result<Vec<Value>> {
    // Size prefix is untrusted; cap the up-front allocation.
    let mut items = Vec::with_capacity(size.min(1024));
    for _ in 0..size {
        items.push(read_value_impl(input, element_type, depth + 1)?);
    }
    Ok(items)
}
