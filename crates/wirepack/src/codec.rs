//! # Typed Codec
//!
//! `Wire` ties a Rust type to one wire type and knows how to write and read itself.
//! Generated stubs implement it for their structs; the scalar, string and container
//! impls live here.
//!
//! Struct framing helpers (`write_field`, `read_fields`) keep hand-written and
//! generated struct codecs short: unknown or mistyped fields are skipped, which is
//! what keeps readers compatible across schema versions.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::error::Result;
use crate::protocol::InputProtocol;
use crate::protocol::OutputProtocol;
use crate::skip::skip;
use crate::types::FieldHeader;
use crate::types::ListHeader;
use crate::types::MapHeader;
use crate::types::WireType;

/// A type with a fixed wire representation.
pub trait Wire: Sized {
    const WIRE_TYPE: WireType;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()>;
    fn read(input: &mut dyn InputProtocol) -> Result<Self>;
}

/// Writes `value` as field `id`: header, payload, field end.
pub fn write_field<T: Wire>(out: &mut dyn OutputProtocol, id: i16, value: &T) -> Result<()> {
    out.write_field_begin(&FieldHeader::new(T::WIRE_TYPE, id))?;
    value.write(out)?;
    out.write_field_end()
}

/// Writes `value` as field `id` only when present.
pub fn write_optional_field<T: Wire>(out: &mut dyn OutputProtocol, id: i16, value: &Option<T>) -> Result<()> {
    match value {
        Some(v) => write_field(out, id, v),
        None => Ok(()),
    }
}

/// Reads a struct body, handing each field to `on_field`.
///
/// `on_field` returns `Ok(true)` when it consumed the field's value and `Ok(false)`
/// when the field is unknown to it, in which case the value is skipped.
pub fn read_fields<F>(input: &mut dyn InputProtocol, mut on_field: F) -> Result<()>
where
    F: FnMut(&mut dyn InputProtocol, FieldHeader) -> Result<bool>,
{
    input.read_struct_begin()?;
    loop {
        let field = input.read_field_begin()?;
        if field.is_stop() {
            break;
        }
        if !on_field(&mut *input, field)? {
            skip(&mut *input, field.wire_type)?;
        }
        input.read_field_end()?;
    }
    input.read_struct_end()
}

/// Reads the value of `field` into `slot` if its wire type matches `T`.
///
/// Returns whether the value was consumed, for use inside `read_fields`.
pub fn read_field_into<T: Wire>(input: &mut dyn InputProtocol, field: FieldHeader, slot: &mut Option<T>) -> Result<bool> {
    if field.wire_type != T::WIRE_TYPE {
        return Ok(false);
    }
    *slot = Some(T::read(input)?);
    Ok(true)
}

fn expect_type(expected: WireType, found: WireType) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::UnexpectedType { expected, found })
    }
}

/// A struct with no fields. Reading it skips whatever fields are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty;

impl Wire for Empty {
    const WIRE_TYPE: WireType = WireType::Struct;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> {
        out.write_struct_begin("Empty")?;
        out.write_field_stop()?;
        out.write_struct_end()
    }

    fn read(input: &mut dyn InputProtocol) -> Result<Self> {
        read_fields(input, |_, _| Ok(false))?;
        Ok(Empty)
    }
}

/// The absence of a value. Writes and reads nothing.
impl Wire for () {
    const WIRE_TYPE: WireType = WireType::Void;

    fn write(&self, _out: &mut dyn OutputProtocol) -> Result<()> { Ok(()) }
    fn read(_input: &mut dyn InputProtocol) -> Result<Self> { Ok(()) }
}

macro_rules! wire_scalar {
    ($ty:ty, $wire:ident, $write:ident, $read:ident) => {
        impl Wire for $ty {
            const WIRE_TYPE: WireType = WireType::$wire;

            fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> { out.$write(*self) }
            fn read(input: &mut dyn InputProtocol) -> Result<Self> { input.$read() }
        }
    };
}

wire_scalar!(bool, Bool, write_bool, read_bool);
wire_scalar!(i8, Byte, write_byte, read_byte);
wire_scalar!(i16, I16, write_i16, read_i16);
wire_scalar!(i32, I32, write_i32, read_i32);
wire_scalar!(i64, I64, write_i64, read_i64);
wire_scalar!(f64, Double, write_double, read_double);

impl Wire for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> { out.write_string(self) }
    fn read(input: &mut dyn InputProtocol) -> Result<Self> { input.read_string() }
}

impl<T: Wire> Wire for Vec<T> {
    const WIRE_TYPE: WireType = WireType::List;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> {
        out.write_list_begin(&ListHeader::new(T::WIRE_TYPE, self.len()))?;
        for item in self {
            item.write(out)?;
        }
        out.write_list_end()
    }

    fn read(input: &mut dyn InputProtocol) -> Result<Self> {
        let header = input.read_list_begin()?;
        expect_type(T::WIRE_TYPE, header.element_type)?;
        let mut items = Vec::with_capacity(header.size.min(1024));
        for _ in 0..header.size {
            items.push(T::read(input)?);
        }
        input.read_list_end()?;
        Ok(items)
    }
}

impl<T: Wire + Ord> Wire for BTreeSet<T> {
    const WIRE_TYPE: WireType = WireType::Set;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> {
        out.write_set_begin(&ListHeader::new(T::WIRE_TYPE, self.len()))?;
        for item in self {
            item.write(out)?;
        }
        out.write_set_end()
    }

    fn read(input: &mut dyn InputProtocol) -> Result<Self> {
        let header = input.read_set_begin()?;
        expect_type(T::WIRE_TYPE, header.element_type)?;
        let mut items = BTreeSet::new();
        for _ in 0..header.size {
            items.insert(T::read(input)?);
        }
        input.read_set_end()?;
        Ok(items)
    }
}

impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    const WIRE_TYPE: WireType = WireType::Map;

    fn write(&self, out: &mut dyn OutputProtocol) -> Result<()> {
        out.write_map_begin(&MapHeader::new(K::WIRE_TYPE, V::WIRE_TYPE, self.len()))?;
        for (k, v) in self {
            k.write(out)?;
            v.write(out)?;
        }
        out.write_map_end()
    }

    fn read(input: &mut dyn InputProtocol) -> Result<Self> {
        let header = input.read_map_begin()?;
        expect_type(K::WIRE_TYPE, header.key_type)?;
        expect_type(V::WIRE_TYPE, header.value_type)?;
        let mut entries = BTreeMap::new();
        for _ in 0..header.size {
            let k = K::read(input)?;
            let v = V::read(input)?;
            entries.insert(k, v);
        }
        input.read_map_end()?;
        Ok(entries)
    }
}
