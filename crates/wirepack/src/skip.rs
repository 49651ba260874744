//! # Skip
//!
//! Schema-less consumption of a value given only its wire type. This is what lets
//! a reader built against an older schema step over fields added by a newer writer.
//!
//! ## Invariants
//! - Consumes exactly the bytes a full typed decode would, no more, no less.
//! - Recursion is bounded by `MAX_SKIP_DEPTH`.
//! - A non-empty container of `Stop` or `Void` is rejected; its elements have no bytes.

use crate::error::Error;
use crate::error::Result;
use crate::protocol::InputProtocol;
use crate::types::WireType;

/// The maximum nesting depth before skipping gives up.
pub const MAX_SKIP_DEPTH: usize = 64;

/// Reads and discards one value of type `wire_type`.
///
/// # Errors
/// Returns `Error::DepthLimitExceeded` if the value is nested too deeply, and
/// `Error::InvalidWireType` for a non-empty container whose elements are `Stop` or `Void`.
pub fn skip(input: &mut dyn InputProtocol, wire_type: WireType) -> Result<()> {
    skip_impl(input, wire_type, 0)
}

fn skip_impl(input: &mut dyn InputProtocol, wire_type: WireType, depth: usize) -> Result<()> {
    if depth > MAX_SKIP_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }

    match wire_type {
        WireType::Stop | WireType::Void => {},
        WireType::Bool => { input.read_bool()?; },
        WireType::Byte => { input.read_byte()?; },
        WireType::I16 => { input.read_i16()?; },
        WireType::I32 => { input.read_i32()?; },
        WireType::I64 => { input.read_i64()?; },
        WireType::Double => { input.read_double()?; },
        // Binary-safe: the payload need not be UTF-8.
        WireType::String => { input.read_binary()?; },
        WireType::Struct => {
            input.read_struct_begin()?;
            loop {
                let field = input.read_field_begin()?;
                if field.is_stop() {
                    break;
                }
                skip_impl(input, field.wire_type, depth + 1)?;
                input.read_field_end()?;
            }
            input.read_struct_end()?;
        },
        WireType::Map => {
            let header = input.read_map_begin()?;
            check_elements(header.key_type, header.size)?;
            check_elements(header.value_type, header.size)?;
            for _ in 0..header.size {
                skip_impl(input, header.key_type, depth + 1)?;
                skip_impl(input, header.value_type, depth + 1)?;
            }
            input.read_map_end()?;
        },
        WireType::Set => {
            let header = input.read_set_begin()?;
            check_elements(header.element_type, header.size)?;
            for _ in 0..header.size {
                skip_impl(input, header.element_type, depth + 1)?;
            }
            input.read_set_end()?;
        },
        WireType::List => {
            let header = input.read_list_begin()?;
            check_elements(header.element_type, header.size)?;
            for _ in 0..header.size {
                skip_impl(input, header.element_type, depth + 1)?;
            }
            input.read_list_end()?;
        },
    }
    Ok(())
}

fn check_elements(element_type: WireType, size: usize) -> Result<()> {
    match element_type {
        WireType::Stop | WireType::Void if size > 0 => Err(Error::InvalidWireType(element_type as u8)),
        _ => Ok(()),
    }
}
