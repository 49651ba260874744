//! # Result Structs
//!
//! Every non-oneway method answers with a result struct: the return value at field
//! id 0, or one declared exception at that exception's own id. Exactly one is set.
//! Void methods set nothing on success.

use wirepack::FieldHeader;
use wirepack::InputProtocol;
use wirepack::OutputProtocol;
use wirepack::Wire;
use wirepack::WireType;
use wirepack::read_field_into;
use wirepack::read_fields;
use wirepack::write_field;

/// Field id carrying the return value.
pub const SUCCESS_FIELD: i16 = 0;

/// The exceptions a method declares.
///
/// Implemented by an enum with one variant per declared exception; each variant
/// owns a distinct field id in the result struct.
pub trait Throws: Sized + Send + 'static {
    /// Writes the exception as its result-struct field, header included.
    fn write_field(&self, out: &mut dyn OutputProtocol) -> wirepack::Result<()>;

    /// Reads `field` if it is one of the declared exceptions.
    ///
    /// Returns `Ok(None)` without consuming anything when it is not.
    fn read_field(input: &mut dyn InputProtocol, field: FieldHeader) -> wirepack::Result<Option<Self>>;
}

/// For methods that declare no exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoException {}

impl NoException {
    /// Discharges an impossible error, e.g. `result.unwrap_or_else(NoException::unreachable)`.
    pub fn unreachable<T>(self) -> T {
        match self {}
    }
}

impl Throws for NoException {
    fn write_field(&self, _out: &mut dyn OutputProtocol) -> wirepack::Result<()> {
        match *self {}
    }

    fn read_field(_input: &mut dyn InputProtocol, _field: FieldHeader) -> wirepack::Result<Option<Self>> {
        Ok(None)
    }
}

impl std::fmt::Display for NoException {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {}
    }
}

impl std::error::Error for NoException {}

/// The decoded content of a result struct.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult<R, E> {
    Success(R),
    Declared(E),
}

impl<R: Wire, E: Throws> MethodResult<R, E> {
    pub fn write(&self, out: &mut dyn OutputProtocol, name: &str) -> wirepack::Result<()> {
        out.write_struct_begin(name)?;
        match self {
            MethodResult::Success(value) => {
                if R::WIRE_TYPE != WireType::Void {
                    write_field(out, SUCCESS_FIELD, value)?;
                }
            },
            MethodResult::Declared(e) => e.write_field(out)?,
        }
        out.write_field_stop()?;
        out.write_struct_end()
    }

    /// Reads a result struct. `None` means nothing was set for a non-void method.
    ///
    /// A declared exception wins over a success value if a peer sends both.
    pub fn read(input: &mut dyn InputProtocol) -> wirepack::Result<Option<Self>> {
        let mut success: Option<R> = None;
        let mut declared: Option<E> = None;
        read_fields(input, |input, field| {
            if field.id == SUCCESS_FIELD {
                return read_field_into(input, field, &mut success);
            }
            match E::read_field(input, field)? {
                Some(e) => {
                    declared = Some(e);
                    Ok(true)
                },
                None => Ok(false),
            }
        })?;

        let result = match (success, declared) {
            (_, Some(e)) => Some(MethodResult::Declared(e)),
            (Some(value), None) => Some(MethodResult::Success(value)),
            // Void reads consume nothing.
            (None, None) if R::WIRE_TYPE == WireType::Void => Some(MethodResult::Success(R::read(input)?)),
            (None, None) => None,
        };
        Ok(result)
    }
}
