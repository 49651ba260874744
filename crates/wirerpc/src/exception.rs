//! # Exceptions
//!
//! The two built-in exception structs: `ApplicationException` for call-level
//! failures and `TransportException` for connection-level ones. Both share one
//! layout, so they share one generic codec.
//!
//! ## Layout
//!
//! | id | type   | content              |
//! |----|--------|----------------------|
//! | 1  | STRING | message, if set      |
//! | 2  | I32    | kind code, if set    |
//!
//! Reads tolerate missing fields, mistyped fields and unknown ids. An unknown
//! kind code decodes as `Unknown`.

use std::fmt;

use wirepack::InputProtocol;
use wirepack::OutputProtocol;
use wirepack::TransportError;
use wirepack::TransportErrorKind;
use wirepack::Wire;
use wirepack::WireType;
use wirepack::read_field_into;
use wirepack::read_fields;
use wirepack::write_optional_field;

const MESSAGE_FIELD: i16 = 1;
const KIND_FIELD: i16 = 2;

/// A closed set of numbered exception kinds.
pub trait ExceptionKind: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// The struct name used on the wire.
    const STRUCT_NAME: &'static str;
    /// The kind reported when none, or an unrecognized one, was sent.
    const UNKNOWN: Self;

    fn code(self) -> i32;
    fn from_code(code: i32) -> Option<Self>;
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationErrorKind {
    Unknown = 0,
    UnknownMethod = 1,
    InvalidMessageType = 2,
    WrongMethodName = 3,
    BadSequenceId = 4,
    MissingResult = 5,
    InternalError = 6,
    ProtocolError = 7,
}

impl ExceptionKind for ApplicationErrorKind {
    const STRUCT_NAME: &'static str = "TApplicationException";
    const UNKNOWN: Self = ApplicationErrorKind::Unknown;

    fn code(self) -> i32 { self as i32 }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ApplicationErrorKind::Unknown),
            1 => Some(ApplicationErrorKind::UnknownMethod),
            2 => Some(ApplicationErrorKind::InvalidMessageType),
            3 => Some(ApplicationErrorKind::WrongMethodName),
            4 => Some(ApplicationErrorKind::BadSequenceId),
            5 => Some(ApplicationErrorKind::MissingResult),
            6 => Some(ApplicationErrorKind::InternalError),
            7 => Some(ApplicationErrorKind::ProtocolError),
            _ => None,
        }
    }
}

impl ExceptionKind for TransportErrorKind {
    const STRUCT_NAME: &'static str = "TTransportException";
    const UNKNOWN: Self = TransportErrorKind::Unknown;

    fn code(self) -> i32 { self as i32 }
    fn from_code(code: i32) -> Option<Self> { TransportErrorKind::from_i32(code) }
}

/// An exception struct with an optional message and an optional kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Exception<K> {
    message: Option<String>,
    kind: Option<K>,
}

pub type ApplicationException = Exception<ApplicationErrorKind>;
pub type TransportException = Exception<TransportErrorKind>;

impl<K: ExceptionKind> Exception<K> {
    pub fn new(kind: K, message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), kind: Some(kind) }
    }

    /// The kind, or `Unknown` when it was never set.
    pub fn kind(&self) -> K {
        self.kind.unwrap_or(K::UNKNOWN)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl<K> Default for Exception<K> {
    fn default() -> Self {
        Self { message: None, kind: None }
    }
}

impl<K: ExceptionKind> fmt::Display for Exception<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", K::STRUCT_NAME, self.kind())?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl<K: ExceptionKind> std::error::Error for Exception<K> {}

impl<K: ExceptionKind> Wire for Exception<K> {
    const WIRE_TYPE: WireType = WireType::Struct;

    fn write(&self, out: &mut dyn OutputProtocol) -> wirepack::Result<()> {
        out.write_struct_begin(K::STRUCT_NAME)?;
        write_optional_field(out, MESSAGE_FIELD, &self.message)?;
        write_optional_field(out, KIND_FIELD, &self.kind.map(K::code))?;
        out.write_field_stop()?;
        out.write_struct_end()
    }

    fn read(input: &mut dyn InputProtocol) -> wirepack::Result<Self> {
        let mut message: Option<String> = None;
        let mut code: Option<i32> = None;
        read_fields(input, |input, field| match field.id {
            MESSAGE_FIELD => read_field_into(input, field, &mut message),
            KIND_FIELD => read_field_into(input, field, &mut code),
            _ => Ok(false),
        })?;
        let kind = code.map(|c| K::from_code(c).unwrap_or(K::UNKNOWN));
        Ok(Self { message, kind })
    }
}

impl From<&TransportError> for TransportException {
    fn from(e: &TransportError) -> Self {
        Self::new(e.kind(), e.message())
    }
}

