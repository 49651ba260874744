//! # Wire Types
//!
//! The closed set of tags and headers that frame every value on the wire.
//!
//! ## Invariants
//! - Numeric codes are fixed for interop; 5, 7 and 9 are reserved gaps.
//! - Headers are ephemeral: built per call, never retained by the protocol.

/// Identifies which decode routine applies to the following bytes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Terminates a struct.
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    /// Strings and opaque binary share one tag.
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl WireType {
    /// Returns the WireType for a given byte, or `None` if the code is not assigned.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(WireType::Stop),
            1 => Some(WireType::Void),
            2 => Some(WireType::Bool),
            3 => Some(WireType::Byte),
            4 => Some(WireType::Double),
            6 => Some(WireType::I16),
            8 => Some(WireType::I32),
            10 => Some(WireType::I64),
            11 => Some(WireType::String),
            12 => Some(WireType::Struct),
            13 => Some(WireType::Map),
            14 => Some(WireType::Set),
            15 => Some(WireType::List),
            _ => None,
        }
    }

    /// True for types whose encoding nests other values.
    pub fn is_container(self) -> bool {
        matches!(self, WireType::Struct | WireType::Map | WireType::Set | WireType::List)
    }
}

/// The role of a message within an exchange.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Call = 1,
    Reply = 2,
    Exception = 3,
    /// A call the caller neither waits for nor expects a reply to.
    Oneway = 4,
}

impl MessageKind {
    /// Returns the MessageKind for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(MessageKind::Call),
            2 => Some(MessageKind::Reply),
            3 => Some(MessageKind::Exception),
            4 => Some(MessageKind::Oneway),
            _ => None,
        }
    }
}

/// The envelope preceding every top-level exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub kind: MessageKind,
    pub seq: i32,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, kind: MessageKind, seq: i32) -> Self {
        Self { name: name.into(), kind, seq }
    }
}

/// Identity of one struct field on the wire. The name never travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub wire_type: WireType,
    pub id: i16,
}

impl FieldHeader {
    pub fn new(wire_type: WireType, id: i16) -> Self {
        Self { wire_type, id }
    }

    /// The header read in place of a field when the struct ends.
    pub fn stop() -> Self {
        Self { wire_type: WireType::Stop, id: 0 }
    }

    pub fn is_stop(&self) -> bool {
        self.wire_type == WireType::Stop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key_type: WireType,
    pub value_type: WireType,
    pub size: usize,
}

impl MapHeader {
    pub fn new(key_type: WireType, value_type: WireType, size: usize) -> Self {
        Self { key_type, value_type, size }
    }
}

/// Header shared by lists and sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub element_type: WireType,
    pub size: usize,
}

impl ListHeader {
    pub fn new(element_type: WireType, size: usize) -> Self {
        Self { element_type, size }
    }
}

pub type SetHeader = ListHeader;
