//! Field type codes and decoded values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of field types a schema record may declare.
///
/// Each variant maps to exactly one format character of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FieldType {
    /// `b`: signed 8-bit integer
    Int8,
    /// `B`: unsigned 8-bit integer
    UInt8,
    /// `h`: signed 16-bit integer
    Int16,
    /// `H`: unsigned 16-bit integer
    UInt16,
    /// `i`: signed 32-bit integer
    Int32,
    /// `I`: unsigned 32-bit integer
    UInt32,
    /// `q`: signed 64-bit integer
    Int64,
    /// `Q`: unsigned 64-bit integer
    UInt64,
    /// `f`: IEEE-754 single precision float
    Float32,
    /// `c`: signed 16-bit integer in hundredths
    CentiInt16,
    /// `C`: unsigned 16-bit integer in hundredths
    CentiUInt16,
    /// `e`: signed 32-bit integer in hundredths
    CentiInt32,
    /// `E`: unsigned 32-bit integer in hundredths
    CentiUInt32,
    /// `L`: signed 32-bit latitude/longitude in 1e-7 degrees
    LatLon,
    /// `n`: 4 byte text
    Char4,
    /// `N`: 16 byte text
    Char16,
    /// `Z`: 64 byte text
    Char64,
    /// `M`: flight mode, stored like a signed 8-bit integer
    FlightMode,
}

impl FieldType {
    /// Resolve a format character, or `None` for codes this decoder does not know.
    pub const fn from_code(code: u8) -> Option<Self> {
        let field_type = match code {
            b'b' => FieldType::Int8,
            b'B' => FieldType::UInt8,
            b'h' => FieldType::Int16,
            b'H' => FieldType::UInt16,
            b'i' => FieldType::Int32,
            b'I' => FieldType::UInt32,
            b'q' => FieldType::Int64,
            b'Q' => FieldType::UInt64,
            b'f' => FieldType::Float32,
            b'c' => FieldType::CentiInt16,
            b'C' => FieldType::CentiUInt16,
            b'e' => FieldType::CentiInt32,
            b'E' => FieldType::CentiUInt32,
            b'L' => FieldType::LatLon,
            b'n' => FieldType::Char4,
            b'N' => FieldType::Char16,
            b'Z' => FieldType::Char64,
            b'M' => FieldType::FlightMode,
            _ => return None,
        };
        Some(field_type)
    }

    /// The format character for this type.
    pub const fn code(&self) -> char {
        match self {
            FieldType::Int8 => 'b',
            FieldType::UInt8 => 'B',
            FieldType::Int16 => 'h',
            FieldType::UInt16 => 'H',
            FieldType::Int32 => 'i',
            FieldType::UInt32 => 'I',
            FieldType::Int64 => 'q',
            FieldType::UInt64 => 'Q',
            FieldType::Float32 => 'f',
            FieldType::CentiInt16 => 'c',
            FieldType::CentiUInt16 => 'C',
            FieldType::CentiInt32 => 'e',
            FieldType::CentiUInt32 => 'E',
            FieldType::LatLon => 'L',
            FieldType::Char4 => 'n',
            FieldType::Char16 => 'N',
            FieldType::Char64 => 'Z',
            FieldType::FlightMode => 'M',
        }
    }

    /// Returns the on-wire size in bytes of this field.
    pub const fn size(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 | FieldType::FlightMode => 1,
            FieldType::Int16
            | FieldType::UInt16
            | FieldType::CentiInt16
            | FieldType::CentiUInt16 => 2,
            FieldType::Int32
            | FieldType::UInt32
            | FieldType::Float32
            | FieldType::CentiInt32
            | FieldType::CentiUInt32
            | FieldType::LatLon
            | FieldType::Char4 => 4,
            FieldType::Int64 | FieldType::UInt64 => 8,
            FieldType::Char16 => 16,
            FieldType::Char64 => 64,
        }
    }
}

/// Decoded value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Value {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
}

impl Value {
    /// Interpret this value as an unsigned 64-bit count.
    ///
    /// Negative, non-finite and textual values have no such interpretation.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int8(v) => u64::try_from(v).ok(),
            Value::UInt8(v) => Some(v.into()),
            Value::Int16(v) => u64::try_from(v).ok(),
            Value::UInt16(v) => Some(v.into()),
            Value::Int32(v) => u64::try_from(v).ok(),
            Value::UInt32(v) => Some(v.into()),
            Value::Int64(v) => u64::try_from(v).ok(),
            Value::UInt64(v) => Some(v),
            Value::Float32(v) if v.is_finite() && v >= 0.0 => Some(v as u64),
            Value::Float64(v) if v.is_finite() && v >= 0.0 => Some(v as u64),
            Value::Float32(_) | Value::Float64(_) | Value::Text(_) => None,
        }
    }

    /// Borrow the text of a textual value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int8(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// A decoded field: its label and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct NameValuePair {
    pub name: String,
    pub value: Value,
}

impl NameValuePair {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), value }
    }
}
