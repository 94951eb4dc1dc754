//! The closed set of SBDF value kinds.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{FormatError, Result, UsageError};
use crate::temporal::MIN_DATETIME_MILLIS;
use crate::value::Value;

/// Identifies the type of a data value or metadata property.
///
/// The discriminants are the on-wire type codes. The reserved codes 0x00
/// (unknown) and 0xFF (user-defined) are not representable and are rejected
/// by [`ValueTypeId::from_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTypeId {
    /// 1 byte, 0 or 1.
    Bool = 0x01,
    /// 4 bytes, little-endian two's complement.
    Int = 0x02,
    /// 8 bytes, little-endian two's complement.
    Long = 0x03,
    /// 4 bytes, IEEE-754, little-endian.
    Float = 0x04,
    /// 8 bytes, IEEE-754, little-endian.
    Double = 0x05,
    /// 8 bytes, milliseconds since 0001-01-01T00:00:00Z.
    DateTime = 0x06,
    /// Same wire form as [`ValueTypeId::DateTime`].
    Date = 0x07,
    /// 8 bytes, milliseconds within a day.
    Time = 0x08,
    /// 8 bytes, signed millisecond duration.
    TimeSpan = 0x09,
    /// Length-prefixed UTF-8.
    String = 0x0a,
    /// Length-prefixed byte blob.
    Binary = 0x0c,
    /// 16 bytes, IEEE-754 decimal128, little-endian.
    Decimal = 0x0d,
}

impl ValueTypeId {
    /// Every standard kind, in wire-code order.
    pub const ALL: [ValueTypeId; 12] = [
        Self::Bool,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::DateTime,
        Self::Date,
        Self::Time,
        Self::TimeSpan,
        Self::String,
        Self::Binary,
        Self::Decimal,
    ];

    /// Maps a wire code to a kind, rejecting anything outside the closed set.
    pub fn from_wire(code: u8) -> Result<Self> {
        Ok(match code {
            0x01 => Self::Bool,
            0x02 => Self::Int,
            0x03 => Self::Long,
            0x04 => Self::Float,
            0x05 => Self::Double,
            0x06 => Self::DateTime,
            0x07 => Self::Date,
            0x08 => Self::Time,
            0x09 => Self::TimeSpan,
            0x0a => Self::String,
            0x0c => Self::Binary,
            0x0d => Self::Decimal,
            other => return Err(FormatError::UnknownValueType { read: other }.into()),
        })
    }

    /// The single-byte wire code of this kind.
    pub fn as_wire(self) -> u8 {
        self as u8
    }

    /// True for the fixed-width kinds.
    pub fn is_simple(self) -> bool {
        !self.is_array()
    }

    /// True for the variable-length kinds (String and Binary).
    pub fn is_array(self) -> bool {
        matches!(self, Self::String | Self::Binary)
    }

    /// The payload width in bytes of a simple kind, or `None` for array
    /// kinds.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::Int | Self::Float => Some(4),
            Self::Long
            | Self::Double
            | Self::DateTime
            | Self::Date
            | Self::Time
            | Self::TimeSpan => Some(8),
            Self::Decimal => Some(16),
            Self::String | Self::Binary => None,
        }
    }

    /// The default value of this kind. For DateTime and Date this is the
    /// earliest writable instant, 1583-01-01T00:00:00Z.
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Double => Value::Double(0.0),
            Self::DateTime => Value::DateTime(min_datetime()),
            Self::Date => Value::Date(min_datetime()),
            Self::Time => Value::Time(NaiveTime::MIN),
            Self::TimeSpan => Value::TimeSpan(TimeDelta::zero()),
            Self::String => Value::String(String::new()),
            Self::Binary => Value::Binary(Vec::new()),
            Self::Decimal => Value::Decimal(BigDecimal::from(0)),
        }
    }

    /// The singleton invalid (null) sentinel. Kind-agnostic.
    pub fn invalid_value(self) -> Value {
        Value::Invalid
    }

    /// Wraps an error string into an error envelope.
    pub fn error_value(self, error: impl Into<String>) -> Value {
        Value::Error(error.into())
    }

    /// Wraps a plain value of this kind into a replaced-value envelope.
    pub fn replaced_value(self, inner: Value) -> Result<Value> {
        match inner.value_type() {
            Some(actual) if actual == self => Ok(Value::Replaced(Box::new(inner))),
            Some(actual) => Err(UsageError::TypeMismatch {
                expected: self,
                actual,
            }
            .into()),
            None => Err(UsageError::EnvelopeNotAllowed { expected: self }.into()),
        }
    }

    /// The cached single-byte binary form, as stored in the reserved
    /// `DataType` column property.
    pub fn to_binary(self) -> Vec<u8> {
        vec![self.as_wire()]
    }

    /// Parses the binary form produced by [`ValueTypeId::to_binary`].
    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let code = *bytes.first().ok_or(FormatError::UnexpectedEof)?;
        Self::from_wire(code)
    }

    /// Writes the single-byte kind code.
    pub fn write<W: std::io::Write>(self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u8(self.as_wire())
    }

    /// Reads and validates a single-byte kind code.
    pub fn read<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        Self::from_wire(reader.read_u8()?)
    }
}

impl fmt::Display for ValueTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::TimeSpan => "TimeSpan",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Decimal => "Decimal",
        };
        write!(f, "{name}")
    }
}

fn min_datetime() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(MIN_DATETIME_MILLIS)
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH)
}
