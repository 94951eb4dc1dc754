//! The universal value type returned by readers and accepted by writers.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::binary::{BinaryReader, BinaryWriter};
use crate::decimal::{decode_decimal, encode_decimal, DECIMAL_WIDTH};
use crate::error::{FormatError, Result, UsageError};
use crate::temporal;
use crate::value_type::ValueTypeId;

/// A single data value: one variant per supported kind, plus the three
/// envelopes.
///
/// Only plain variants are ever serialized directly; the invalid, error and
/// replaced envelopes are conveyed through per-column sideband arrays by the
/// table writer and reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// A UTC instant.
    DateTime(DateTime<Utc>),
    /// A UTC instant; only the on-wire kind code differs from DateTime.
    Date(DateTime<Utc>),
    /// A time of day.
    Time(NaiveTime),
    /// A signed duration with millisecond wire precision.
    TimeSpan(TimeDelta),
    String(String),
    Binary(Vec<u8>),
    Decimal(BigDecimal),
    /// The null sentinel.
    Invalid,
    /// An opaque error description standing in for a value.
    Error(String),
    /// A value that replaced a missing one, wrapping the replacement.
    Replaced(Box<Value>),
}

impl Value {
    /// The kind of a plain value, or `None` for the three envelopes.
    pub fn value_type(&self) -> Option<ValueTypeId> {
        match self {
            Value::Bool(_) => Some(ValueTypeId::Bool),
            Value::Int(_) => Some(ValueTypeId::Int),
            Value::Long(_) => Some(ValueTypeId::Long),
            Value::Float(_) => Some(ValueTypeId::Float),
            Value::Double(_) => Some(ValueTypeId::Double),
            Value::DateTime(_) => Some(ValueTypeId::DateTime),
            Value::Date(_) => Some(ValueTypeId::Date),
            Value::Time(_) => Some(ValueTypeId::Time),
            Value::TimeSpan(_) => Some(ValueTypeId::TimeSpan),
            Value::String(_) => Some(ValueTypeId::String),
            Value::Binary(_) => Some(ValueTypeId::Binary),
            Value::Decimal(_) => Some(ValueTypeId::Decimal),
            Value::Invalid | Value::Error(_) | Value::Replaced(_) => None,
        }
    }

    /// True if this is the invalid (null) sentinel.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    /// True if this is an error envelope.
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// True if this is a replaced-value envelope.
    pub fn is_replaced(&self) -> bool {
        matches!(self, Value::Replaced(_))
    }

    /// The error string, if this is an error envelope.
    pub fn error_string(&self) -> Option<&str> {
        match self {
            Value::Error(s) => Some(s),
            _ => None,
        }
    }

    /// The wrapped replacement, if this is a replaced-value envelope.
    pub fn replaced_inner(&self) -> Option<&Value> {
        match self {
            Value::Replaced(inner) => Some(inner),
            _ => None,
        }
    }

    /// Writes this value in the single-value wire form of the given kind.
    ///
    /// Envelopes cannot be written directly, and the value's kind must match
    /// `value_type` exactly.
    pub(crate) fn write_wire<W: std::io::Write>(
        &self,
        value_type: ValueTypeId,
        writer: &mut BinaryWriter<W>,
    ) -> Result<()> {
        match (value_type, self) {
            (ValueTypeId::Bool, Value::Bool(v)) => writer.write_bool(*v),
            (ValueTypeId::Int, Value::Int(v)) => writer.write_i32(*v),
            (ValueTypeId::Long, Value::Long(v)) => writer.write_i64(*v),
            (ValueTypeId::Float, Value::Float(v)) => writer.write_f32(*v),
            (ValueTypeId::Double, Value::Double(v)) => writer.write_f64(*v),
            (ValueTypeId::DateTime, Value::DateTime(v)) | (ValueTypeId::Date, Value::Date(v)) => {
                let raw = temporal::datetime_millis_to_wire(temporal::millis_from_datetime(v))?;
                writer.write_i64(raw)
            }
            (ValueTypeId::Time, Value::Time(v)) => {
                writer.write_i64(temporal::normalize_time_millis(temporal::millis_from_time(v)))
            }
            (ValueTypeId::TimeSpan, Value::TimeSpan(v)) => {
                writer.write_i64(temporal::millis_from_timespan(v))
            }
            (ValueTypeId::String, Value::String(v)) => writer.write_string(v),
            (ValueTypeId::Binary, Value::Binary(v)) => writer.write_blob(v),
            (ValueTypeId::Decimal, Value::Decimal(v)) => writer.write_bytes(&encode_decimal(v)?),
            (expected, value) => Err(match value.value_type() {
                Some(actual) => UsageError::TypeMismatch { expected, actual }.into(),
                None => UsageError::EnvelopeNotAllowed { expected }.into(),
            }),
        }
    }

    /// Reads a single value of the given kind from its wire form.
    pub(crate) fn read_wire<R: std::io::Read>(
        value_type: ValueTypeId,
        reader: &mut BinaryReader<R>,
    ) -> Result<Value> {
        Ok(match value_type {
            ValueTypeId::Bool => Value::Bool(reader.read_bool()?),
            ValueTypeId::Int => Value::Int(reader.read_i32()?),
            ValueTypeId::Long => Value::Long(reader.read_i64()?),
            ValueTypeId::Float => Value::Float(reader.read_f32()?),
            ValueTypeId::Double => Value::Double(reader.read_f64()?),
            ValueTypeId::DateTime => {
                let millis = temporal::wire_to_datetime_millis(reader.read_i64()?)?;
                Value::DateTime(temporal::datetime_from_millis(millis)?)
            }
            ValueTypeId::Date => {
                let millis = temporal::wire_to_datetime_millis(reader.read_i64()?)?;
                Value::Date(temporal::datetime_from_millis(millis)?)
            }
            ValueTypeId::Time => Value::Time(temporal::time_from_millis(reader.read_i64()?)?),
            ValueTypeId::TimeSpan => {
                Value::TimeSpan(temporal::timespan_from_millis(reader.read_i64()?)?)
            }
            ValueTypeId::String => Value::String(reader.read_string()?),
            ValueTypeId::Binary => Value::Binary(reader.read_blob()?),
            ValueTypeId::Decimal => {
                let bytes: [u8; DECIMAL_WIDTH] = reader
                    .read_bytes(DECIMAL_WIDTH)?
                    .try_into()
                    .map_err(|_| FormatError::UnexpectedEof)?;
                Value::Decimal(decode_decimal(&bytes)?)
            }
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Value::TimeSpan(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}
