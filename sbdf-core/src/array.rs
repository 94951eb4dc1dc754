//! Dense, typed columnar value storage.
//!
//! A `TypedArray` holds the decoded values of one column slice (or one
//! value-property) in a per-kind `Vec` — no per-value boxing. Temporal kinds
//! store raw wire-domain milliseconds; conversion to chrono types happens at
//! the [`Value`] boundary.

use bigdecimal::BigDecimal;

use crate::binary::{BinaryReader, BinaryWriter};
use crate::decimal::{decode_decimal, encode_decimal, DECIMAL_WIDTH};
use crate::error::{FormatError, Result, UsageError};
use crate::temporal;
use crate::value::Value;
use crate::value_type::ValueTypeId;
use crate::varint;

/// A homogeneous array of plain values.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// Unix-epoch milliseconds.
    DateTime(Vec<i64>),
    /// Unix-epoch milliseconds.
    Date(Vec<i64>),
    /// Milliseconds within a day.
    Time(Vec<i64>),
    /// Signed millisecond durations.
    TimeSpan(Vec<i64>),
    String(Vec<String>),
    Binary(Vec<Vec<u8>>),
    Decimal(Vec<BigDecimal>),
}

impl TypedArray {
    /// An empty array of the given kind with reserved capacity.
    pub fn with_capacity(value_type: ValueTypeId, capacity: usize) -> Self {
        match value_type {
            ValueTypeId::Bool => Self::Bool(Vec::with_capacity(capacity)),
            ValueTypeId::Int => Self::Int(Vec::with_capacity(capacity)),
            ValueTypeId::Long => Self::Long(Vec::with_capacity(capacity)),
            ValueTypeId::Float => Self::Float(Vec::with_capacity(capacity)),
            ValueTypeId::Double => Self::Double(Vec::with_capacity(capacity)),
            ValueTypeId::DateTime => Self::DateTime(Vec::with_capacity(capacity)),
            ValueTypeId::Date => Self::Date(Vec::with_capacity(capacity)),
            ValueTypeId::Time => Self::Time(Vec::with_capacity(capacity)),
            ValueTypeId::TimeSpan => Self::TimeSpan(Vec::with_capacity(capacity)),
            ValueTypeId::String => Self::String(Vec::with_capacity(capacity)),
            ValueTypeId::Binary => Self::Binary(Vec::with_capacity(capacity)),
            ValueTypeId::Decimal => Self::Decimal(Vec::with_capacity(capacity)),
        }
    }

    /// An empty array of the given kind.
    pub fn empty(value_type: ValueTypeId) -> Self {
        Self::with_capacity(value_type, 0)
    }

    /// The kind of the held values.
    pub fn value_type(&self) -> ValueTypeId {
        match self {
            Self::Bool(_) => ValueTypeId::Bool,
            Self::Int(_) => ValueTypeId::Int,
            Self::Long(_) => ValueTypeId::Long,
            Self::Float(_) => ValueTypeId::Float,
            Self::Double(_) => ValueTypeId::Double,
            Self::DateTime(_) => ValueTypeId::DateTime,
            Self::Date(_) => ValueTypeId::Date,
            Self::Time(_) => ValueTypeId::Time,
            Self::TimeSpan(_) => ValueTypeId::TimeSpan,
            Self::String(_) => ValueTypeId::String,
            Self::Binary(_) => ValueTypeId::Binary,
            Self::Decimal(_) => ValueTypeId::Decimal,
        }
    }

    /// The number of values held.
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::DateTime(v) | Self::Date(v) | Self::Time(v) | Self::TimeSpan(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Binary(v) => v.len(),
            Self::Decimal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a plain value, which must match the array's kind exactly.
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (Self::Bool(v), Value::Bool(b)) => v.push(b),
            (Self::Int(v), Value::Int(i)) => v.push(i),
            (Self::Long(v), Value::Long(i)) => v.push(i),
            (Self::Float(v), Value::Float(f)) => v.push(f),
            (Self::Double(v), Value::Double(f)) => v.push(f),
            (Self::DateTime(v), Value::DateTime(dt)) => {
                v.push(temporal::millis_from_datetime(&dt))
            }
            (Self::Date(v), Value::Date(dt)) => v.push(temporal::millis_from_datetime(&dt)),
            (Self::Time(v), Value::Time(t)) => v.push(temporal::millis_from_time(&t)),
            (Self::TimeSpan(v), Value::TimeSpan(d)) => v.push(temporal::millis_from_timespan(&d)),
            (Self::String(v), Value::String(s)) => v.push(s),
            (Self::Binary(v), Value::Binary(b)) => v.push(b),
            (Self::Decimal(v), Value::Decimal(d)) => v.push(d),
            (array, value) => {
                let expected = array.value_type();
                return Err(match value.value_type() {
                    Some(actual) => UsageError::TypeMismatch { expected, actual }.into(),
                    None => UsageError::EnvelopeNotAllowed { expected }.into(),
                });
            }
        }
        Ok(())
    }

    /// Returns the value at `index` as a [`Value`].
    pub fn get_value(&self, index: usize) -> Result<Value> {
        Ok(match self {
            Self::Bool(v) => Value::Bool(v[index]),
            Self::Int(v) => Value::Int(v[index]),
            Self::Long(v) => Value::Long(v[index]),
            Self::Float(v) => Value::Float(v[index]),
            Self::Double(v) => Value::Double(v[index]),
            Self::DateTime(v) => Value::DateTime(temporal::datetime_from_millis(v[index])?),
            Self::Date(v) => Value::Date(temporal::datetime_from_millis(v[index])?),
            Self::Time(v) => Value::Time(temporal::time_from_millis(v[index])?),
            Self::TimeSpan(v) => Value::TimeSpan(temporal::timespan_from_millis(v[index])?),
            Self::String(v) => Value::String(v[index].clone()),
            Self::Binary(v) => Value::Binary(v[index].clone()),
            Self::Decimal(v) => Value::Decimal(v[index].clone()),
        })
    }

    /// Shortens the array to `len` values.
    pub(crate) fn truncate(&mut self, len: usize) {
        match self {
            Self::Bool(v) => v.truncate(len),
            Self::Int(v) => v.truncate(len),
            Self::Long(v) => v.truncate(len),
            Self::Float(v) => v.truncate(len),
            Self::Double(v) => v.truncate(len),
            Self::DateTime(v) | Self::Date(v) | Self::Time(v) | Self::TimeSpan(v) => {
                v.truncate(len)
            }
            Self::String(v) => v.truncate(len),
            Self::Binary(v) => v.truncate(len),
            Self::Decimal(v) => v.truncate(len),
        }
    }

    /// The held booleans, if this is a Bool array.
    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The held strings, if this is a String array.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Writes the homogeneous-array wire form: `i32` count followed by the
    /// kind-specific payload.
    pub(crate) fn write_wire<W: std::io::Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_len(self.len())?;

        match self {
            Self::Bool(values) => {
                let mut payload = Vec::with_capacity(values.len());
                for &v in values {
                    payload.push(if v { 1u8 } else { 0u8 });
                }
                writer.write_bytes(&payload)
            }
            Self::Int(values) => {
                let mut payload = Vec::with_capacity(values.len() * 4);
                for v in values {
                    payload.extend_from_slice(&v.to_le_bytes());
                }
                writer.write_bytes(&payload)
            }
            Self::Long(values) => write_i64_payload(writer, values),
            Self::Float(values) => {
                let mut payload = Vec::with_capacity(values.len() * 4);
                for v in values {
                    let bits = if v.is_nan() {
                        crate::binary::F32_NAN_BITS
                    } else {
                        v.to_bits()
                    };
                    payload.extend_from_slice(&bits.to_le_bytes());
                }
                writer.write_bytes(&payload)
            }
            Self::Double(values) => {
                let mut payload = Vec::with_capacity(values.len() * 8);
                for v in values {
                    let bits = if v.is_nan() {
                        crate::binary::F64_NAN_BITS
                    } else {
                        v.to_bits()
                    };
                    payload.extend_from_slice(&bits.to_le_bytes());
                }
                writer.write_bytes(&payload)
            }
            Self::DateTime(values) | Self::Date(values) => {
                let mut payload = Vec::with_capacity(values.len() * 8);
                for &millis in values {
                    let raw = temporal::datetime_millis_to_wire(millis)?;
                    payload.extend_from_slice(&raw.to_le_bytes());
                }
                writer.write_bytes(&payload)
            }
            Self::Time(values) => {
                let mut payload = Vec::with_capacity(values.len() * 8);
                for &millis in values {
                    payload
                        .extend_from_slice(&temporal::normalize_time_millis(millis).to_le_bytes());
                }
                writer.write_bytes(&payload)
            }
            Self::TimeSpan(values) => write_i64_payload(writer, values),
            Self::Decimal(values) => {
                let mut payload = Vec::with_capacity(values.len() * DECIMAL_WIDTH);
                for v in values {
                    payload.extend_from_slice(&encode_decimal(v)?);
                }
                writer.write_bytes(&payload)
            }
            Self::String(values) => {
                let mut block = Vec::new();
                for s in values {
                    let bytes = s.as_bytes();
                    varint::write_packed(&mut block, wire_len(bytes.len())?);
                    block.extend_from_slice(bytes);
                }
                writer.write_blob(&block)
            }
            Self::Binary(values) => {
                let mut block = Vec::new();
                for b in values {
                    varint::write_packed(&mut block, wire_len(b.len())?);
                    block.extend_from_slice(b);
                }
                writer.write_blob(&block)
            }
        }
    }

    /// Reads the homogeneous-array wire form of the given kind.
    pub(crate) fn read_wire<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        value_type: ValueTypeId,
    ) -> Result<Self> {
        let count = reader.read_len()?;

        Ok(match value_type {
            ValueTypeId::Bool => {
                let bytes = reader.read_bytes(count)?;
                Self::Bool(bytes.iter().map(|&b| b != 0).collect())
            }
            ValueTypeId::Int => {
                let bytes = reader.read_bytes(count * 4)?;
                Self::Int(
                    bytes
                        .chunks_exact(4)
                        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                )
            }
            ValueTypeId::Long => Self::Long(read_i64_payload(reader, count)?),
            ValueTypeId::Float => {
                let bytes = reader.read_bytes(count * 4)?;
                Self::Float(
                    bytes
                        .chunks_exact(4)
                        .map(|c| f32::from_bits(u32::from_le_bytes(c.try_into().unwrap())))
                        .collect(),
                )
            }
            ValueTypeId::Double => {
                let bytes = reader.read_bytes(count * 8)?;
                Self::Double(
                    bytes
                        .chunks_exact(8)
                        .map(|c| f64::from_bits(u64::from_le_bytes(c.try_into().unwrap())))
                        .collect(),
                )
            }
            ValueTypeId::DateTime | ValueTypeId::Date => {
                let raw = read_i64_payload(reader, count)?;
                let mut values = Vec::with_capacity(count);
                for r in raw {
                    values.push(temporal::wire_to_datetime_millis(r)?);
                }
                if value_type == ValueTypeId::DateTime {
                    Self::DateTime(values)
                } else {
                    Self::Date(values)
                }
            }
            ValueTypeId::Time => Self::Time(read_i64_payload(reader, count)?),
            ValueTypeId::TimeSpan => Self::TimeSpan(read_i64_payload(reader, count)?),
            ValueTypeId::Decimal => {
                let bytes = reader.read_bytes(count * DECIMAL_WIDTH)?;
                let mut values = Vec::with_capacity(count);
                for chunk in bytes.chunks_exact(DECIMAL_WIDTH) {
                    values.push(decode_decimal(chunk.try_into().unwrap())?);
                }
                Self::Decimal(values)
            }
            ValueTypeId::String => {
                let block = reader.read_blob()?;
                let mut values = Vec::with_capacity(count);
                let mut pos = 0;
                for _ in 0..count {
                    let slice = read_packed_element(&block, &mut pos)?;
                    let s = std::str::from_utf8(slice).map_err(FormatError::InvalidUtf8)?;
                    values.push(s.to_string());
                }
                Self::String(values)
            }
            ValueTypeId::Binary => {
                let block = reader.read_blob()?;
                let mut values = Vec::with_capacity(count);
                let mut pos = 0;
                for _ in 0..count {
                    values.push(read_packed_element(&block, &mut pos)?.to_vec());
                }
                Self::Binary(values)
            }
        })
    }

    /// Advances the reader past the homogeneous-array wire form without
    /// materializing the values.
    pub(crate) fn skip_wire<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        value_type: ValueTypeId,
    ) -> Result<()> {
        let count = reader.read_len()?;
        match value_type.fixed_size() {
            Some(size) => reader.skip((count * size) as u64),
            None => reader.skip_blob(),
        }
    }
}

impl From<Vec<bool>> for TypedArray {
    fn from(v: Vec<bool>) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<i32>> for TypedArray {
    fn from(v: Vec<i32>) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<i64>> for TypedArray {
    fn from(v: Vec<i64>) -> Self {
        Self::Long(v)
    }
}

impl From<Vec<f32>> for TypedArray {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<f64>> for TypedArray {
    fn from(v: Vec<f64>) -> Self {
        Self::Double(v)
    }
}

impl From<Vec<String>> for TypedArray {
    fn from(v: Vec<String>) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Vec<u8>>> for TypedArray {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<BigDecimal>> for TypedArray {
    fn from(v: Vec<BigDecimal>) -> Self {
        Self::Decimal(v)
    }
}

fn write_i64_payload<W: std::io::Write>(
    writer: &mut BinaryWriter<W>,
    values: &[i64],
) -> Result<()> {
    let mut payload = Vec::with_capacity(values.len() * 8);
    for v in values {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_bytes(&payload)
}

fn read_i64_payload<R: std::io::Read>(
    reader: &mut BinaryReader<R>,
    count: usize,
) -> Result<Vec<i64>> {
    let bytes = reader.read_bytes(count * 8)?;
    Ok(bytes
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
        .collect())
}

fn wire_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| UsageError::LengthOverflow { len }.into())
}

fn read_packed_element<'a>(block: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = varint::read_packed(block, pos)?;
    let len = usize::try_from(len).map_err(|_| FormatError::InvalidLength { read: len })?;
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= block.len())
        .ok_or(FormatError::UnexpectedEof)?;
    let slice = &block[*pos..end];
    *pos = end;
    Ok(slice)
}
