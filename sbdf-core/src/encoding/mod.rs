//! Self-describing encoded value arrays.
//!
//! Every column's values (and every value-property) is serialized as a
//! `ValueArray`: a one-byte encoding id, a one-byte value kind, and an
//! encoding-specific payload. Deserialization dispatches on the encoding id;
//! unknown ids are a format error.

mod bitpack;
mod rle;

use crate::array::TypedArray;
use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{FormatError, Result, UsageError};
use crate::value_type::ValueTypeId;

/// Identifies how an array's payload is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArrayEncodingId {
    /// The values as a homogeneous array; no transformation.
    Plain = 0x01,
    /// Occurrence-counted runs of equal values; runs of 1 to 256.
    RunLength = 0x02,
    /// Booleans packed one per bit, MSB-first within each byte.
    PackedBit = 0x03,
}

impl ArrayEncodingId {
    pub fn from_wire(code: u8) -> Result<Self> {
        Ok(match code {
            0x01 => Self::Plain,
            0x02 => Self::RunLength,
            0x03 => Self::PackedBit,
            other => return Err(FormatError::UnknownEncoding { read: other }.into()),
        })
    }

    pub fn as_wire(self) -> u8 {
        self as u8
    }
}

/// An encoded array of column or property values.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueArray {
    Plain {
        values: TypedArray,
    },
    RunLength {
        value_type: ValueTypeId,
        count: usize,
        occurrences: Vec<u8>,
        values: TypedArray,
    },
    PackedBit {
        count: usize,
        packed: Vec<u8>,
    },
}

impl ValueArray {
    /// Wraps values in the plain encoding.
    pub fn plain(values: TypedArray) -> Self {
        Self::Plain { values }
    }

    /// Run-length encodes the given values. Supported for every simple kind
    /// and String; Binary is rejected.
    pub fn run_length(values: &TypedArray) -> Result<Self> {
        let value_type = values.value_type();
        let count = values.len();

        let (occurrences, distinct) = match values {
            TypedArray::Bool(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Bool(d))
            }
            TypedArray::Int(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Int(d))
            }
            TypedArray::Long(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Long(d))
            }
            TypedArray::Float(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a.to_bits() == b.to_bits());
                (o, TypedArray::Float(d))
            }
            TypedArray::Double(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a.to_bits() == b.to_bits());
                (o, TypedArray::Double(d))
            }
            TypedArray::DateTime(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::DateTime(d))
            }
            TypedArray::Date(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Date(d))
            }
            TypedArray::Time(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Time(d))
            }
            TypedArray::TimeSpan(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::TimeSpan(d))
            }
            TypedArray::String(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::String(d))
            }
            TypedArray::Decimal(v) => {
                let (o, d) = rle::pack_runs(v, |a, b| a == b);
                (o, TypedArray::Decimal(d))
            }
            TypedArray::Binary(_) => {
                return Err(UsageError::EncodingUnsupported { value_type }.into())
            }
        };

        Ok(Self::RunLength {
            value_type,
            count,
            occurrences,
            values: distinct,
        })
    }

    /// Packs booleans into the bit-array encoding.
    pub fn packed_bit(values: &[bool]) -> Self {
        Self::PackedBit {
            count: values.len(),
            packed: bitpack::pack_bits(values),
        }
    }

    /// Chooses the default encoding: packed bits for Bool, plain for every
    /// other kind. Run-length encoding is never chosen automatically.
    pub fn default_encoding(values: TypedArray) -> Self {
        match values {
            TypedArray::Bool(v) => Self::packed_bit(&v),
            other => Self::plain(other),
        }
    }

    /// The kind of the held values.
    pub fn value_type(&self) -> ValueTypeId {
        match self {
            Self::Plain { values } => values.value_type(),
            Self::RunLength { value_type, .. } => *value_type,
            Self::PackedBit { .. } => ValueTypeId::Bool,
        }
    }

    /// The encoding id.
    pub fn encoding_id(&self) -> ArrayEncodingId {
        match self {
            Self::Plain { .. } => ArrayEncodingId::Plain,
            Self::RunLength { .. } => ArrayEncodingId::RunLength,
            Self::PackedBit { .. } => ArrayEncodingId::PackedBit,
        }
    }

    /// The number of logical values represented.
    pub fn count(&self) -> usize {
        match self {
            Self::Plain { values } => values.len(),
            Self::RunLength { count, .. } => *count,
            Self::PackedBit { count, .. } => *count,
        }
    }

    /// Expands this array into its plain values.
    pub fn into_array(self) -> Result<TypedArray> {
        match self {
            Self::Plain { values } => Ok(values),
            Self::PackedBit { count, packed } => {
                Ok(TypedArray::Bool(bitpack::unpack_bits(count, &packed)))
            }
            Self::RunLength {
                value_type,
                count,
                occurrences,
                values,
            } => {
                if occurrences.len() != values.len() {
                    return Err(FormatError::RunCountMismatch {
                        occurrences: occurrences.len(),
                        values: values.len(),
                    }
                    .into());
                }
                let expanded: usize = occurrences.iter().map(|o| *o as usize + 1).sum();
                if expanded != count {
                    return Err(FormatError::RunLengthMismatch {
                        declared: count,
                        expanded,
                    }
                    .into());
                }

                Ok(match values {
                    TypedArray::Bool(v) => {
                        TypedArray::Bool(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Int(v) => TypedArray::Int(rle::unpack_runs(count, &occurrences, &v)),
                    TypedArray::Long(v) => {
                        TypedArray::Long(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Float(v) => {
                        TypedArray::Float(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Double(v) => {
                        TypedArray::Double(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::DateTime(v) => {
                        TypedArray::DateTime(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Date(v) => {
                        TypedArray::Date(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Time(v) => {
                        TypedArray::Time(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::TimeSpan(v) => {
                        TypedArray::TimeSpan(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::String(v) => {
                        TypedArray::String(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Decimal(v) => {
                        TypedArray::Decimal(rle::unpack_runs(count, &occurrences, &v))
                    }
                    TypedArray::Binary(_) => {
                        return Err(UsageError::EncodingUnsupported { value_type }.into())
                    }
                })
            }
        }
    }

    /// Expands a copy of this array into its plain values.
    pub fn to_array(&self) -> Result<TypedArray> {
        self.clone().into_array()
    }

    /// Serializes the encoding id, kind and payload.
    pub fn write<W: std::io::Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u8(self.encoding_id().as_wire())?;
        self.value_type().write(writer)?;

        match self {
            Self::Plain { values } => values.write_wire(writer),
            Self::RunLength {
                count,
                occurrences,
                values,
                ..
            } => {
                writer.write_len(*count)?;
                writer.write_blob(occurrences)?;
                values.write_wire(writer)
            }
            Self::PackedBit { count, packed } => {
                writer.write_len(*count)?;
                writer.write_bytes(packed)
            }
        }
    }

    /// Deserializes a value array of any encoding.
    pub fn read<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let encoding = ArrayEncodingId::from_wire(reader.read_u8()?)?;
        let value_type = ValueTypeId::read(reader)?;

        Ok(match encoding {
            ArrayEncodingId::Plain => Self::Plain {
                values: TypedArray::read_wire(reader, value_type)?,
            },
            ArrayEncodingId::RunLength => {
                let count = reader.read_len()?;
                let occurrences = reader.read_blob()?;
                let values = TypedArray::read_wire(reader, value_type)?;
                Self::RunLength {
                    value_type,
                    count,
                    occurrences,
                    values,
                }
            }
            ArrayEncodingId::PackedBit => {
                let count = reader.read_len()?;
                let packed = reader.read_bytes(bitpack::packed_byte_len(count))?;
                Self::PackedBit { count, packed }
            }
        })
    }

    /// Advances the reader past one value array without materializing it.
    pub fn skip<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<()> {
        let encoding = ArrayEncodingId::from_wire(reader.read_u8()?)?;
        let value_type = ValueTypeId::read(reader)?;

        match encoding {
            ArrayEncodingId::Plain => TypedArray::skip_wire(reader, value_type),
            ArrayEncodingId::RunLength => {
                reader.read_len()?;
                reader.skip_blob()?;
                TypedArray::skip_wire(reader, value_type)
            }
            ArrayEncodingId::PackedBit => {
                let count = reader.read_len()?;
                reader.skip(bitpack::packed_byte_len(count) as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::value_type::ValueTypeId;

    fn round_trip(array: &ValueArray) -> ValueArray {
        let mut w = BinaryWriter::new(Vec::new());
        array.write(&mut w).unwrap();
        let mut r = BinaryReader::new(Cursor::new(w.into_inner()));
        ValueArray::read(&mut r).unwrap()
    }

    #[test]
    fn plain_round_trip() {
        let array = ValueArray::plain(TypedArray::Int(vec![1, 2, 3]));
        let back = round_trip(&array);
        assert_eq!(back, array);
        assert_eq!(back.into_array().unwrap(), TypedArray::Int(vec![1, 2, 3]));
    }

    #[test]
    fn rle_wire_prefix_and_round_trip() {
        let input = vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 4, 4, 5, 999, 999, -1];
        let array = ValueArray::run_length(&TypedArray::Int(input.clone())).unwrap();

        let mut w = BinaryWriter::new(Vec::new());
        array.write(&mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes[0], 0x02); // encoding id
        assert_eq!(bytes[1], 0x02); // Int kind
        assert_eq!(&bytes[2..6], &18i32.to_le_bytes());

        let back = round_trip(&array);
        assert_eq!(back.into_array().unwrap(), TypedArray::Int(input));
    }

    #[test]
    fn rle_of_binary_rejected() {
        let err = ValueArray::run_length(&TypedArray::Binary(vec![vec![1]])).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SbdfError::Usage(UsageError::EncodingUnsupported { .. })
        ));
    }

    #[test]
    fn rle_strings_round_trip() {
        let input: Vec<String> = ["a", "a", "b", "b", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let array = ValueArray::run_length(&TypedArray::String(input.clone())).unwrap();
        let back = round_trip(&array);
        assert_eq!(back.into_array().unwrap(), TypedArray::String(input));
    }

    #[test]
    fn packed_bit_sizes_and_round_trip() {
        let empty = ValueArray::packed_bit(&[]);
        assert!(matches!(&empty, ValueArray::PackedBit { packed, .. } if packed.is_empty()));

        let seven = ValueArray::packed_bit(&[true; 7]);
        assert!(matches!(&seven, ValueArray::PackedBit { packed, .. } if packed.len() == 1));

        let values: Vec<bool> = (0..203).map(|i| i % 2 == 0).collect();
        let array = ValueArray::packed_bit(&values);
        assert!(matches!(&array, ValueArray::PackedBit { packed, .. } if packed.len() == 26));

        let back = round_trip(&array);
        assert_eq!(back.into_array().unwrap(), TypedArray::Bool(values));
    }

    #[test]
    fn default_encoding_selection() {
        let bools = ValueArray::default_encoding(TypedArray::Bool(vec![true]));
        assert_eq!(bools.encoding_id(), ArrayEncodingId::PackedBit);

        for vt in ValueTypeId::ALL {
            if vt == ValueTypeId::Bool {
                continue;
            }
            let array = ValueArray::default_encoding(TypedArray::empty(vt));
            assert_eq!(array.encoding_id(), ArrayEncodingId::Plain);
            assert_eq!(array.value_type(), vt);
        }
    }

    #[test]
    fn unknown_encoding_id_rejected() {
        let mut r = BinaryReader::new(Cursor::new(vec![0x04, 0x02, 0, 0, 0, 0]));
        assert!(matches!(
            ValueArray::read(&mut r).unwrap_err(),
            crate::error::SbdfError::Format(FormatError::UnknownEncoding { read: 0x04 })
        ));
    }

    #[test]
    fn run_totals_must_match_declared_count() {
        // Declares 5 values but the runs expand to 4.
        let mut w = BinaryWriter::new(Vec::new());
        w.write_u8(0x02).unwrap();
        w.write_u8(0x02).unwrap();
        w.write_i32(5).unwrap();
        w.write_i32(1).unwrap();
        w.write_u8(3).unwrap(); // one run of 4
        w.write_i32(1).unwrap();
        w.write_i32(42).unwrap();

        let mut r = BinaryReader::new(Cursor::new(w.into_inner()));
        let array = ValueArray::read(&mut r).unwrap();
        assert!(matches!(
            array.into_array().unwrap_err(),
            crate::error::SbdfError::Format(FormatError::RunLengthMismatch {
                declared: 5,
                expanded: 4
            })
        ));
    }

    #[test]
    fn skip_each_encoding() {
        let arrays = [
            ValueArray::plain(TypedArray::String(vec!["a".into(), "bb".into()])),
            ValueArray::run_length(&TypedArray::Long(vec![9, 9, 9, 1])).unwrap(),
            ValueArray::packed_bit(&[true, false, true]),
        ];

        let mut w = BinaryWriter::new(Vec::new());
        for array in &arrays {
            array.write(&mut w).unwrap();
        }
        let sentinel = ValueArray::plain(TypedArray::Int(vec![77]));
        sentinel.write(&mut w).unwrap();

        let mut r = BinaryReader::new(Cursor::new(w.into_inner()));
        for _ in 0..arrays.len() {
            ValueArray::skip(&mut r).unwrap();
        }
        assert_eq!(ValueArray::read(&mut r).unwrap(), sentinel);
    }
}
