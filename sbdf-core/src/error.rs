//! Error types for SBDF encoding and decoding.

use thiserror::Error;

use crate::value_type::ValueTypeId;

/// The byte stream violates the SBDF format.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The two-byte section magic number is not 0x5BDF.
    #[error("expected magic number 0x5bdf, read {read:#06x}")]
    BadMagicNumber { read: u16 },

    /// The section type tag is not one of the known tags.
    #[error("unrecognized section type: {read:#04x}")]
    UnknownSectionType { read: u8 },

    /// A known section tag appeared where a different one was required.
    #[error("expected section type {expected:?}, read {read:?}")]
    UnexpectedSectionType {
        expected: crate::section::SectionTypeId,
        read: crate::section::SectionTypeId,
    },

    /// The value type code is not a serializable kind.
    #[error("unrecognized value type code: {read:#04x}")]
    UnknownValueType { read: u8 },

    /// The array encoding id is not one of the known encodings.
    #[error("unrecognized array encoding id: {read:#04x}")]
    UnknownEncoding { read: u8 },

    /// The file header carries a version outside the known list.
    #[error("{major}.{minor} is not a valid format version")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// The stream ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A length or count field is negative.
    #[error("invalid length field: {read}")]
    InvalidLength { read: i32 },

    /// A date/time value lies before 1583-01-01T00:00:00Z or outside the
    /// representable instant range.
    #[error("date out of supported range ({millis} ms from the unix epoch)")]
    DateOutOfRange { millis: i64 },

    /// A decimal on the wire encodes NaN.
    #[error("decimal NaN is not supported")]
    DecimalNan,

    /// A run-length array's occurrence and distinct-value lists disagree.
    #[error("run-length occurrence and value counts differ ({occurrences} vs {values})")]
    RunCountMismatch { occurrences: usize, values: usize },

    /// A run-length array's runs do not sum to the declared count.
    #[error("run-length data expands to {expanded} values, header declares {declared}")]
    RunLengthMismatch { declared: usize, expanded: usize },

    /// The number of column slices on the wire does not match the metadata.
    #[error("table slice has {read} columns, metadata declares {expected}")]
    SliceColumnCountMismatch { expected: usize, read: usize },

    /// A string field holds malformed UTF-8.
    #[error("invalid UTF-8 in string value")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The underlying byte source or sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A programming mistake against the API.
#[derive(Debug, Error)]
pub enum UsageError {
    /// An argument that must be non-empty was empty.
    #[error("the '{name}' argument may not be empty")]
    EmptyArgument { name: &'static str },

    /// A value's kind does not match the declared kind.
    #[error("cannot assign a {actual} value where {expected} is required")]
    TypeMismatch {
        expected: ValueTypeId,
        actual: ValueTypeId,
    },

    /// An envelope value was supplied where a plain value is required.
    #[error("an envelope value cannot be used where a plain {expected} value is required")]
    EnvelopeNotAllowed { expected: ValueTypeId },

    /// A sealed metadata collection was mutated.
    #[error("this metadata collection is sealed and cannot be modified")]
    Sealed,

    /// Two properties with the same name in one collection.
    #[error("a property named '{name}' already exists")]
    DuplicateProperty { name: String },

    /// A property missing from a collection that requires it.
    #[error("no value defined for property '{name}'")]
    MissingProperty { name: String },

    /// A property name shared by several columns has differing kinds or
    /// default values.
    #[error("the value types and default values of the shared column property '{name}' must be identical")]
    ConflictingColumnProperty { name: String },

    /// The column name is empty or otherwise unusable.
    #[error("the column name is not valid")]
    InvalidColumnName,

    /// A sideband or value-property array does not match the value array.
    #[error("array length {actual} does not match the column value count {expected}")]
    RowCountMismatch { expected: usize, actual: usize },

    /// A column count does not line up with the table metadata.
    #[error("column count {actual} does not match the {expected} columns declared by the metadata")]
    ColumnCountMismatch { expected: usize, actual: usize },

    /// One of the three reserved value properties carries the wrong kind.
    #[error("the standard value property '{name}' must be of type {expected}")]
    ReservedPropertyType {
        name: &'static str,
        expected: ValueTypeId,
    },

    /// The requested encoding cannot represent the given kind.
    #[error("{value_type} is not supported by this array encoding")]
    EncodingUnsupported { value_type: ValueTypeId },

    /// A decimal's unscaled magnitude exceeds 34 decimal digits, or its
    /// exponent cannot be represented.
    #[error("decimal value out of representable range")]
    DecimalOutOfRange,

    /// A length exceeds what a 32-bit field can carry.
    #[error("length {len} exceeds the 32-bit wire limit")]
    LengthOverflow { len: usize },
}

/// Any error reported by this crate.
#[derive(Debug, Error)]
pub enum SbdfError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl From<std::io::Error> for SbdfError {
    fn from(e: std::io::Error) -> Self {
        SbdfError::Format(FormatError::Io(e))
    }
}

/// Result type for SBDF operations.
pub type Result<T> = std::result::Result<T, SbdfError>;
