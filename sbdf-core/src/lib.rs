//! Reader/writer library for SBDF, a columnar tabular binary file format.
//!
//! SBDF interchanges typed, metadata-rich data tables between analytics
//! tools. A stream is a sequence of magic-number-framed sections: a file
//! header, then per table a metadata section, zero or more table slices of
//! up to 10,000 rows, and an end-of-table marker. Each column slice carries
//! its values as a self-describing encoded array (plain, run-length or
//! packed-bit) plus optional sideband arrays conveying null, error and
//! replaced-value semantics.
//!
//! # Design
//!
//! - **Sequential only**: no random access, no indexes. Readers and writers
//!   operate over caller-owned `io::Read` / `io::Write` streams.
//! - **Strongly typed**: column data lives in per-kind `Vec`s behind the
//!   [`TypedArray`] enum; the row-level API exchanges [`Value`] sum-type
//!   instances.
//! - **Bit-exact**: little-endian scalars, canonicalized NaNs, a
//!   biased-exponent decimal128 and UTC-millisecond temporals, compatible
//!   with peer implementations of the format.
//!
//! # Writing
//!
//! ```no_run
//! use sbdf_core::{
//!     BinaryWriter, ColumnMetadata, FileHeader, TableMetadataBuilder, TableWriter, Value,
//!     ValueTypeId,
//! };
//!
//! # fn main() -> sbdf_core::Result<()> {
//! let file = std::fs::File::create("table.sbdf")?;
//! let mut writer = BinaryWriter::new(std::io::BufWriter::new(file));
//!
//! let mut builder = TableMetadataBuilder::new();
//! builder.add_column(ColumnMetadata::new("id", ValueTypeId::Int)?);
//! builder.add_column(ColumnMetadata::new("name", ValueTypeId::String)?);
//! let metadata = builder.build()?;
//!
//! FileHeader::write_current(&mut writer)?;
//! metadata.write(&mut writer)?;
//!
//! let mut table = TableWriter::new(writer.into_inner(), metadata)?;
//! table.add_value(Value::Int(1))?;
//! table.add_value(Value::String("first".into()))?;
//! table.write_end_of_table()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Reading
//!
//! ```no_run
//! use sbdf_core::{BinaryReader, FileHeader, TableMetadata, TableReader};
//!
//! # fn main() -> sbdf_core::Result<()> {
//! let file = std::fs::File::open("table.sbdf")?;
//! let mut reader = BinaryReader::new(std::io::BufReader::new(file));
//!
//! FileHeader::read(&mut reader)?;
//! let metadata = TableMetadata::read(&mut reader)?;
//!
//! let mut table = TableReader::new(reader.into_inner(), metadata)?;
//! while let Some(value) = table.read_value()? {
//!     println!("{value:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod array;
mod binary;
mod decimal;
mod encoding;
mod error;
mod metadata;
mod reader;
mod section;
mod slice;
mod table_metadata;
pub mod temporal;
mod value;
mod value_type;
mod varint;
mod writer;

pub use array::TypedArray;
pub use binary::{BinaryReader, BinaryWriter};
pub use encoding::{ArrayEncodingId, ValueArray};
pub use error::{FormatError, Result, SbdfError, UsageError};
pub use metadata::{ColumnMetadata, MetadataCollection, MetadataProperty};
pub use reader::{TableReader, Values};
pub use section::{FileHeader, SectionTypeId, MAGIC};
pub use slice::{
    ColumnSlice, ColumnSliceBuilder, TableSlice, TableSliceBuilder, ERROR_CODE_PROPERTY,
    HAS_REPLACED_VALUE_PROPERTY, IS_INVALID_PROPERTY,
};
pub use table_metadata::{TableMetadata, TableMetadataBuilder};
pub use value::Value;
pub use value_type::ValueTypeId;
pub use writer::{TableWriter, COLUMN_SLICE_LIMIT};
