//! Column and table slices: the data-carrying sections of a stream.

use crate::binary::{BinaryReader, BinaryWriter};
use crate::encoding::ValueArray;
use crate::error::{FormatError, Result, UsageError};
use crate::section::{self, SectionTypeId};
use crate::table_metadata::TableMetadata;
use crate::value_type::ValueTypeId;

/// Reserved value-property marking rows with no value. Bool array.
pub const IS_INVALID_PROPERTY: &str = "IsInvalid";

/// Reserved value-property carrying per-row error strings. String array.
pub const ERROR_CODE_PROPERTY: &str = "ErrorCode";

/// Reserved value-property marking rows whose value was replaced. Bool array.
pub const HAS_REPLACED_VALUE_PROPERTY: &str = "HasReplacedValue";

/// A read-only block of one column's data within a slice.
///
/// Besides the values, a column slice carries named value-properties, each an
/// encoded array with one element per row. Custom property names should use a
/// vendor prefix ("Acme.Property"); unprefixed names are reserved.
#[derive(Debug, Clone)]
pub struct ColumnSlice {
    values: ValueArray,
    value_properties: Vec<(String, ValueArray)>,
}

impl ColumnSlice {
    /// The number of rows in this slice.
    pub fn row_count(&self) -> usize {
        self.values.count()
    }

    /// The encoded values.
    pub fn values(&self) -> &ValueArray {
        &self.values
    }

    /// Looks up a value-property by name.
    pub fn value_property(&self, name: &str) -> Option<&ValueArray> {
        self.value_properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values)
    }

    /// The `IsInvalid` array, if present with the right kind.
    pub fn invalid_values(&self) -> Option<&ValueArray> {
        self.value_property(IS_INVALID_PROPERTY)
            .filter(|va| va.value_type() == ValueTypeId::Bool)
    }

    /// The `HasReplacedValue` array, if present with the right kind.
    pub fn replaced_values(&self) -> Option<&ValueArray> {
        self.value_property(HAS_REPLACED_VALUE_PROPERTY)
            .filter(|va| va.value_type() == ValueTypeId::Bool)
    }

    /// The `ErrorCode` array, if present with the right kind.
    pub fn error_codes(&self) -> Option<&ValueArray> {
        self.value_property(ERROR_CODE_PROPERTY)
            .filter(|va| va.value_type() == ValueTypeId::String)
    }

    /// Decomposes the slice into its values and properties.
    pub(crate) fn into_parts(self) -> (ValueArray, Vec<(String, ValueArray)>) {
        (self.values, self.value_properties)
    }

    /// Writes the column-slice section.
    pub fn write<W: std::io::Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        section::write_section_type(writer, SectionTypeId::ColumnSlice)?;

        self.values.write(writer)?;

        writer.write_len(self.value_properties.len())?;
        for (name, values) in &self.value_properties {
            writer.write_string(name)?;
            values.write(writer)?;
        }
        Ok(())
    }

    /// Reads a column-slice section.
    pub fn read<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        section::expect_section_type(reader, SectionTypeId::ColumnSlice)?;

        let values = ValueArray::read(reader)?;

        let property_count = reader.read_len()?;
        let mut value_properties = Vec::with_capacity(property_count);
        for _ in 0..property_count {
            let name = reader.read_string()?;
            let property_values = ValueArray::read(reader)?;
            value_properties.push((name, property_values));
        }

        Ok(Self {
            values,
            value_properties,
        })
    }

    /// Advances the reader past a column-slice section byte for byte.
    pub fn skip<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<()> {
        section::expect_section_type(reader, SectionTypeId::ColumnSlice)?;
        ValueArray::skip(reader)?;
        let property_count = reader.read_len()?;
        for _ in 0..property_count {
            reader.skip_string()?;
            ValueArray::skip(reader)?;
        }
        Ok(())
    }
}

/// Builds a [`ColumnSlice`], enforcing the reserved-property kinds and the
/// per-row alignment of every value-property.
#[derive(Debug)]
pub struct ColumnSliceBuilder {
    values: ValueArray,
    value_properties: Vec<(String, ValueArray)>,
}

impl ColumnSliceBuilder {
    pub fn new(values: ValueArray) -> Self {
        Self {
            values,
            value_properties: Vec::new(),
        }
    }

    /// The number of rows in the slice under construction.
    pub fn row_count(&self) -> usize {
        self.values.count()
    }

    /// Sets the `IsInvalid` property. Must be a Bool array.
    pub fn set_invalid_values(&mut self, values: ValueArray) -> Result<()> {
        self.set_value_property(IS_INVALID_PROPERTY, values)
    }

    /// Sets the `HasReplacedValue` property. Must be a Bool array.
    pub fn set_replaced_values(&mut self, values: ValueArray) -> Result<()> {
        self.set_value_property(HAS_REPLACED_VALUE_PROPERTY, values)
    }

    /// Sets the `ErrorCode` property. Must be a String array.
    pub fn set_error_codes(&mut self, values: ValueArray) -> Result<()> {
        self.set_value_property(ERROR_CODE_PROPERTY, values)
    }

    /// Sets a value-property, replacing any prior value under the same name.
    pub fn set_value_property(&mut self, name: impl Into<String>, values: ValueArray) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(UsageError::EmptyArgument { name: "name" }.into());
        }

        let reserved_kind = match name.as_str() {
            IS_INVALID_PROPERTY => Some((IS_INVALID_PROPERTY, ValueTypeId::Bool)),
            HAS_REPLACED_VALUE_PROPERTY => Some((HAS_REPLACED_VALUE_PROPERTY, ValueTypeId::Bool)),
            ERROR_CODE_PROPERTY => Some((ERROR_CODE_PROPERTY, ValueTypeId::String)),
            _ => None,
        };
        if let Some((reserved, expected)) = reserved_kind {
            if values.value_type() != expected {
                return Err(UsageError::ReservedPropertyType {
                    name: reserved,
                    expected,
                }
                .into());
            }
        }

        if values.count() != self.values.count() {
            return Err(UsageError::RowCountMismatch {
                expected: self.values.count(),
                actual: values.count(),
            }
            .into());
        }

        match self.value_properties.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = values,
            None => self.value_properties.push((name, values)),
        }
        Ok(())
    }

    pub fn build(self) -> ColumnSlice {
        ColumnSlice {
            values: self.values,
            value_properties: self.value_properties,
        }
    }
}

/// One horizontal band of a table: a column slice per column.
///
/// Slices produced by a writer always carry every column; on subset reads the
/// unselected columns are skipped and only the selected ones are materialized.
#[derive(Debug, Clone)]
pub struct TableSlice {
    /// The column count declared on the wire (always the table's full count).
    column_count: usize,
    /// The materialized column slices, in metadata order; on subset reads
    /// only the selected columns appear.
    columns: Vec<ColumnSlice>,
}

impl TableSlice {
    /// The column count declared by the slice section.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The materialized column slices.
    pub fn columns(&self) -> &[ColumnSlice] {
        &self.columns
    }

    pub(crate) fn into_columns(self) -> Vec<ColumnSlice> {
        self.columns
    }

    /// Writes the table-slice section. Every column must be present.
    pub fn write<W: std::io::Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        if self.columns.len() != self.column_count {
            return Err(UsageError::ColumnCountMismatch {
                expected: self.column_count,
                actual: self.columns.len(),
            }
            .into());
        }

        section::write_section_type(writer, SectionTypeId::TableSlice)?;
        writer.write_len(self.columns.len())?;
        for column in &self.columns {
            column.write(writer)?;
        }
        Ok(())
    }

    /// Writes the end-of-table marker.
    pub fn write_end_of_table_marker<W: std::io::Write>(
        writer: &mut BinaryWriter<W>,
    ) -> Result<()> {
        section::write_section_type(writer, SectionTypeId::TableEnd)
    }

    /// Reads the body of a table-slice section (after its tag has been
    /// consumed), materializing only the columns selected by `subset`.
    pub(crate) fn read_body<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        metadata: &TableMetadata,
        subset: Option<&[bool]>,
    ) -> Result<Self> {
        let column_count = reader.read_len()?;

        if column_count != metadata.columns().len() {
            return Err(FormatError::SliceColumnCountMismatch {
                expected: metadata.columns().len(),
                read: column_count,
            }
            .into());
        }

        let mut columns = Vec::new();
        for index in 0..column_count {
            if subset.map_or(true, |s| s[index]) {
                columns.push(ColumnSlice::read(reader)?);
            } else {
                ColumnSlice::skip(reader)?;
            }
        }

        Ok(Self {
            column_count,
            columns,
        })
    }

    /// Collects every remaining slice of the table, up to the end-of-table
    /// marker.
    pub fn read_slices<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        metadata: &TableMetadata,
    ) -> Result<Vec<TableSlice>> {
        Self::read_slices_helper(reader, metadata, None)
    }

    /// Collects every remaining slice, materializing only the columns
    /// selected by `subset`.
    pub fn read_slices_subset<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        metadata: &TableMetadata,
        subset: &[bool],
    ) -> Result<Vec<TableSlice>> {
        validate_subset(metadata, subset)?;
        Self::read_slices_helper(reader, metadata, Some(subset))
    }

    /// Consumes every remaining slice of the table without materializing any
    /// column.
    pub fn skip_slices<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        metadata: &TableMetadata,
    ) -> Result<()> {
        let subset = vec![false; metadata.columns().len()];
        Self::read_slices_helper(reader, metadata, Some(&subset))?;
        Ok(())
    }

    fn read_slices_helper<R: std::io::Read>(
        reader: &mut BinaryReader<R>,
        metadata: &TableMetadata,
        subset: Option<&[bool]>,
    ) -> Result<Vec<TableSlice>> {
        let mut slices = Vec::new();
        loop {
            let section_type = section::read_section_type(reader)?;
            if section_type == SectionTypeId::TableEnd {
                break;
            }
            if section_type != SectionTypeId::TableSlice {
                return Err(FormatError::UnexpectedSectionType {
                    expected: SectionTypeId::TableSlice,
                    read: section_type,
                }
                .into());
            }
            slices.push(Self::read_body(reader, metadata, subset)?);
        }
        Ok(slices)
    }
}

pub(crate) fn validate_subset(metadata: &TableMetadata, subset: &[bool]) -> Result<()> {
    if subset.len() != metadata.columns().len() {
        return Err(UsageError::ColumnCountMismatch {
            expected: metadata.columns().len(),
            actual: subset.len(),
        }
        .into());
    }
    Ok(())
}

/// Builds a [`TableSlice`], enforcing aligned row counts and the table's
/// column count.
#[derive(Debug)]
pub struct TableSliceBuilder {
    expected_columns: usize,
    columns: Vec<ColumnSlice>,
}

impl TableSliceBuilder {
    pub fn new(metadata: &TableMetadata) -> Self {
        Self {
            expected_columns: metadata.columns().len(),
            columns: Vec::with_capacity(metadata.columns().len()),
        }
    }

    /// Adds the slice for the next column. Row counts must agree with the
    /// first column added.
    pub fn add_column(&mut self, column: ColumnSlice) -> Result<()> {
        if let Some(first) = self.columns.first() {
            if column.row_count() != first.row_count() {
                return Err(UsageError::RowCountMismatch {
                    expected: first.row_count(),
                    actual: column.row_count(),
                }
                .into());
            }
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn build(self) -> Result<TableSlice> {
        if self.columns.len() != self.expected_columns {
            return Err(UsageError::ColumnCountMismatch {
                expected: self.expected_columns,
                actual: self.columns.len(),
            }
            .into());
        }

        Ok(TableSlice {
            column_count: self.expected_columns,
            columns: self.columns,
        })
    }
}
