//! Row-based streaming table reader.

use std::io::Read;

use crate::array::TypedArray;
use crate::binary::BinaryReader;
use crate::error::{FormatError, Result, UsageError};
use crate::metadata::ColumnMetadata;
use crate::section::{self, SectionTypeId};
use crate::slice::{self, TableSlice};
use crate::table_metadata::TableMetadata;
use crate::value::Value;
use crate::value_type::ValueTypeId;

/// A simple, row-based interface for importing data from the SBDF format.
///
/// The reader consumes table slices on demand and exposes either row-major
/// values via [`TableReader::read_value`] or full per-slice columnar arrays.
/// An optional column subset restricts which columns are materialized; the
/// remaining columns are skipped byte for byte.
///
/// The caller owns the underlying byte source and is responsible for closing
/// it.
pub struct TableReader<R: Read> {
    reader: BinaryReader<R>,
    metadata: TableMetadata,
    subset: Option<Vec<bool>>,
    columns: Vec<ColumnMetadata>,
    column_types: Vec<ValueTypeId>,
    column_index: usize,
    row_index: usize,
    started: bool,
    finished: bool,
    data: Vec<TypedArray>,
    invalid: Vec<Option<Vec<bool>>>,
    errors: Vec<Option<Vec<String>>>,
    replaced: Vec<Option<Vec<bool>>>,
}

impl<R: Read> TableReader<R> {
    /// Creates a reader over `source` for a table described by `metadata`.
    pub fn new(source: R, metadata: TableMetadata) -> Result<Self> {
        Self::create(source, metadata, None)
    }

    /// Creates a reader that materializes only the columns whose position in
    /// `subset` is true. The mask length must match the metadata's column
    /// count.
    pub fn with_column_subset(source: R, metadata: TableMetadata, subset: &[bool]) -> Result<Self> {
        slice::validate_subset(&metadata, subset)?;
        Self::create(source, metadata, Some(subset.to_vec()))
    }

    fn create(source: R, metadata: TableMetadata, subset: Option<Vec<bool>>) -> Result<Self> {
        let columns: Vec<ColumnMetadata> = match &subset {
            Some(mask) => metadata
                .columns()
                .iter()
                .zip(mask)
                .filter(|(_, &selected)| selected)
                .map(|(column, _)| column.clone())
                .collect(),
            None => metadata.columns().to_vec(),
        };

        let mut column_types = Vec::with_capacity(columns.len());
        for column in &columns {
            column_types.push(column.data_type()?);
        }

        Ok(Self {
            reader: BinaryReader::new(source),
            metadata,
            subset,
            columns,
            column_types,
            column_index: 0,
            row_index: 0,
            started: false,
            finished: false,
            data: Vec::new(),
            invalid: Vec::new(),
            errors: Vec::new(),
            replaced: Vec::new(),
        })
    }

    /// The metadata of the columns this reader materializes, in order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// The number of materialized columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The data arrays of the current slice, one per selected column. `None`
    /// before the first slice has been read.
    pub fn value_arrays(&self) -> Option<&[TypedArray]> {
        self.started.then_some(self.data.as_slice())
    }

    /// The per-column `IsInvalid` arrays of the current slice.
    pub fn invalid_arrays(&self) -> Option<&[Option<Vec<bool>>]> {
        self.started.then_some(self.invalid.as_slice())
    }

    /// The per-column `ErrorCode` arrays of the current slice.
    pub fn error_code_arrays(&self) -> Option<&[Option<Vec<String>>]> {
        self.started.then_some(self.errors.as_slice())
    }

    /// The per-column `HasReplacedValue` arrays of the current slice.
    pub fn replaced_value_arrays(&self) -> Option<&[Option<Vec<bool>>]> {
        self.started.then_some(self.replaced.as_slice())
    }

    /// Reads the next table slice, materializing the selected columns.
    ///
    /// Returns false once the end-of-table marker has been consumed; the
    /// reader then stays at the end and never reads past the marker.
    pub fn read_next_table_slice(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }

        let section_type = section::read_section_type(&mut self.reader)?;
        if section_type == SectionTypeId::TableEnd {
            self.finished = true;
            return Ok(false);
        }
        if section_type != SectionTypeId::TableSlice {
            return Err(FormatError::UnexpectedSectionType {
                expected: SectionTypeId::TableSlice,
                read: section_type,
            }
            .into());
        }

        let slice = TableSlice::read_body(&mut self.reader, &self.metadata, self.subset.as_deref())?;

        self.data.clear();
        self.invalid.clear();
        self.errors.clear();
        self.replaced.clear();

        for column_slice in slice.into_columns() {
            let (values, properties) = column_slice.into_parts();
            let values = values.into_array()?;

            let mut invalid = None;
            let mut errors = None;
            let mut replaced = None;
            for (name, property_values) in properties {
                match name.as_str() {
                    slice::IS_INVALID_PROPERTY
                        if property_values.value_type() == ValueTypeId::Bool =>
                    {
                        invalid = into_bools(property_values)?;
                    }
                    slice::HAS_REPLACED_VALUE_PROPERTY
                        if property_values.value_type() == ValueTypeId::Bool =>
                    {
                        replaced = into_bools(property_values)?;
                    }
                    slice::ERROR_CODE_PROPERTY
                        if property_values.value_type() == ValueTypeId::String =>
                    {
                        errors = into_strings(property_values)?;
                    }
                    // Custom value-properties are opaque to row iteration.
                    _ => {}
                }
            }

            for sideband_len in [
                invalid.as_ref().map(Vec::len),
                replaced.as_ref().map(Vec::len),
                errors.as_ref().map(Vec::len),
            ]
            .into_iter()
            .flatten()
            {
                if sideband_len != values.len() {
                    return Err(UsageError::RowCountMismatch {
                        expected: values.len(),
                        actual: sideband_len,
                    }
                    .into());
                }
            }

            self.data.push(values);
            self.invalid.push(invalid);
            self.errors.push(errors);
            self.replaced.push(replaced);
        }

        if let Some(first) = self.data.first() {
            let rows = first.len();
            for values in &self.data {
                if values.len() != rows {
                    return Err(UsageError::RowCountMismatch {
                        expected: rows,
                        actual: values.len(),
                    }
                    .into());
                }
            }
        }

        self.started = true;
        tracing::trace!(
            rows = self.current_rows(),
            columns = self.data.len(),
            "table slice read"
        );
        Ok(true)
    }

    /// Returns the next value of the table in row-major order, or `None`
    /// once the end-of-table marker is reached.
    ///
    /// Sidebands take precedence over the data array: an invalid row yields
    /// [`Value::Invalid`], a row with a non-empty error code yields
    /// [`Value::Error`], and a replaced row wraps the data value in
    /// [`Value::Replaced`].
    pub fn read_value(&mut self) -> Result<Option<Value>> {
        loop {
            if !self.started || self.row_index >= self.current_rows() {
                if !self.read_next_table_slice()? {
                    return Ok(None);
                }
                self.row_index = 0;
                self.column_index = 0;
            }
            if self.column_types.is_empty() {
                return Ok(None);
            }
            if self.current_rows() > 0 {
                break;
            }
        }

        let column = self.column_index;
        let row = self.row_index;

        self.column_index += 1;
        if self.column_index == self.column_types.len() {
            self.column_index = 0;
            self.row_index += 1;
        }

        if let Some(flags) = &self.invalid[column] {
            if flags[row] {
                return Ok(Some(Value::Invalid));
            }
        }

        if let Some(codes) = &self.errors[column] {
            let code = &codes[row];
            if !code.is_empty() {
                return Ok(Some(Value::Error(code.clone())));
            }
        }

        let value = self.data[column].get_value(row)?;

        if let Some(flags) = &self.replaced[column] {
            if flags[row] {
                return Ok(Some(Value::Replaced(Box::new(value))));
            }
        }

        Ok(Some(value))
    }

    /// A single-pass iterator over the remaining row-major values. Not
    /// restartable; errors end the iteration after being yielded.
    pub fn iter(&mut self) -> Values<'_, R> {
        Values {
            reader: self,
            done: false,
        }
    }

    /// Returns the underlying byte source.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn current_rows(&self) -> usize {
        self.data.first().map_or(0, TypedArray::len)
    }
}

fn into_bools(values: crate::encoding::ValueArray) -> Result<Option<Vec<bool>>> {
    Ok(match values.into_array()? {
        TypedArray::Bool(v) => Some(v),
        _ => None,
    })
}

fn into_strings(values: crate::encoding::ValueArray) -> Result<Option<Vec<String>>> {
    Ok(match values.into_array()? {
        TypedArray::String(v) => Some(v),
        _ => None,
    })
}

/// Iterator over a reader's remaining values. See [`TableReader::iter`].
pub struct Values<'a, R: Read> {
    reader: &'a mut TableReader<R>,
    done: bool,
}

impl<R: Read> Iterator for Values<'_, R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_value() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
