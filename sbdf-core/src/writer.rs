//! Row-based streaming table writer.

use std::io::Write;

use crate::array::TypedArray;
use crate::binary::BinaryWriter;
use crate::encoding::ValueArray;
use crate::error::{Result, UsageError};
use crate::slice::{ColumnSliceBuilder, TableSlice, TableSliceBuilder};
use crate::table_metadata::TableMetadata;
use crate::value::Value;
use crate::value_type::ValueTypeId;

/// The upper limit of rows in one table slice.
pub const COLUMN_SLICE_LIMIT: usize = 10_000;

/// Buffered values of one column within the slice under construction.
///
/// Envelopes are demultiplexed on arrival: the data array always holds a
/// plain value per row (the kind's default for invalid and error rows, the
/// unwrapped replacement for replaced rows) and the sideband lists are
/// allocated lazily on the first envelope, back-filled for earlier rows.
#[derive(Debug)]
struct ColumnBuffer {
    values: TypedArray,
    invalid: Option<Vec<bool>>,
    errors: Option<Vec<String>>,
    replaced: Option<Vec<bool>>,
}

impl ColumnBuffer {
    fn new(value_type: ValueTypeId) -> Self {
        Self {
            values: TypedArray::with_capacity(value_type, COLUMN_SLICE_LIMIT),
            invalid: None,
            errors: None,
            replaced: None,
        }
    }

    fn push(&mut self, value_type: ValueTypeId, value: Value) -> Result<()> {
        let row = self.values.len();

        let (data_value, is_invalid, error, is_replaced) = match value {
            Value::Invalid => (value_type.default_value(), true, None, false),
            Value::Error(message) => (value_type.default_value(), false, Some(message), false),
            Value::Replaced(inner) => (*inner, false, None, true),
            plain => (plain, false, None, false),
        };

        // The kind check happens here; on a mismatch nothing else has been
        // touched yet.
        self.values.push_value(data_value)?;

        push_flag(&mut self.invalid, row, is_invalid);
        push_error(&mut self.errors, row, error);
        push_flag(&mut self.replaced, row, is_replaced);
        Ok(())
    }

    /// Drops any values of an incomplete trailing row.
    fn truncate(&mut self, rows: usize) {
        self.values.truncate(rows);
        if let Some(list) = &mut self.invalid {
            list.truncate(rows);
        }
        if let Some(list) = &mut self.errors {
            list.truncate(rows);
        }
        if let Some(list) = &mut self.replaced {
            list.truncate(rows);
        }
    }
}

fn push_flag(list: &mut Option<Vec<bool>>, row: usize, flag: bool) {
    match list {
        Some(values) => values.push(flag),
        None if flag => {
            let mut values = vec![false; row];
            values.push(true);
            *list = Some(values);
        }
        None => {}
    }
}

fn push_error(list: &mut Option<Vec<String>>, row: usize, error: Option<String>) {
    match (list.as_mut(), error) {
        (Some(values), error) => values.push(error.unwrap_or_default()),
        (None, Some(error)) => {
            let mut values = vec![String::new(); row];
            values.push(error);
            *list = Some(values);
        }
        (None, None) => {}
    }
}

/// A simple, row-based interface for exporting data to the SBDF format.
///
/// Values are added in row-major order; for each row a value must be provided
/// for every column. Slices are flushed automatically every
/// [`COLUMN_SLICE_LIMIT`] rows. The caller owns the underlying sink and is
/// responsible for closing it (a stream may contain more than one table).
pub struct TableWriter<W: Write> {
    writer: BinaryWriter<W>,
    metadata: TableMetadata,
    column_types: Vec<ValueTypeId>,
    buffers: Vec<ColumnBuffer>,
    column_index: usize,
    row_index: usize,
    dirty: bool,
}

impl<W: Write> TableWriter<W> {
    /// Creates a writer over `sink` for a table described by `metadata`.
    pub fn new(sink: W, metadata: TableMetadata) -> Result<Self> {
        let mut column_types = Vec::with_capacity(metadata.columns().len());
        for column in metadata.columns() {
            column_types.push(column.data_type()?);
        }
        let buffers = column_types.iter().map(|&vt| ColumnBuffer::new(vt)).collect();

        Ok(Self {
            writer: BinaryWriter::new(sink),
            metadata,
            column_types,
            buffers,
            column_index: 0,
            row_index: 0,
            dirty: true,
        })
    }

    /// The table metadata this writer serializes against.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Adds the next value in row-major order.
    ///
    /// Plain values must match the current column's kind; invalid, error and
    /// replaced envelopes are always accepted (the replacement inside a
    /// replaced envelope must match the column's kind).
    pub fn add_value(&mut self, value: impl Into<Value>) -> Result<()> {
        if self.column_types.is_empty() {
            return Err(UsageError::ColumnCountMismatch {
                expected: 0,
                actual: 1,
            }
            .into());
        }

        let value_type = self.column_types[self.column_index];
        self.buffers[self.column_index].push(value_type, value.into())?;
        self.dirty = true;

        self.column_index += 1;
        if self.column_index == self.column_types.len() {
            self.column_index = 0;
            self.row_index += 1;

            if self.row_index == COLUMN_SLICE_LIMIT {
                self.flush_slice()?;
            }
        }
        Ok(())
    }

    /// Flushes any buffered rows and writes the end-of-table marker.
    ///
    /// The sink is flushed but not closed; more tables may follow in the
    /// same stream.
    pub fn write_end_of_table(&mut self) -> Result<()> {
        self.flush_slice()?;
        TableSlice::write_end_of_table_marker(&mut self.writer)?;
        self.writer.flush()
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn flush_slice(&mut self) -> Result<()> {
        if self.dirty {
            self.dirty = false;

            let rows = self.row_index;
            let mut slice_builder = TableSliceBuilder::new(&self.metadata);

            for (index, buffer) in self.buffers.iter_mut().enumerate() {
                let value_type = self.column_types[index];
                let mut taken = std::mem::replace(buffer, ColumnBuffer::new(value_type));
                taken.truncate(rows);

                let mut column_builder =
                    ColumnSliceBuilder::new(ValueArray::default_encoding(taken.values));
                if let Some(invalid) = taken.invalid {
                    column_builder.set_invalid_values(ValueArray::default_encoding(
                        TypedArray::Bool(invalid),
                    ))?;
                }
                if let Some(errors) = taken.errors {
                    column_builder.set_error_codes(ValueArray::default_encoding(
                        TypedArray::String(errors),
                    ))?;
                }
                if let Some(replaced) = taken.replaced {
                    column_builder.set_replaced_values(ValueArray::default_encoding(
                        TypedArray::Bool(replaced),
                    ))?;
                }

                slice_builder.add_column(column_builder.build())?;
            }

            slice_builder.build()?.write(&mut self.writer)?;

            tracing::debug!(
                rows,
                columns = self.column_types.len(),
                "table slice written"
            );
        }

        self.writer.flush()?;
        self.column_index = 0;
        self.row_index = 0;
        Ok(())
    }
}
