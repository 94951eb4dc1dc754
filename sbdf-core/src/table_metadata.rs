//! Table-level metadata and its section codec.

use rustc_hash::FxHashMap;

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::{Result, UsageError};
use crate::metadata::{ColumnMetadata, MetadataCollection, MetadataProperty};
use crate::section::{self, SectionTypeId};
use crate::value::Value;
use crate::value_type::ValueTypeId;

/// Immutable table metadata: the table's own properties plus ordered column
/// metadata. Column order is significant and matches the column order of
/// every slice in the stream.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    properties: MetadataCollection,
    columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// The metadata of the table's columns, in slice order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Looks up a table property by name.
    pub fn property(&self, name: &str) -> Option<&MetadataProperty> {
        self.properties.property(name)
    }

    /// Looks up a table property's value by name.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.properties.value(name)
    }

    /// Iterates the table properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = &MetadataProperty> {
        self.properties.iter()
    }

    /// The number of table properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Writes the table-metadata section.
    ///
    /// A property name shared by several columns must carry the same kind
    /// and default value everywhere; a conflict fails before any bytes are
    /// emitted.
    pub fn write<W: std::io::Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        // Collect the distinct column properties first so a conflicting
        // definition never produces partial output.
        let mut distinct: Vec<&MetadataProperty> = Vec::new();
        let mut by_name: FxHashMap<&str, usize> = FxHashMap::default();

        for column in &self.columns {
            for property in column.iter() {
                match by_name.get(property.name()) {
                    Some(&slot) => {
                        let existing = distinct[slot];
                        if existing.value_type() != property.value_type()
                            || existing.default_value() != property.default_value()
                        {
                            return Err(UsageError::ConflictingColumnProperty {
                                name: property.name().to_string(),
                            }
                            .into());
                        }
                    }
                    None => {
                        by_name.insert(property.name(), distinct.len());
                        distinct.push(property);
                    }
                }
            }
        }

        section::write_section_type(writer, SectionTypeId::TableMetadata)?;

        writer.write_len(self.properties.len())?;
        for property in self.properties.iter() {
            property.write(writer)?;
        }

        writer.write_len(self.columns.len())?;

        writer.write_len(distinct.len())?;
        for property in &distinct {
            writer.write_string(property.name())?;
            property.value_type().write(writer)?;
            match property.default_value() {
                Some(default) => {
                    writer.write_bool(true)?;
                    default.write_wire(property.value_type(), writer)?;
                }
                None => writer.write_bool(false)?,
            }
        }

        for column in &self.columns {
            for key in &distinct {
                match column.property(key.name()).and_then(|p| p.value()) {
                    Some(value) => {
                        writer.write_bool(true)?;
                        value.write_wire(key.value_type(), writer)?;
                    }
                    None => writer.write_bool(false)?,
                }
            }
        }

        Ok(())
    }

    /// Reads a table-metadata section.
    pub fn read<R: std::io::Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        section::expect_section_type(reader, SectionTypeId::TableMetadata)?;

        let mut builder = TableMetadataBuilder::new();

        let table_property_count = reader.read_len()?;
        for _ in 0..table_property_count {
            builder.add_property(MetadataProperty::read(reader)?)?;
        }

        let column_count = reader.read_len()?;
        let mut columns: Vec<ColumnMetadata> = (0..column_count)
            .map(|_| ColumnMetadata::empty())
            .collect();

        struct PropertyKey {
            name: String,
            value_type: ValueTypeId,
            default_value: Option<Value>,
        }

        let distinct_count = reader.read_len()?;
        let mut keys = Vec::with_capacity(distinct_count);
        for _ in 0..distinct_count {
            let name = reader.read_string()?;
            let value_type = ValueTypeId::read(reader)?;
            let default_value = if reader.read_bool()? {
                Some(Value::read_wire(value_type, reader)?)
            } else {
                None
            };
            keys.push(PropertyKey {
                name,
                value_type,
                default_value,
            });
        }

        for column in &mut columns {
            for key in &keys {
                if reader.read_bool()? {
                    let value = Value::read_wire(key.value_type, reader)?;
                    column.add_property(MetadataProperty::from_parts(
                        key.name.clone(),
                        key.value_type,
                        Some(value),
                        key.default_value.clone(),
                    )?)?;
                }
            }
        }

        for column in columns {
            builder.add_column(column);
        }

        builder.build()
    }
}

/// Builds a [`TableMetadata`] from table properties and column metadata.
#[derive(Debug, Default)]
pub struct TableMetadataBuilder {
    properties: MetadataCollection,
    columns: Vec<ColumnMetadata>,
}

impl TableMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder holding mutable copies of an existing table's
    /// metadata.
    pub fn from_metadata(other: &TableMetadata) -> Self {
        Self {
            properties: other.properties.unsealed_copy(),
            columns: other.columns.iter().map(|c| c.mutable_copy()).collect(),
        }
    }

    /// Adds metadata for the next column of the table.
    pub fn add_column(&mut self, column: ColumnMetadata) {
        self.columns.push(column);
    }

    /// Adds a table property.
    pub fn add_property(&mut self, property: MetadataProperty) -> Result<()> {
        self.properties.add_property(property)
    }

    /// The columns added so far.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Validates every column and seals the result.
    pub fn build(self) -> Result<TableMetadata> {
        let Self {
            mut properties,
            mut columns,
        } = self;

        for column in &columns {
            column.validate_complete()?;
        }

        properties.seal();
        for column in &mut columns {
            column.seal();
        }

        Ok(TableMetadata {
            properties,
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn two_column_metadata() -> TableMetadata {
        let mut builder = TableMetadataBuilder::new();
        builder
            .add_property(MetadataProperty::string("Generator", "tests").unwrap())
            .unwrap();
        builder.add_column(ColumnMetadata::new("A", ValueTypeId::Int).unwrap());
        builder.add_column(ColumnMetadata::new("B", ValueTypeId::String).unwrap());
        builder.build().unwrap()
    }

    fn round_trip(metadata: &TableMetadata) -> TableMetadata {
        let mut w = BinaryWriter::new(Vec::new());
        metadata.write(&mut w).unwrap();
        let mut r = BinaryReader::new(Cursor::new(w.into_inner()));
        TableMetadata::read(&mut r).unwrap()
    }

    #[test]
    fn basic_round_trip() {
        let metadata = two_column_metadata();
        let back = round_trip(&metadata);

        assert_eq!(back.property_count(), 1);
        assert_eq!(
            back.value("Generator"),
            Some(&Value::String("tests".into()))
        );
        assert_eq!(back.columns().len(), 2);
        assert_eq!(back.columns()[0].name().unwrap(), "A");
        assert_eq!(back.columns()[0].data_type().unwrap(), ValueTypeId::Int);
        assert_eq!(back.columns()[1].name().unwrap(), "B");
        assert_eq!(back.columns()[1].data_type().unwrap(), ValueTypeId::String);
    }

    #[test]
    fn custom_column_properties_round_trip() {
        let mut builder = TableMetadataBuilder::new();
        let mut a = ColumnMetadata::new("A", ValueTypeId::Int).unwrap();
        a.add_property(
            MetadataProperty::new(
                "unit",
                ValueTypeId::String,
                Value::String("m".into()),
                Some(Value::String(String::new())),
            )
            .unwrap(),
        )
        .unwrap();
        builder.add_column(a);
        // Column B does not carry "unit" at all.
        builder.add_column(ColumnMetadata::new("B", ValueTypeId::Double).unwrap());
        let metadata = builder.build().unwrap();

        let back = round_trip(&metadata);
        let unit = back.columns()[0].property("unit").unwrap();
        assert_eq!(unit.value(), Some(&Value::String("m".into())));
        assert_eq!(unit.default_value(), Some(&Value::String(String::new())));
        assert!(back.columns()[1].property("unit").is_none());
    }

    #[test]
    fn shared_property_conflict_fails_before_output() {
        let mut builder = TableMetadataBuilder::new();
        let mut a = ColumnMetadata::new("A", ValueTypeId::Int).unwrap();
        a.add_property(MetadataProperty::string("unit", "m").unwrap())
            .unwrap();
        let mut b = ColumnMetadata::new("B", ValueTypeId::Int).unwrap();
        b.add_property(MetadataProperty::int("unit", 3).unwrap())
            .unwrap();
        builder.add_column(a);
        builder.add_column(b);
        let metadata = builder.build().unwrap();

        let mut w = BinaryWriter::new(Vec::new());
        let err = metadata.write(&mut w).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SbdfError::Usage(UsageError::ConflictingColumnProperty { .. })
        ));
        assert!(w.into_inner().is_empty());
    }

    #[test]
    fn incomplete_column_fails_build() {
        let mut builder = TableMetadataBuilder::new();
        builder.add_column(ColumnMetadata::empty());
        assert!(builder.build().is_err());
    }

    #[test]
    fn built_metadata_is_sealed() {
        let metadata = two_column_metadata();
        assert!(metadata.columns()[0].is_sealed());

        // A mutable copy can be extended and rebuilt.
        let mut builder = TableMetadataBuilder::from_metadata(&metadata);
        builder
            .add_property(MetadataProperty::int("RowHint", 100).unwrap())
            .unwrap();
        let rebuilt = builder.build().unwrap();
        assert_eq!(rebuilt.property_count(), 2);
        assert_eq!(rebuilt.columns().len(), 2);
    }

    #[test]
    fn empty_table_round_trip() {
        let metadata = TableMetadataBuilder::new().build().unwrap();
        let back = round_trip(&metadata);
        assert_eq!(back.columns().len(), 0);
        assert_eq!(back.property_count(), 0);
    }
}
