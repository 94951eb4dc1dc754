//! End-to-end write/read round trips over full SBDF streams.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use sbdf_core::{
    BinaryReader, BinaryWriter, ColumnMetadata, FileHeader, SbdfError, TableMetadata,
    TableMetadataBuilder, TableReader, TableSlice, TableWriter, TypedArray, Value, ValueTypeId,
    COLUMN_SLICE_LIMIT,
};

fn metadata(columns: &[(&str, ValueTypeId)]) -> TableMetadata {
    let mut builder = TableMetadataBuilder::new();
    for (name, value_type) in columns {
        builder.add_column(ColumnMetadata::new(*name, *value_type).unwrap());
    }
    builder.build().unwrap()
}

/// Writes a complete stream (header, metadata, values, end marker) and
/// returns its bytes.
fn write_table(metadata: &TableMetadata, values: Vec<Value>) -> Vec<u8> {
    let mut writer = BinaryWriter::new(Vec::new());
    FileHeader::write_current(&mut writer).unwrap();
    metadata.write(&mut writer).unwrap();

    let mut table = TableWriter::new(writer.into_inner(), metadata.clone()).unwrap();
    for value in values {
        table.add_value(value).unwrap();
    }
    table.write_end_of_table().unwrap();
    table.into_inner()
}

/// Reads a complete stream back into row-major values.
fn read_table(bytes: &[u8]) -> (TableMetadata, Vec<Value>) {
    let mut reader = BinaryReader::new(Cursor::new(bytes));
    let header = FileHeader::read(&mut reader).unwrap();
    assert_eq!((header.major_version(), header.minor_version()), (1, 0));

    let metadata = TableMetadata::read(&mut reader).unwrap();
    let mut table = TableReader::new(reader.into_inner(), metadata.clone()).unwrap();
    let values: Vec<Value> = table.iter().collect::<Result<_, _>>().unwrap();
    (metadata, values)
}

#[test]
fn header_only_stream() {
    let mut writer = BinaryWriter::new(Vec::new());
    FileHeader::write_current(&mut writer).unwrap();
    let bytes = writer.into_inner();
    assert_eq!(bytes, [0xdf, 0x5b, 0x01, 0x01, 0x00]);

    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    let header = FileHeader::read(&mut reader).unwrap();
    assert_eq!(header.major_version(), 1);
    assert_eq!(header.minor_version(), 0);

    // Nothing follows the header, so metadata must fail with unexpected EOF.
    let err = TableMetadata::read(&mut reader).unwrap_err();
    assert!(matches!(
        err,
        SbdfError::Format(sbdf_core::FormatError::UnexpectedEof)
    ));
}

#[test]
fn two_column_tiny_table() {
    let metadata = metadata(&[("A", ValueTypeId::Int), ("B", ValueTypeId::String)]);
    let bytes = write_table(
        &metadata,
        vec![
            Value::Int(1),
            Value::from("x"),
            Value::Int(2),
            Value::from("y"),
            Value::Int(3),
            Value::from("z"),
        ],
    );

    let (back, values) = read_table(&bytes);
    assert_eq!(back.columns().len(), 2);
    assert_eq!(back.columns()[0].name().unwrap(), "A");
    assert_eq!(back.columns()[1].data_type().unwrap(), ValueTypeId::String);

    assert_eq!(
        values,
        [
            Value::Int(1),
            Value::from("x"),
            Value::Int(2),
            Value::from("y"),
            Value::Int(3),
            Value::from("z"),
        ]
    );

    // read_value reports end-of-stream after the last value.
    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let mut table = TableReader::new(reader.into_inner(), md).unwrap();
    for _ in 0..6 {
        assert!(table.read_value().unwrap().is_some());
    }
    assert!(table.read_value().unwrap().is_none());
    assert!(table.read_value().unwrap().is_none());
}

#[test]
fn invalid_error_and_replaced_envelopes() {
    let metadata = metadata(&[("C", ValueTypeId::Double)]);
    let bytes = write_table(
        &metadata,
        vec![
            Value::Double(1.0),
            Value::Invalid,
            ValueTypeId::Double
                .replaced_value(Value::Double(3.5))
                .unwrap(),
            ValueTypeId::Double.error_value("bad"),
        ],
    );

    let (_, values) = read_table(&bytes);
    assert_eq!(
        values,
        [
            Value::Double(1.0),
            Value::Invalid,
            Value::Replaced(Box::new(Value::Double(3.5))),
            Value::Error("bad".into()),
        ]
    );

    // Slice-level view of the sidebands and the data array.
    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let mut table = TableReader::new(reader.into_inner(), md).unwrap();
    assert!(table.read_next_table_slice().unwrap());

    assert_eq!(
        table.value_arrays().unwrap()[0],
        TypedArray::Double(vec![1.0, 0.0, 3.5, 0.0])
    );
    assert_eq!(
        table.invalid_arrays().unwrap()[0],
        Some(vec![false, true, false, false])
    );
    assert_eq!(
        table.replaced_value_arrays().unwrap()[0],
        Some(vec![false, false, true, false])
    );
    assert_eq!(
        table.error_code_arrays().unwrap()[0],
        Some(vec!["".to_string(), "".into(), "".into(), "bad".into()])
    );

    assert!(!table.read_next_table_slice().unwrap());
}

#[test]
fn replaced_envelope_with_wrong_inner_kind_rejected() {
    let metadata = metadata(&[("C", ValueTypeId::Double)]);
    let mut table = TableWriter::new(Vec::new(), metadata).unwrap();
    let envelope = ValueTypeId::Int.replaced_value(Value::Int(3)).unwrap();
    assert!(table.add_value(envelope).is_err());
}

#[test]
fn nan_round_trips_to_canonical_negative_nan() {
    let metadata = metadata(&[("f", ValueTypeId::Float), ("d", ValueTypeId::Double)]);
    let bytes = write_table(
        &metadata,
        vec![
            Value::Float(f32::NAN),
            Value::Double(f64::from_bits(0x7FF8_0000_0000_0001)),
        ],
    );

    let (_, values) = read_table(&bytes);
    match &values[0] {
        Value::Float(f) => assert_eq!(f.to_bits(), 0xFFC0_0000),
        other => panic!("unexpected {other:?}"),
    }
    match &values[1] {
        Value::Double(d) => assert_eq!(d.to_bits(), 0xFFF8_0000_0000_0000),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn multi_slice_table() {
    let rows = COLUMN_SLICE_LIMIT + 7;
    let metadata = metadata(&[("n", ValueTypeId::Long)]);
    let values: Vec<Value> = (0..rows as i64).map(Value::Long).collect();
    let bytes = write_table(&metadata, values);

    // The stream holds exactly two slices: one full, one with the overflow.
    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let slices = TableSlice::read_slices(&mut reader, &md).unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].columns()[0].row_count(), COLUMN_SLICE_LIMIT);
    assert_eq!(slices[1].columns()[0].row_count(), 7);

    let (_, back) = read_table(&bytes);
    assert_eq!(back.len(), rows);
    assert_eq!(back[0], Value::Long(0));
    assert_eq!(back[rows - 1], Value::Long(rows as i64 - 1));
}

#[test]
fn exact_slice_limit_emits_single_slice() {
    let metadata = metadata(&[("n", ValueTypeId::Int)]);
    let values: Vec<Value> = (0..COLUMN_SLICE_LIMIT as i32).map(Value::Int).collect();
    let bytes = write_table(&metadata, values);

    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let slices = TableSlice::read_slices(&mut reader, &md).unwrap();
    assert_eq!(slices.len(), 1);
}

#[test]
fn empty_table_emits_one_empty_slice() {
    let metadata = metadata(&[("n", ValueTypeId::Int)]);
    let bytes = write_table(&metadata, Vec::new());

    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let slices = TableSlice::read_slices(&mut reader, &md).unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].columns()[0].row_count(), 0);

    let (_, values) = read_table(&bytes);
    assert!(values.is_empty());
}

#[test]
fn column_subset_read() {
    let metadata = metadata(&[
        ("a", ValueTypeId::Int),
        ("b", ValueTypeId::String),
        ("c", ValueTypeId::Double),
    ]);
    let bytes = write_table(
        &metadata,
        vec![
            Value::Int(1),
            Value::from("one"),
            Value::Double(1.5),
            Value::Int(2),
            Value::from("two"),
            Value::Double(2.5),
        ],
    );

    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();
    let md = TableMetadata::read(&mut reader).unwrap();
    let mut table =
        TableReader::with_column_subset(reader.into_inner(), md, &[true, false, true]).unwrap();

    assert_eq!(table.column_count(), 2);
    assert_eq!(table.columns()[0].name().unwrap(), "a");
    assert_eq!(table.columns()[1].name().unwrap(), "c");

    let values: Vec<Value> = table.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        values,
        [
            Value::Int(1),
            Value::Double(1.5),
            Value::Int(2),
            Value::Double(2.5),
        ]
    );
}

#[test]
fn multiple_tables_in_one_stream() {
    let first = metadata(&[("a", ValueTypeId::Int)]);
    let second = metadata(&[("b", ValueTypeId::String)]);

    let mut writer = BinaryWriter::new(Vec::new());
    FileHeader::write_current(&mut writer).unwrap();

    first.write(&mut writer).unwrap();
    let mut table = TableWriter::new(writer.into_inner(), first).unwrap();
    table.add_value(Value::Int(42)).unwrap();
    table.write_end_of_table().unwrap();

    let mut writer = BinaryWriter::new(table.into_inner());
    second.write(&mut writer).unwrap();
    let mut table = TableWriter::new(writer.into_inner(), second).unwrap();
    table.add_value(Value::from("hello")).unwrap();
    table.write_end_of_table().unwrap();

    let bytes = table.into_inner();

    let mut reader = BinaryReader::new(Cursor::new(&bytes));
    FileHeader::read(&mut reader).unwrap();

    let md = TableMetadata::read(&mut reader).unwrap();
    let mut table = TableReader::new(reader.into_inner(), md).unwrap();
    assert_eq!(table.read_value().unwrap(), Some(Value::Int(42)));
    assert_eq!(table.read_value().unwrap(), None);

    let mut reader = BinaryReader::new(table.into_inner());
    let md = TableMetadata::read(&mut reader).unwrap();
    let mut table = TableReader::new(reader.into_inner(), md).unwrap();
    assert_eq!(table.read_value().unwrap(), Some(Value::from("hello")));
    assert_eq!(table.read_value().unwrap(), None);
}

#[test]
fn temporal_and_decimal_columns_round_trip() {
    use std::str::FromStr;

    let dt = sbdf_core::temporal::datetime_from_millis(1_700_000_000_000).unwrap();
    let time = sbdf_core::temporal::time_from_millis(12 * 3_600_000 + 34 * 60_000).unwrap();
    let span = chrono::TimeDelta::try_milliseconds(-90_000).unwrap();
    let dec = bigdecimal::BigDecimal::from_str("123.123456789").unwrap();

    let metadata = metadata(&[
        ("when", ValueTypeId::DateTime),
        ("day", ValueTypeId::Date),
        ("at", ValueTypeId::Time),
        ("for", ValueTypeId::TimeSpan),
        ("amount", ValueTypeId::Decimal),
    ]);
    let bytes = write_table(
        &metadata,
        vec![
            Value::DateTime(dt),
            Value::Date(dt),
            Value::Time(time),
            Value::TimeSpan(span),
            Value::Decimal(dec.clone()),
        ],
    );

    let (_, values) = read_table(&bytes);
    assert_eq!(
        values,
        [
            Value::DateTime(dt),
            Value::Date(dt),
            Value::Time(time),
            Value::TimeSpan(span),
            Value::Decimal(dec),
        ]
    );
}

#[test]
fn mismatched_kind_rejected_by_writer() {
    let metadata = metadata(&[("a", ValueTypeId::Int)]);
    let mut table = TableWriter::new(Vec::new(), metadata).unwrap();
    assert!(table.add_value(Value::from("not an int")).is_err());
    assert!(table.add_value(Value::Int(1)).is_ok());
}

#[test]
fn file_round_trip_through_disk() {
    let metadata = metadata(&[("id", ValueTypeId::Long), ("tag", ValueTypeId::String)]);

    let mut file = tempfile::tempfile().unwrap();
    {
        let mut writer = BinaryWriter::new(&mut file);
        FileHeader::write_current(&mut writer).unwrap();
        metadata.write(&mut writer).unwrap();
        let mut table = TableWriter::new(writer.into_inner(), metadata.clone()).unwrap();
        for i in 0..100i64 {
            table.add_value(Value::Long(i)).unwrap();
            table.add_value(Value::String(format!("row-{i}"))).unwrap();
        }
        table.write_end_of_table().unwrap();
        table.into_inner().flush().unwrap();
    }

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();

    let (_, values) = read_table(&bytes);
    assert_eq!(values.len(), 200);
    assert_eq!(values[0], Value::Long(0));
    assert_eq!(values[199], Value::String("row-99".into()));
}
