mod error;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use error::{exit_with_error, CliError, CliResult};
use sbdf_core::{BinaryReader, FileHeader, TableMetadata, TableReader, Value};

#[derive(Parser)]
#[command(name = "sbdf", about = "Dump the contents of an SBDF file", version)]
struct Cli {
    /// Path to the SBDF file to dump
    file: PathBuf,
}

fn init_tracing() {
    // Log only when the user opts in via RUST_LOG.
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "off".into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_tracing();

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let file = File::open(&cli.file)
        .map_err(|e| CliError::Input(format!("cannot open {}: {e}", cli.file.display())))?;
    let mut reader = BinaryReader::new(BufReader::new(file));

    let header = FileHeader::read(&mut reader)?;
    println!(
        "format version {}.{}",
        header.major_version(),
        header.minor_version()
    );

    let metadata = TableMetadata::read(&mut reader)?;

    for property in metadata.properties() {
        println!("table property {}: {:?}", property.name(), property.value());
    }

    let columns = metadata.columns().to_vec();
    println!("{} column(s)", columns.len());
    for column in &columns {
        println!("  {} ({})", column.name()?, column.data_type()?);
        for property in column.assigned_properties() {
            println!("    {}: {:?}", property.name(), property.value());
        }
    }

    let mut table = TableReader::new(reader.into_inner(), metadata)?;

    let mut row = 0usize;
    let mut column = 0usize;
    while let Some(value) = table.read_value()? {
        if column == 0 {
            print!("{row}:");
        }
        print!(" {}", render(&value));
        column += 1;
        if column == columns.len() {
            println!();
            column = 0;
            row += 1;
        }
    }
    if column != 0 {
        println!();
    }
    println!("{row} row(s)");

    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::DateTime(v) | Value::Date(v) => v.to_rfc3339(),
        Value::Time(v) => v.to_string(),
        Value::TimeSpan(v) => format!("{}ms", v.num_milliseconds()),
        Value::String(v) => format!("{v:?}"),
        Value::Binary(v) => format!("{} byte(s)", v.len()),
        Value::Decimal(v) => v.to_string(),
        Value::Invalid => "<invalid>".to_string(),
        Value::Error(e) => format!("<error: {e}>"),
        Value::Replaced(inner) => format!("<replaced: {}>", render(inner)),
    }
}
