//! Input loading: CSV and JSON files into an in-memory [`Table`].
//!
//! - **Format resolution**: `.json` files are read as an array of records,
//!   everything else (including stdin) as delimited text unless overridden.
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **stdin**: the `-` path convention routes through standard input.
//! - **Ragged rows**: CSV records whose field count differs from the header
//!   are dropped with a warning rather than failing the load.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use encoding_rs::{Encoding, UTF_8};
use log::{info, warn};

use crate::data::{Cell, Table};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Auto,
    Csv,
    Json,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_format(path: &Path, provided: InputFormat) -> InputFormat {
    match provided {
        InputFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Csv,
        },
        other => other,
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    Ok(if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    let mut decoded = decode_record(&headers, encoding)?;
    if let Some(first) = decoded.first_mut() {
        // Spreadsheet exports often lead with a UTF-8 byte order mark.
        *first = first.trim_start_matches('\u{feff}').to_string();
    }
    Ok(decoded.into_iter().map(|h| h.trim().to_string()).collect())
}

/// Reads delimited text into a table. Blank header rows give a zero-column table.
pub fn read_csv_table<R>(reader: R, delimiter: u8, encoding: &'static Encoding) -> Result<Table>
where
    R: Read,
{
    let mut reader = open_csv_reader(reader, delimiter);
    let headers = reader_headers(&mut reader, encoding)?;
    if headers.iter().all(|h| h.is_empty()) {
        return Ok(Table::new(Vec::new(), Vec::new()));
    }
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        if record.len() != headers.len() {
            dropped += 1;
            continue;
        }
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded.iter().map(|v| Cell::from_text(v)).collect());
    }
    if dropped > 0 {
        warn!(
            "Dropped {dropped} row(s) whose field count did not match the {} column header",
            headers.len()
        );
    }
    Ok(Table::new(headers, rows))
}

pub fn read_json_table<R>(mut reader: R, encoding: &'static Encoding) -> Result<Table>
where
    R: Read,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .context("Reading JSON input")?;
    let text = decode_bytes(&bytes, encoding)?;
    if text.trim().is_empty() {
        return Ok(Table::new(Vec::new(), Vec::new()));
    }
    let value: serde_json::Value = serde_json::from_str(&text).context("Parsing JSON input")?;
    Table::from_json_records(&value)
}

pub fn load_table(
    path: &Path,
    format: InputFormat,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Table> {
    let input = open_input(path)?;
    let table = match resolve_format(path, format) {
        InputFormat::Json => read_json_table(input, encoding),
        _ => read_csv_table(input, resolve_input_delimiter(path, delimiter), encoding),
    }
    .with_context(|| format!("Loading table from {path:?}"))?;
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn csv_rows_with_wrong_width_are_dropped() {
        let data = "a,b\n1,2\n3\n4,5,6\n7,8\n";
        let table = read_csv_table(data.as_bytes(), b',', UTF_8).expect("table");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][0], Cell::Text("7".into()));
    }

    #[test]
    fn blank_csv_cells_become_empty() {
        let table = read_csv_table("a,b\n1, \n".as_bytes(), b',', UTF_8).expect("table");
        assert_eq!(table.rows()[0][1], Cell::Empty);
    }

    #[test]
    fn header_bom_is_stripped() {
        let table = read_csv_table("\u{feff}date,v\n2024-01-01,1\n".as_bytes(), b',', UTF_8)
            .expect("table");
        assert_eq!(table.columns()[0], "date");
    }

    #[test]
    fn duplicate_headers_are_renamed_and_kept_apart() {
        let table = read_csv_table("a,a\n1,5\n2,3\n3,9\n".as_bytes(), b',', UTF_8).expect("table");
        assert_eq!(table.columns(), ["a", "a_2"]);

        let names = table.columns().to_vec();
        let correlations = crate::correlation::compute_correlations(&table, &names, 0.0);
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].column_b, "a_2");
        assert!((correlations[0].coefficient - 0.6547).abs() < 1e-3);
    }

    #[test]
    fn legacy_encodings_decode() {
        let bytes = b"name,v\ncaf\xe9,1\n";
        let table = read_csv_table(&bytes[..], b',', WINDOWS_1252).expect("table");
        assert_eq!(table.rows()[0][0], Cell::Text("café".into()));
    }

    #[test]
    fn format_follows_extension_unless_forced() {
        assert_eq!(
            resolve_format(Path::new("data.JSON"), InputFormat::Auto),
            InputFormat::Json
        );
        assert_eq!(
            resolve_format(Path::new("-"), InputFormat::Auto),
            InputFormat::Csv
        );
        assert_eq!(
            resolve_format(Path::new("data.txt"), InputFormat::Json),
            InputFormat::Json
        );
    }

    #[test]
    fn empty_inputs_yield_zero_column_tables() {
        let csv = read_csv_table("".as_bytes(), b',', UTF_8).expect("csv");
        assert_eq!(csv.column_count(), 0);
        let json = read_json_table("[]".as_bytes(), UTF_8).expect("json");
        assert_eq!(json.column_count(), 0);
    }
}
