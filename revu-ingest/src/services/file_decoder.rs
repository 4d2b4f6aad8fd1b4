//! Review file decoder
//!
//! Turns an uploaded CSV or spreadsheet buffer into ordered rows keyed by
//! the header row. Pure transform over the buffer; callers run it on the
//! blocking pool for large files.
//!
//! **CSV:** universal newlines, blank lines skipped, RFC 4180 quoting
//! (`""` inside a quoted field is a literal quote, commas inside quotes are
//! data). Missing trailing cells read as empty text. Cell text is kept
//! verbatim; only header names are trimmed.
//!
//! **Spreadsheet:** first sheet only. An empty sheet yields no rows rather
//! than an error.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

use crate::models::{CellValue, RawRow};

/// Decoder errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// File extension is not csv, xlsx or xls
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Buffer could not be parsed in the declared format
    #[error("Failed to parse file: {0}")]
    ParseFailure(String),
}

/// Declared format of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Select the format from a file name's extension (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Result<Self, DecodeError> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            _ => Err(DecodeError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Decode a buffer in the given format
pub fn decode(data: &[u8], format: FileFormat) -> Result<Vec<RawRow>, DecodeError> {
    match format {
        FileFormat::Csv => decode_csv(data),
        FileFormat::Xlsx | FileFormat::Xls => decode_spreadsheet(data),
    }
}

/// Decode CSV bytes
pub fn decode_csv(data: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| DecodeError::ParseFailure(format!("Unable to read header row: {}", e)))?
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let name = String::from_utf8_lossy(field);
            let name = if idx == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name.into_owned()
            };
            name.trim().to_string()
        })
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record
            .map_err(|e| DecodeError::ParseFailure(format!("Unable to read row: {}", e)))?;

        // A whitespace-only line parses as a single blank field
        if record.len() == 1 && String::from_utf8_lossy(&record[0]).trim().is_empty() {
            continue;
        }

        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            let cell = record
                .get(idx)
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .unwrap_or_default();
            row.push(header.clone(), CellValue::Text(cell));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Decode xlsx/xls bytes (first sheet)
pub fn decode_spreadsheet(data: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| DecodeError::ParseFailure(format!("Unable to open the spreadsheet: {}", e)))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        DecodeError::ParseFailure(format!("Unable to read worksheet '{}': {}", sheet_name, e))
    })?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => other.to_string().trim().to_string(),
        })
        .collect();

    let mut rows = Vec::new();
    for cells in rows_iter {
        if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = cells.get(idx).map(cell_value).unwrap_or(CellValue::Empty);
            row.push(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Map a spreadsheet cell onto a raw cell value
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
