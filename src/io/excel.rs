//! XLSX reading via calamine. Only the first worksheet is read.

use super::{build_column, normalize_headers, RawCell};
use crate::core::Dataset;
use crate::error::{ForecastError, Result};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the first sheet of an `.xlsx` workbook; the first row is the header.
pub fn read_excel(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ForecastError::Io(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)
        .map_err(|e| ForecastError::ParseError(format!("could not open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ForecastError::ParseError("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ForecastError::ParseError(format!("could not read '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ForecastError::ParseError(format!("sheet '{}' is empty", sheet_name)))?;
    let names = normalize_headers(header.iter().map(|c| c.to_string()).collect())?;

    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(row.get(i).map(to_raw_cell).unwrap_or(RawCell::Missing));
        }
    }

    Dataset::from_columns(
        names
            .into_iter()
            .zip(cells)
            .map(|(name, column)| build_column(name, column))
            .collect(),
    )
}

fn to_raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Missing,
        Data::Int(v) => RawCell::Number {
            value: *v as f64,
            raw: v.to_string(),
        },
        Data::Float(v) if v.is_nan() => RawCell::Missing,
        Data::Float(v) => RawCell::Number {
            value: *v,
            raw: v.to_string(),
        },
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::String(s) => RawCell::from_text(s),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(naive) => RawCell::Date(naive.and_utc()),
            None => RawCell::Text(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
