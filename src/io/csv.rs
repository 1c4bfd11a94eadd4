//! CSV reading and writing.

use super::{build_column, normalize_headers, RawCell};
use crate::core::Dataset;
use crate::error::{ForecastError, Result};
use std::io::Read;
use std::path::Path;

/// Read a CSV file with a header row.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let file = std::fs::File::open(path.as_ref())?;
    read_csv_from_reader(file)
}

/// Read CSV content from any reader; the first record is the header.
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| ForecastError::ParseError(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let names = normalize_headers(headers)?;

    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); names.len()];
    for record in rdr.records() {
        let record = record.map_err(|e| ForecastError::ParseError(e.to_string()))?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(RawCell::from_text(field));
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

/// Write a dataset as CSV with a header row.
pub fn write_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = ::csv::Writer::from_path(path.as_ref())
        .map_err(|e| ForecastError::Io(e.to_string()))?;
    wtr.write_record(dataset.column_names())
        .map_err(|e| ForecastError::Io(e.to_string()))?;
    for row in 0..dataset.row_count() {
        wtr.write_record(dataset.display_row(row))
            .map_err(|e| ForecastError::Io(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
