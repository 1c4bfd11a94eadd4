//! Spreadsheet loaders and writers.
//!
//! Files are dispatched on extension: `.csv` goes through the `csv` reader,
//! `.xlsx` through `calamine`. Column types are inferred the same way for
//! both: all-numeric columns become `Float`, all-date spreadsheet columns
//! become `Timestamp`, everything else is `Text`.
//!
//! # Example
//!
//! ```no_run
//! use easy_forecast::io::load_dataset;
//!
//! let dataset = load_dataset("measurements.csv").unwrap();
//! println!("columns: {:?}", dataset.column_names());
//! ```

mod csv;
mod excel;

pub use self::csv::{read_csv, read_csv_from_reader, write_csv};
pub use self::excel::read_excel;

use crate::core::{Column, ColumnData, Dataset};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Strings treated as missing cells.
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "#n/a", "-nan"];

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Detect the format from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            _ => Err(ForecastError::UnsupportedFileFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Load a CSV or XLSX file into a dataset.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let dataset = match format {
        FileFormat::Csv => read_csv(path)?,
        FileFormat::Xlsx => read_excel(path)?,
    };
    debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// A cell as read from a file, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawCell {
    Missing,
    Number { value: f64, raw: String },
    Text(String),
    Date(DateTime<Utc>),
}

impl RawCell {
    /// Classify a text cell.
    pub(crate) fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            return RawCell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_nan() => RawCell::Missing,
            Ok(value) => RawCell::Number {
                value,
                raw: trimmed.to_string(),
            },
            Err(_) => RawCell::Text(text.to_string()),
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            RawCell::Missing => None,
            RawCell::Number { raw, .. } => Some(raw),
            RawCell::Text(s) => Some(s),
            RawCell::Date(d) => Some(d.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Type a column from its raw cells.
pub(crate) fn build_column(name: String, cells: Vec<RawCell>) -> Column {
    let present = || cells.iter().filter(|c| !matches!(c, RawCell::Missing));
    let all_numbers = present().all(|c| matches!(c, RawCell::Number { .. }));
    let any_present = present().next().is_some();
    let all_dates = any_present && present().all(|c| matches!(c, RawCell::Date(_)));

    let data = if all_numbers {
        ColumnData::Float(
            cells
                .into_iter()
                .map(|c| match c {
                    RawCell::Number { value, .. } => Some(value),
                    _ => None,
                })
                .collect(),
        )
    } else if all_dates {
        ColumnData::Timestamp(
            cells
                .into_iter()
                .map(|c| match c {
                    RawCell::Date(d) => Some(d),
                    _ => None,
                })
                .collect(),
        )
    } else {
        ColumnData::Text(cells.into_iter().map(RawCell::into_text).collect())
    };
    Column::new(name, data)
}

/// Header names with blanks replaced and duplicates rejected.
pub(crate) fn normalize_headers(headers: Vec<String>) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (i, header) in headers.into_iter().enumerate() {
        let name = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.trim().to_string()
        };
        if names.contains(&name) {
            return Err(ForecastError::ParseError(format!(
                "duplicate column header '{}'",
                name
            )));
        }
        names.push(name);
    }
    if names.is_empty() {
        return Err(ForecastError::ParseError("no header row".to_string()));
    }
    Ok(names)
}
