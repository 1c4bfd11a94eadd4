//! Timestamp parsing for the designated time column.

use crate::core::{ColumnData, Dataset};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-time layouts tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse one timestamp. Offsets are converted to UTC; naive values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Parse every value of `column` into a timestamp.
///
/// Fails with `UnparsableTimestamp` on the first value (missing ones
/// included) that cannot be parsed. Numeric columns are rejected.
pub fn parse_time_column(dataset: &Dataset, column: &str) -> Result<Vec<DateTime<Utc>>> {
    let unparsable = |row: usize, value: String| ForecastError::UnparsableTimestamp {
        column: column.to_string(),
        row,
        value,
    };

    match dataset.column(column)?.data() {
        ColumnData::Timestamp(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| unparsable(row, String::new())))
            .collect(),
        ColumnData::Text(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                let text = v.as_deref().unwrap_or_default();
                parse_timestamp(text).ok_or_else(|| unparsable(row, text.to_string()))
            })
            .collect(),
        data @ ColumnData::Float(_) => Err(unparsable(0, data.display_cell(0))),
    }
}
