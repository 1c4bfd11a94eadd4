//! Re-index a dataset onto a fixed-frequency time grid and fill numeric gaps.

use super::interpolate::fill_gaps;
use super::timestamp::parse_time_column;
use crate::core::{Column, ColumnData, Dataset};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Upper bound on generated grid rows.
const MAX_GRID_ROWS: i64 = 50_000_000;

/// Regularizes datasets onto a grid with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regularizer {
    step: Duration,
}

impl Default for Regularizer {
    fn default() -> Self {
        Self {
            step: Duration::minutes(1),
        }
    }
}

impl Regularizer {
    /// Create a regularizer with a positive step.
    pub fn new(step: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(ForecastError::InvalidParameter(
                "grid step must be positive".to_string(),
            ));
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Build the regularized dataset.
    ///
    /// The time column comes first in the output, holding the full grid from
    /// the earliest to the latest timestamp. Rows off the grid are dropped,
    /// inserted rows start missing, and numeric columns are gap-filled.
    pub fn regularize(&self, dataset: &Dataset, time_column: &str) -> Result<Dataset> {
        let timestamps = parse_time_column(dataset, time_column)?;
        let (start, end) = match (timestamps.iter().min(), timestamps.iter().max()) {
            (Some(&s), Some(&e)) => (s, e),
            _ => return Err(ForecastError::InsufficientData { needed: 1, got: 0 }),
        };

        let too_wide = || {
            ForecastError::InvalidParameter("time span is too wide for the grid step".to_string())
        };
        // nanosecond arithmetic keeps sub-millisecond offsets off the grid
        let step_ns = self.step.num_nanoseconds().ok_or_else(too_wide)?;
        let span_ns = (end - start).num_nanoseconds().ok_or_else(too_wide)?;
        let rows = span_ns / step_ns + 1;
        if rows > MAX_GRID_ROWS {
            return Err(ForecastError::InvalidParameter(format!(
                "time grid of {} rows exceeds the limit of {}",
                rows, MAX_GRID_ROWS
            )));
        }
        let rows = rows as usize;

        let mut seen: HashMap<DateTime<Utc>, usize> = HashMap::with_capacity(timestamps.len());
        let mut source: Vec<Option<usize>> = vec![None; rows];
        let mut off_grid = 0usize;
        for (row, ts) in timestamps.iter().enumerate() {
            if seen.insert(*ts, row).is_some() {
                return Err(ForecastError::DuplicateTimestamp(ts.to_rfc3339()));
            }
            let offset = (*ts - start).num_nanoseconds().ok_or_else(too_wide)?;
            if offset % step_ns == 0 {
                source[(offset / step_ns) as usize] = Some(row);
            } else {
                off_grid += 1;
            }
        }
        if off_grid > 0 {
            warn!(off_grid, column = time_column, "dropped rows not on the time grid");
        }

        let grid: Vec<Option<DateTime<Utc>>> = (0..rows as i64)
            .map(|i| Some(start + self.step * i as i32))
            .collect();

        let mut columns = Vec::with_capacity(dataset.column_count());
        columns.push(Column::timestamp(time_column, grid));
        for column in dataset.columns() {
            if column.name() == time_column {
                continue;
            }
            let data = match column.data().take(&source) {
                ColumnData::Float(values) => ColumnData::Float(fill_gaps(&values)),
                other => other,
            };
            columns.push(Column::new(column.name(), data));
        }

        debug!(
            input_rows = dataset.row_count(),
            output_rows = rows,
            inserted = rows - (timestamps.len() - off_grid),
            "regularized dataset"
        );
        Dataset::from_columns(columns)
    }
}

/// Regularize onto a one-minute grid.
pub fn regularize(dataset: &Dataset, time_column: &str) -> Result<Dataset> {
    Regularizer::default().regularize(dataset, time_column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnKind;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn minute_text(m: i64) -> Option<String> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Some((base + Duration::minutes(m)).format("%Y-%m-%d %H:%M:%S").to_string())
    }

    #[test]
    fn two_hour_span_yields_121_rows() {
        let ds = Dataset::from_columns(vec![
            Column::text("ts", vec![minute_text(0), minute_text(120)]),
            Column::float("value", vec![Some(0.0), Some(120.0)]),
        ])
        .unwrap();

        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(out.row_count(), 121);
        let values = out.float_values("value").unwrap();
        assert_relative_eq!(values[60].unwrap(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn time_column_moves_first_and_becomes_timestamps() {
        let ds = Dataset::from_columns(vec![
            Column::float("value", vec![Some(1.0), Some(2.0)]),
            Column::text("ts", vec![minute_text(1), minute_text(0)]),
        ])
        .unwrap();

        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(out.column_names(), vec!["ts", "value"]);
        assert_eq!(out.column("ts").unwrap().data().kind(), ColumnKind::Timestamp);
        // Unsorted input is placed by timestamp.
        assert_eq!(out.float_values("value").unwrap(), &[Some(2.0), Some(1.0)]);
    }

    #[test]
    fn gaps_are_filled_only_in_numeric_columns() {
        let minutes = [0, 1, 2, 4, 5, 6];
        let ds = Dataset::from_columns(vec![
            Column::text("ts", minutes.iter().map(|&m| minute_text(m)).collect()),
            Column::float(
                "value",
                minutes.iter().map(|&m| Some((m * m) as f64)).collect(),
            ),
            Column::text("tag", minutes.iter().map(|_| Some("x".to_string())).collect()),
        ])
        .unwrap();

        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(out.row_count(), 7);
        assert_relative_eq!(
            out.float_values("value").unwrap()[3].unwrap(),
            9.0,
            epsilon = 1e-9
        );
        let tag = out.column("tag").unwrap().data();
        assert!(tag.is_missing(3));
        assert!(!tag.is_missing(2));
    }

    #[test]
    fn infinite_readings_survive_regularization() {
        let csv = "ts,value\n\
            2024-01-01 00:00:00,1\n\
            2024-01-01 00:01:00,2\n\
            2024-01-01 00:02:00,inf\n\
            2024-01-01 00:03:00,4\n\
            2024-01-01 00:04:00,5\n\
            2024-01-01 00:05:00,6\n";
        let ds = crate::io::read_csv_from_reader(csv.as_bytes()).unwrap();
        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(
            out.float_values("value").unwrap(),
            &[Some(1.0), Some(2.0), Some(f64::INFINITY), Some(4.0), Some(5.0), Some(6.0)]
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        let ds = Dataset::from_columns(vec![Column::text(
            "ts",
            vec![minute_text(0), minute_text(0)],
        )])
        .unwrap();
        assert!(matches!(
            regularize(&ds, "ts"),
            Err(ForecastError::DuplicateTimestamp(_))
        ));
    }

    #[test]
    fn off_grid_rows_are_dropped() {
        let ds = Dataset::from_columns(vec![
            Column::text(
                "ts",
                vec![
                    Some("2024-01-01 00:00:00".into()),
                    Some("2024-01-01 00:00:30".into()),
                    Some("2024-01-01 00:02:00".into()),
                ],
            ),
            Column::float("value", vec![Some(0.0), Some(99.0), Some(2.0)]),
        ])
        .unwrap();

        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(
            out.float_values("value").unwrap(),
            &[Some(0.0), Some(1.0), Some(2.0)]
        );
    }

    #[test]
    fn sub_millisecond_offsets_do_not_replace_grid_rows() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ds = Dataset::from_columns(vec![
            Column::timestamp(
                "ts",
                vec![
                    Some(base),
                    Some(base + Duration::microseconds(500)),
                    Some(base + Duration::minutes(2)),
                ],
            ),
            Column::float("value", vec![Some(1.0), Some(99.0), Some(3.0)]),
        ])
        .unwrap();

        let out = regularize(&ds, "ts").unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(
            out.float_values("value").unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn sub_millisecond_step_is_handled() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ds = Dataset::from_columns(vec![
            Column::timestamp(
                "ts",
                vec![Some(base), Some(base + Duration::microseconds(2_000))],
            ),
            Column::float("value", vec![Some(0.0), Some(4.0)]),
        ])
        .unwrap();

        let fine = Regularizer::new(Duration::microseconds(500)).unwrap();
        let out = fine.regularize(&ds, "ts").unwrap();
        assert_eq!(out.row_count(), 5);
        assert_relative_eq!(
            out.float_values("value").unwrap()[2].unwrap(),
            2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn custom_step_and_validation() {
        assert!(Regularizer::new(Duration::zero()).is_err());
        let hourly = Regularizer::new(Duration::hours(1)).unwrap();
        let ds = Dataset::from_columns(vec![Column::text(
            "ts",
            vec![minute_text(0), minute_text(180)],
        )])
        .unwrap();
        assert_eq!(hourly.regularize(&ds, "ts").unwrap().row_count(), 4);
    }

    #[test]
    fn empty_and_missing_columns_fail() {
        let empty = Dataset::from_columns(vec![Column::text("ts", vec![])]).unwrap();
        assert!(matches!(
            regularize(&empty, "ts"),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(matches!(
            regularize(&empty, "time"),
            Err(ForecastError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn regularizing_twice_changes_nothing() {
        let minutes = [0, 3, 4, 9, 10, 15];
        let ds = Dataset::from_columns(vec![
            Column::text("ts", minutes.iter().map(|&m| minute_text(m)).collect()),
            Column::float(
                "value",
                minutes.iter().map(|&m| Some((m as f64).sin())).collect(),
            ),
        ])
        .unwrap();

        let once = regularize(&ds, "ts").unwrap();
        let twice = regularize(&once, "ts").unwrap();
        assert_eq!(once, twice);
    }
}
