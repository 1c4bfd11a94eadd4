//! CSV export of a comparison.

use super::{Comparison, Presenter};
use crate::error::{ForecastError, Result};
use std::path::PathBuf;
use tracing::info;

/// Writes `timestamp,<target>,<model>,lo-<level>,hi-<level>` rows.
#[derive(Debug, Clone)]
pub struct CsvExport {
    path: PathBuf,
}

impl CsvExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Presenter for CsvExport {
    fn render(&mut self, comparison: &Comparison) -> Result<()> {
        let io_err = |e: csv::Error| ForecastError::Io(e.to_string());
        let mut wtr = csv::Writer::from_path(&self.path).map_err(io_err)?;

        let level = comparison.level();
        wtr.write_record([
            "timestamp".to_string(),
            comparison.target().to_string(),
            comparison.model().to_string(),
            format!("lo-{}", level),
            format!("hi-{}", level),
        ])
        .map_err(io_err)?;

        for row in comparison.rows() {
            wtr.write_record([
                row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                row.actual.map(|a| a.to_string()).unwrap_or_default(),
                row.forecast.to_string(),
                row.lower.to_string(),
                row.upper.to_string(),
            ])
            .map_err(io_err)?;
        }
        wtr.flush()?;
        info!(path = %self.path.display(), rows = comparison.len(), "comparison exported");
        Ok(())
    }
}
