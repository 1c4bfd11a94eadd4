//! Holdout-versus-forecast comparison and its renderers.

mod chart;
mod export;
mod metrics;
mod table;

pub use chart::SvgChart;
pub use export::CsvExport;
pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use table::{render_dataset, TablePresenter};

use crate::core::{Dataset, ForecastResult};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

/// One joined holdout/forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub timestamp: DateTime<Utc>,
    pub actual: Option<f64>,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Held-out actuals joined with the forecast on timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    target: String,
    model: String,
    level: u8,
    rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Join `test` and `forecast` on the time column.
    ///
    /// Forecast steps without a matching holdout timestamp are dropped.
    pub fn join(
        test: &Dataset,
        forecast: &ForecastResult,
        time_column: &str,
        target_column: &str,
    ) -> Result<Self> {
        let timestamps = test.timestamp_values(time_column)?;
        let actuals = test.float_values(target_column)?;
        let by_time: HashMap<DateTime<Utc>, Option<f64>> = timestamps
            .iter()
            .zip(actuals)
            .filter_map(|(t, a)| t.map(|t| (t, *a)))
            .collect();

        let rows: Vec<ComparisonRow> = forecast
            .iter()
            .filter_map(|p| {
                by_time.get(&p.timestamp).map(|actual| ComparisonRow {
                    timestamp: p.timestamp,
                    actual: *actual,
                    forecast: p.point,
                    lower: p.lower,
                    upper: p.upper,
                })
            })
            .collect();

        if rows.len() < forecast.horizon() {
            warn!(
                matched = rows.len(),
                horizon = forecast.horizon(),
                "forecast steps without holdout rows were dropped"
            );
        }

        Ok(Self {
            target: target_column.to_string(),
            model: forecast.model().to_string(),
            level: forecast.level(),
            rows,
        })
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Accuracy over the steps that have an actual value.
    pub fn metrics(&self) -> Result<AccuracyMetrics> {
        let observed: Vec<&ComparisonRow> =
            self.rows.iter().filter(|r| r.actual.is_some()).collect();
        let actual: Vec<f64> = observed.iter().filter_map(|r| r.actual).collect();
        let point: Vec<f64> = observed.iter().map(|r| r.forecast).collect();
        let lower: Vec<f64> = observed.iter().map(|r| r.lower).collect();
        let upper: Vec<f64> = observed.iter().map(|r| r.upper).collect();
        calculate_metrics(&actual, &point, &lower, &upper)
    }
}

/// Output sink for a comparison.
pub trait Presenter {
    fn render(&mut self, comparison: &Comparison) -> Result<()>;
}
