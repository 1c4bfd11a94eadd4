//! Forecast result structure: point predictions with a confidence band on a time grid.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point predictions and interval bounds, aligned to future timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    timestamps: Vec<DateTime<Utc>>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Confidence level of the band, in percent.
    level: u8,
    model: String,
}

impl ForecastResult {
    /// Create a forecast, checking that all series share the horizon.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: u8,
        model: impl Into<String>,
    ) -> Result<Self> {
        let horizon = timestamps.len();
        for series in [&point, &lower, &upper] {
            if series.len() != horizon {
                return Err(ForecastError::RemoteServiceError(format!(
                    "forecast series length mismatch: expected {}, got {}",
                    horizon,
                    series.len()
                )));
            }
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::InvalidParameter(
                    "forecast timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self {
            timestamps,
            point,
            lower,
            upper,
            level,
            model: model.into(),
        })
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Iterate over the steps in time order.
    pub fn iter(&self) -> impl Iterator<Item = ForecastPoint> + '_ {
        (0..self.horizon()).map(move |i| ForecastPoint {
            timestamp: self.timestamps[i],
            point: self.point[i],
            lower: self.lower[i],
            upper: self.upper[i],
        })
    }

    /// Check that every step has a non-degenerate band around a finite point.
    pub fn has_valid_band(&self) -> bool {
        self.iter().all(|p| {
            p.point.is_finite()
                && p.lower.is_finite()
                && p.upper.is_finite()
                && p.lower <= p.point
                && p.point <= p.upper
                && p.lower < p.upper
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn grid(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::minutes(i as i64)).collect()
    }

    #[test]
    fn forecast_result_exposes_steps() {
        let forecast = ForecastResult::new(
            grid(2),
            vec![2.0, 3.0],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            90,
            "timegpt-1-long-horizon",
        )
        .unwrap();

        assert_eq!(forecast.horizon(), 2);
        assert_eq!(forecast.level(), 90);
        assert_eq!(forecast.model(), "timegpt-1-long-horizon");
        let steps: Vec<ForecastPoint> = forecast.iter().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].point, 3.0);
        assert_eq!(steps[1].lower, 2.0);
        assert_eq!(steps[1].upper, 4.0);
        assert_eq!(steps[1].timestamp, grid(2)[1]);
        assert!(forecast.has_valid_band());
    }

    #[test]
    fn forecast_result_rejects_length_mismatch() {
        let result = ForecastResult::new(grid(2), vec![1.0], vec![0.0], vec![2.0], 90, "m");
        assert!(matches!(result, Err(ForecastError::RemoteServiceError(_))));
    }

    #[test]
    fn forecast_result_rejects_unordered_timestamps() {
        let mut ts = grid(2);
        ts.reverse();
        let result = ForecastResult::new(ts, vec![1.0; 2], vec![0.0; 2], vec![2.0; 2], 90, "m");
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_band_is_detected() {
        let forecast =
            ForecastResult::new(grid(1), vec![1.0], vec![1.0], vec![1.0], 90, "m").unwrap();
        assert!(!forecast.has_valid_band());
        assert!(!forecast.is_empty());
    }
}
