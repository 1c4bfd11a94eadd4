//! Accuracy metrics for a forecast against held-out actuals.

use crate::error::{ForecastError, Result};

/// Accuracy of a forecast over the holdout window.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// Share of actuals inside the confidence band, in `[0, 1]`.
    pub coverage: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Arguments
/// * `actual` - Held-out observed values
/// * `predicted` - Point forecasts
/// * `lower` / `upper` - Interval bounds used for coverage
pub fn calculate_metrics(
    actual: &[f64],
    predicted: &[f64],
    lower: &[f64],
    upper: &[f64],
) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    for other in [predicted, lower, upper] {
        if other.len() != actual.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "metric inputs differ in length: expected {}, got {}",
                actual.len(),
                other.len()
            )));
        }
    }

    let n = actual.len() as f64;

    let mae: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let mse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;

    let rmse = mse.sqrt();

    // MAPE (only if no zeros in actual)
    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| ((a - p) / a).abs())
            .sum();
        Some(100.0 * sum / n)
    };

    let smape: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n;

    let inside = actual
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .filter(|(&a, (&lo, &hi))| a >= lo && a <= hi)
        .count();
    let coverage = inside as f64 / n;

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse,
        mape,
        smape,
        coverage,
    })
}
