//! Forecast pipeline: regularize, split, forecast, compare.
//!
//! [`run_forecast`] chains the stages for one forecast request. Every stage
//! except the gateway call is a pure transformation of the input dataset,
//! and nothing is cached between requests.

pub mod split;

pub use split::{split, TrainTestSplit};

use crate::core::{Dataset, ForecastResult};
use crate::error::{ForecastError, Result};
use crate::gateway::{ForecastGateway, ForecastOptions, ForecastRequest};
use crate::presentation::Comparison;
use crate::transform::Regularizer;
use tracing::{debug, info};

/// Everything one forecast request produces.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// Rows in the training prefix.
    pub train_rows: usize,
    /// Held-out trailing window.
    pub test: Dataset,
    pub forecast: ForecastResult,
    pub comparison: Comparison,
}

/// Run the full pipeline on `dataset`.
///
/// # Errors
/// `ColumnNotFound` if either column is absent, `InvalidParameter` when the
/// time and target columns coincide, `InsufficientData` unless the grid holds
/// more rows than the horizon, plus whatever the regularizer or gateway report.
pub async fn run_forecast(
    dataset: &Dataset,
    time_column: &str,
    target_column: &str,
    options: &ForecastOptions,
    gateway: &dyn ForecastGateway,
) -> Result<ForecastRun> {
    options.validate()?;
    if time_column == target_column {
        return Err(ForecastError::InvalidParameter(format!(
            "time and target column are both '{}'",
            time_column
        )));
    }
    dataset.column(time_column)?;
    dataset.column(target_column)?;

    let regularized = Regularizer::new(options.step)?.regularize(dataset, time_column)?;
    let TrainTestSplit { train, test } = split(&regularized, options.horizon)?;
    if train.is_empty() {
        // the holdout consumed every row, nothing is left to train on
        return Err(ForecastError::InsufficientData {
            needed: options.horizon + 1,
            got: regularized.row_count(),
        });
    }
    debug!(
        train = train.row_count(),
        test = test.row_count(),
        "holdout split"
    );

    let request = ForecastRequest {
        train: &train,
        time_column,
        target_column,
        options,
    };
    info!(
        gateway = gateway.name(),
        model = %options.model,
        horizon = options.horizon,
        "requesting forecast"
    );
    let forecast = gateway.forecast(&request).await?;
    let comparison = Comparison::join(&test, &forecast, time_column, target_column)?;
    info!(points = forecast.horizon(), "forecast complete");

    Ok(ForecastRun {
        train_rows: train.row_count(),
        test,
        forecast,
        comparison,
    })
}
