//! Remote forecasting capability.
//!
//! [`ForecastGateway`] is the seam between the local pipeline and a hosted
//! forecasting service. [`TimeGptClient`] talks to the TimeGPT REST API.

mod timegpt;

pub use timegpt::{TimeGptClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

use crate::core::{Dataset, ForecastResult};
use crate::error::{ForecastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Default number of future steps.
pub const DEFAULT_HORIZON: usize = 144;
/// Default confidence level, in percent.
pub const DEFAULT_LEVEL: u8 = 90;
/// Default TimeGPT model.
pub const DEFAULT_MODEL: &str = "timegpt-1-long-horizon";

/// Secret used to authenticate against the forecasting service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret; blank secrets are rejected.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into().trim().to_string();
        if secret.is_empty() {
            return Err(ForecastError::AuthenticationError(
                "API key is empty".to_string(),
            ));
        }
        Ok(Self(secret))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Forecast parameters independent of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOptions {
    pub horizon: usize,
    pub level: u8,
    pub model: String,
    /// Grid step of the training data and the forecast.
    pub step: Duration,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            level: DEFAULT_LEVEL,
            model: DEFAULT_MODEL.to_string(),
            step: Duration::minutes(1),
        }
    }
}

impl ForecastOptions {
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        if self.level == 0 || self.level >= 100 {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in 1..=99, got {}",
                self.level
            )));
        }
        if self.step <= Duration::zero() {
            return Err(ForecastError::InvalidParameter(
                "grid step must be positive".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "model name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Training data handed to a gateway.
#[derive(Debug, Clone, Copy)]
pub struct ForecastRequest<'a> {
    pub train: &'a Dataset,
    pub time_column: &'a str,
    pub target_column: &'a str,
    pub options: &'a ForecastOptions,
}

impl<'a> ForecastRequest<'a> {
    /// Timestamps and target values of the training set.
    ///
    /// The target must be numeric and complete, and the set non-empty.
    pub fn training_series(&self) -> Result<(Vec<DateTime<Utc>>, Vec<f64>)> {
        let timestamps = self.train.timestamp_values(self.time_column)?;
        let target = self.train.float_values(self.target_column)?;
        if target.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let mut ts = Vec::with_capacity(target.len());
        let mut y = Vec::with_capacity(target.len());
        for (t, v) in timestamps.iter().zip(target) {
            match (t, v) {
                (Some(t), Some(v)) => {
                    ts.push(*t);
                    y.push(*v);
                }
                _ => {
                    return Err(ForecastError::MissingValues(
                        self.target_column.to_string(),
                    ))
                }
            }
        }
        Ok((ts, y))
    }
}

/// Future grid timestamps after `last`.
pub fn forecast_timestamps(last: DateTime<Utc>, step: Duration, horizon: usize) -> Vec<DateTime<Utc>> {
    (1..=horizon as i32).map(|i| last + step * i).collect()
}

/// Pandas-style frequency alias for a grid step (`min`, `5min`, `h`, `D`, `s`).
pub fn frequency_alias(step: Duration) -> String {
    let secs = step.num_seconds();
    let (count, unit) = if secs > 0 && secs % 86_400 == 0 {
        (secs / 86_400, "D")
    } else if secs > 0 && secs % 3_600 == 0 {
        (secs / 3_600, "h")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "min")
    } else {
        (secs.max(1), "s")
    };
    if count == 1 {
        unit.to_string()
    } else {
        format!("{}{}", count, unit)
    }
}

/// A remote forecasting capability.
#[async_trait]
pub trait ForecastGateway: Send + Sync {
    /// Forecast `options.horizon` steps past the end of the training set.
    async fn forecast(&self, request: &ForecastRequest<'_>) -> Result<ForecastResult>;

    /// Gateway name for logs.
    fn name(&self) -> &str;
}
