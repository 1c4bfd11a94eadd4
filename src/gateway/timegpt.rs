//! TimeGPT REST client.

use super::{
    forecast_timestamps, frequency_alias, Credential, ForecastGateway, ForecastOptions,
    ForecastRequest,
};
use crate::core::ForecastResult;
use crate::error::{ForecastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public TimeGPT endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.nixtla.io";
/// Client-side request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest error body echoed back in messages.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct SeriesPayload<'a> {
    sizes: Vec<usize>,
    y: &'a [f64],
}

#[derive(Debug, Serialize)]
struct ForecastPayload<'a> {
    series: SeriesPayload<'a>,
    model: &'a str,
    h: usize,
    freq: String,
    clean_ex_first: bool,
    level: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    mean: Vec<f64>,
    #[serde(default)]
    intervals: Option<HashMap<String, Vec<f64>>>,
}

/// Client for the hosted TimeGPT forecasting service.
#[derive(Debug, Clone)]
pub struct TimeGptClient {
    client: Client,
    base_url: String,
    credential: Credential,
    timeout_secs: u64,
}

impl TimeGptClient {
    /// Create a client with the default endpoint and timeout.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_config(credential, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client against `base_url` with a request timeout.
    pub fn with_config(credential: Credential, base_url: &str, timeout_secs: u64) -> Result<Self> {
        if timeout_secs == 0 {
            return Err(ForecastError::InvalidParameter(
                "timeout must be positive".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ForecastError::RemoteServiceError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/forecast", self.base_url)
    }

    fn transport_error(&self, err: reqwest::Error) -> ForecastError {
        if err.is_timeout() {
            ForecastError::RequestTimeout(self.timeout_secs)
        } else {
            ForecastError::RemoteServiceError(err.to_string())
        }
    }
}

fn build_payload<'a>(y: &'a [f64], options: &'a ForecastOptions) -> ForecastPayload<'a> {
    ForecastPayload {
        series: SeriesPayload {
            sizes: vec![y.len()],
            y,
        },
        model: &options.model,
        h: options.horizon,
        freq: frequency_alias(options.step),
        clean_ex_first: true,
        level: vec![options.level],
    }
}

fn parse_response(
    body: &str,
    last: DateTime<Utc>,
    options: &ForecastOptions,
) -> Result<ForecastResult> {
    let response: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| ForecastError::RemoteServiceError(format!("malformed response: {}", e)))?;

    if response.mean.len() != options.horizon {
        return Err(ForecastError::RemoteServiceError(format!(
            "expected {} forecast values, got {}",
            options.horizon,
            response.mean.len()
        )));
    }

    let mut intervals = response.intervals.unwrap_or_default();
    let mut band = |side: &str| {
        let key = format!("{}-{}", side, options.level);
        intervals
            .remove(&key)
            .ok_or_else(|| ForecastError::RemoteServiceError(format!("response has no '{}' interval", key)))
    };
    let lower = band("lo")?;
    let upper = band("hi")?;

    ForecastResult::new(
        forecast_timestamps(last, options.step, options.horizon),
        response.mean,
        lower,
        upper,
        options.level,
        options.model.clone(),
    )
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl ForecastGateway for TimeGptClient {
    async fn forecast(&self, request: &ForecastRequest<'_>) -> Result<ForecastResult> {
        let options = request.options;
        options.validate()?;
        let (timestamps, y) = request.training_series()?;
        let last = *timestamps
            .last()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;

        let payload = build_payload(&y, options);
        info!(
            model = %options.model,
            horizon = options.horizon,
            level = options.level,
            freq = %payload.freq,
            observations = y.len(),
            "requesting forecast"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.credential.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(%status, bytes = body.len(), "forecast response received");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "forecast credential rejected");
            return Err(ForecastError::AuthenticationError(format!(
                "HTTP {}: {}",
                status,
                truncate(&body)
            )));
        }
        if !status.is_success() {
            return Err(ForecastError::RemoteServiceError(format!(
                "HTTP {}: {}",
                status,
                truncate(&body)
            )));
        }

        let forecast = parse_response(&body, last, options)?;
        info!(steps = forecast.horizon(), "forecast received");
        Ok(forecast)
    }

    fn name(&self) -> &str {
        "TimeGPT"
    }
}
