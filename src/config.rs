//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! the environment (`NIXTLA_API_KEY`, `EASY_FORECAST_BASE_URL`), then
//! command-line flags applied by the binary.

use crate::error::{ForecastError, Result};
use crate::gateway::{
    Credential, ForecastOptions, DEFAULT_BASE_URL, DEFAULT_HORIZON, DEFAULT_LEVEL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the TimeGPT API key.
pub const API_KEY_ENV: &str = "NIXTLA_API_KEY";
/// Environment variable overriding the service base URL.
pub const BASE_URL_ENV: &str = "EASY_FORECAST_BASE_URL";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Holdout length and forecast horizon.
    pub horizon: usize,
    /// Confidence level in percent.
    pub level: u8,
    pub model: String,
    /// Regularization grid step in minutes.
    pub step_minutes: i64,
    pub base_url: String,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    /// Rows shown by dataset and comparison previews.
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            level: DEFAULT_LEVEL,
            model: DEFAULT_MODEL.to_string(),
            step_minutes: 1,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
            preview_rows: 10,
        }
    }
}

// api_key stays out of logs
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("horizon", &self.horizon)
            .field("level", &self.level)
            .field("model", &self.model)
            .field("step_minutes", &self.step_minutes)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("preview_rows", &self.preview_rows)
            .finish()
    }
}

impl Settings {
    /// Parse settings from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ForecastError::ParseError(format!("settings: {}", e)))
    }

    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = present(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = present(BASE_URL_ENV) {
            self.base_url = url;
        }
    }

    /// Forecast options described by these settings.
    pub fn forecast_options(&self) -> Result<ForecastOptions> {
        let step = Duration::try_minutes(self.step_minutes).ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "step_minutes {} is out of range",
                self.step_minutes
            ))
        })?;
        let options = ForecastOptions {
            horizon: self.horizon,
            level: self.level,
            model: self.model.clone(),
            step,
        };
        options.validate()?;
        Ok(options)
    }

    /// The configured credential, if any non-blank key is set.
    pub fn credential(&self) -> Option<Credential> {
        self.api_key
            .as_deref()
            .and_then(|key| Credential::new(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let settings = Settings::default();
        let options = settings.forecast_options().unwrap();
        assert_eq!(options.horizon, 144);
        assert_eq!(options.level, 90);
        assert_eq!(options.model, "timegpt-1-long-horizon");
        assert_eq!(options.step, Duration::minutes(1));
        assert!(settings.credential().is_none());
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let settings = Settings::from_toml_str(
            r#"
            horizon = 24
            step_minutes = 60
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(settings.horizon, 24);
        assert_eq!(settings.level, 90);
        assert_eq!(settings.forecast_options().unwrap().step, Duration::hours(1));
        assert_eq!(settings.credential().unwrap().expose(), "abc");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_toml_str("horizn = 3"),
            Err(ForecastError::ParseError(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::from_toml_str("api_key = \"from-file\"").unwrap();
        settings.apply_env_from(|key| match key {
            API_KEY_ENV => Some("from-env".to_string()),
            BASE_URL_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(settings.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_options_are_reported() {
        let settings = Settings {
            step_minutes: 0,
            ..Settings::default()
        };
        assert!(settings.forecast_options().is_err());

        let huge = Settings {
            step_minutes: i64::MAX / 2,
            ..Settings::default()
        };
        assert!(matches!(
            huge.forecast_options(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn debug_hides_api_key() {
        let settings = Settings {
            api_key: Some("secret".to_string()),
            ..Settings::default()
        };
        assert!(!format!("{:?}", settings).contains("secret"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "preview_rows = 3\n").unwrap();
        assert_eq!(Settings::load(&path).unwrap().preview_rows, 3);
        assert!(matches!(
            Settings::load(dir.path().join("missing.toml")),
            Err(ForecastError::Io(_))
        ));
    }
}
