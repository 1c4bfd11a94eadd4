//! Interactive session state and command dispatch.
//!
//! A [`Session`] owns the loaded dataset, the credential and the settings of
//! one user. Commands are applied one at a time with [`Session::execute`];
//! a failing command reports its error and leaves the session as it was.
//! The comparison of the last successful train is kept for `report`.

mod command;

pub use command::Command;

use crate::config::Settings;
use crate::core::Dataset;
use crate::error::{ForecastError, Result};
use crate::gateway::{Credential, ForecastGateway, TimeGptClient};
use crate::io::{load_dataset, write_csv};
use crate::pipeline::{run_forecast, ForecastRun};
use crate::presentation::{Comparison, CsvExport, Presenter, SvgChart};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Builds the gateway used by a train command.
pub trait GatewayFactory: Send + Sync {
    fn connect(&self, credential: &Credential, settings: &Settings)
        -> Result<Box<dyn ForecastGateway>>;
}

/// Connects to the hosted TimeGPT service.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeGptFactory;

impl GatewayFactory for TimeGptFactory {
    fn connect(
        &self,
        credential: &Credential,
        settings: &Settings,
    ) -> Result<Box<dyn ForecastGateway>> {
        let client =
            TimeGptClient::with_config(credential.clone(), &settings.base_url, settings.timeout_secs)?;
        Ok(Box::new(client))
    }
}

/// Result of a successfully executed command.
#[derive(Debug)]
pub enum Outcome {
    Loaded { rows: usize, columns: Vec<String> },
    /// Column names after a delete or rename.
    Edited { columns: Vec<String> },
    CredentialSet,
    Preview(Dataset),
    Columns(Vec<String>),
    Exported { path: PathBuf, rows: usize },
    Forecast(Box<ForecastRun>),
    /// The last comparison was written to `path`.
    Reported { path: PathBuf, points: usize },
    Closed,
}

/// Per-user session context.
#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Dataset>,
    credential: Option<Credential>,
    settings: Settings,
    last_comparison: Option<Comparison>,
}

/// Write `comparison` as an SVG chart or a CSV table, by extension.
fn render_report(comparison: &Comparison, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("svg") => SvgChart::new(path).render(comparison),
        Some("csv") => CsvExport::new(path).render(comparison),
        _ => Err(ForecastError::UnsupportedFileFormat(format!(
            "{} (reports are .svg or .csv)",
            path.display()
        ))),
    }
}

fn owned_names(dataset: &Dataset) -> Vec<String> {
    dataset
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Session {
    /// Start a session; a credential found in `settings` is picked up.
    pub fn new(settings: Settings) -> Self {
        Self {
            dataset: None,
            credential: settings.credential(),
            settings,
            last_comparison: None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Comparison from the last successful train, if any.
    pub fn last_comparison(&self) -> Option<&Comparison> {
        self.last_comparison.as_ref()
    }

    fn dataset_mut(&mut self) -> Result<&mut Dataset> {
        self.dataset.as_mut().ok_or(ForecastError::NoDataset)
    }

    fn loaded(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(ForecastError::NoDataset)
    }

    /// Apply one command.
    pub async fn execute(
        &mut self,
        command: Command,
        gateways: &dyn GatewayFactory,
    ) -> Result<Outcome> {
        debug!(command = command.name(), "executing");
        match command {
            Command::Load(path) => {
                let dataset = load_dataset(&path)?;
                let outcome = Outcome::Loaded {
                    rows: dataset.row_count(),
                    columns: owned_names(&dataset),
                };
                info!(path = %path.display(), rows = dataset.row_count(), "dataset loaded");
                self.dataset = Some(dataset);
                self.last_comparison = None;
                Ok(outcome)
            }
            Command::DeleteColumn(name) => {
                let dataset = self.dataset_mut()?;
                dataset.delete_column(&name)?;
                Ok(Outcome::Edited {
                    columns: owned_names(dataset),
                })
            }
            Command::RenameColumn { from, to } => {
                let dataset = self.dataset_mut()?;
                dataset.rename_column(&from, &to)?;
                Ok(Outcome::Edited {
                    columns: owned_names(dataset),
                })
            }
            Command::SetCredential(secret) => {
                self.credential = Some(Credential::new(secret)?);
                Ok(Outcome::CredentialSet)
            }
            Command::Show(rows) => {
                let rows = rows.unwrap_or(self.settings.preview_rows);
                Ok(Outcome::Preview(self.loaded()?.head(rows)))
            }
            Command::Columns => Ok(Outcome::Columns(owned_names(self.loaded()?))),
            Command::Export(path) => {
                let dataset = self.loaded()?;
                write_csv(dataset, &path)?;
                Ok(Outcome::Exported {
                    rows: dataset.row_count(),
                    path,
                })
            }
            Command::Train { time, target } => {
                let credential = self.credential.as_ref().ok_or_else(|| {
                    ForecastError::AuthenticationError(
                        "no API key set; use `key <api key>` or NIXTLA_API_KEY".to_string(),
                    )
                })?;
                let dataset = self.loaded()?;
                let options = self.settings.forecast_options()?;
                let gateway = gateways.connect(credential, &self.settings)?;
                let run = run_forecast(dataset, &time, &target, &options, gateway.as_ref()).await?;
                self.last_comparison = Some(run.comparison.clone());
                Ok(Outcome::Forecast(Box::new(run)))
            }
            Command::Report(path) => {
                let comparison = self
                    .last_comparison
                    .as_ref()
                    .ok_or(ForecastError::NoForecast)?;
                render_report(comparison, &path)?;
                info!(path = %path.display(), points = comparison.len(), "report written");
                Ok(Outcome::Reported {
                    points: comparison.len(),
                    path,
                })
            }
            Command::Close => {
                self.dataset = None;
                self.credential = None;
                self.last_comparison = None;
                info!("session closed");
                Ok(Outcome::Closed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ForecastResult;
    use crate::gateway::ForecastRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts connections and refuses every forecast.
    #[derive(Default)]
    struct Refusing {
        connects: AtomicUsize,
    }

    struct Down;

    #[async_trait]
    impl ForecastGateway for Down {
        async fn forecast(&self, _request: &ForecastRequest<'_>) -> Result<ForecastResult> {
            Err(ForecastError::RemoteServiceError("HTTP 500: down".to_string()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    impl GatewayFactory for Refusing {
        fn connect(&self, _: &Credential, _: &Settings) -> Result<Box<dyn ForecastGateway>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Down))
        }
    }

    /// Repeats the last training value with a unit band.
    struct Flat;

    #[async_trait]
    impl ForecastGateway for Flat {
        async fn forecast(&self, request: &ForecastRequest<'_>) -> Result<ForecastResult> {
            let (ts, y) = request.training_series()?;
            let options = request.options;
            let last = y[y.len() - 1];
            ForecastResult::new(
                crate::gateway::forecast_timestamps(ts[ts.len() - 1], options.step, options.horizon),
                vec![last; options.horizon],
                vec![last - 1.0; options.horizon],
                vec![last + 1.0; options.horizon],
                options.level,
                options.model.clone(),
            )
        }

        fn name(&self) -> &str {
            "flat"
        }
    }

    struct FlatFactory;

    impl GatewayFactory for FlatFactory {
        fn connect(&self, _: &Credential, _: &Settings) -> Result<Box<dyn ForecastGateway>> {
            Ok(Box::new(Flat))
        }
    }

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("sample.csv");
        let mut text = String::from("Unnamed: 0,Datetime,power\n");
        for i in 0..200 {
            text.push_str(&format!(
                "{},2024-01-01 {:02}:{:02}:00,{}\n",
                i,
                i / 60,
                i % 60,
                i as f64 * 0.5
            ));
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    #[tokio::test]
    async fn edits_require_a_dataset() {
        let mut session = Session::default();
        let factory = Refusing::default();
        for command in [
            Command::DeleteColumn("a".into()),
            Command::Columns,
            Command::Show(None),
        ] {
            let err = session.execute(command, &factory).await.unwrap_err();
            assert_eq!(err, ForecastError::NoDataset);
        }
    }

    #[tokio::test]
    async fn load_edit_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);
        let factory = Refusing::default();
        let mut session = Session::default();

        match session.execute(Command::Load(path), &factory).await.unwrap() {
            Outcome::Loaded { rows, columns } => {
                assert_eq!(rows, 200);
                assert_eq!(columns, vec!["Unnamed: 0", "Datetime", "power"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        session
            .execute(Command::DeleteColumn("Unnamed: 0".into()), &factory)
            .await
            .unwrap();
        match session
            .execute(
                Command::RenameColumn {
                    from: "Datetime".into(),
                    to: "ts".into(),
                },
                &factory,
            )
            .await
            .unwrap()
        {
            Outcome::Edited { columns } => assert_eq!(columns, vec!["ts", "power"]),
            other => panic!("unexpected outcome {:?}", other),
        }

        match session.execute(Command::Show(Some(3)), &factory).await.unwrap() {
            Outcome::Preview(head) => assert_eq!(head.row_count(), 3),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn train_without_key_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Refusing::default();
        let mut session = Session::default();
        session
            .execute(Command::Load(write_sample(&dir)), &factory)
            .await
            .unwrap();

        let err = session
            .execute(
                Command::Train {
                    time: "Datetime".into(),
                    target: "power".into(),
                },
                &factory,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::AuthenticationError(_)));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_train_keeps_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Refusing::default();
        let mut session = Session::default();
        session
            .execute(Command::Load(write_sample(&dir)), &factory)
            .await
            .unwrap();
        session
            .execute(Command::SetCredential("key".into()), &factory)
            .await
            .unwrap();

        let err = session
            .execute(
                Command::Train {
                    time: "Datetime".into(),
                    target: "power".into(),
                },
                &factory,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::RemoteServiceError(_)));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
        assert_eq!(session.dataset().unwrap().row_count(), 200);
    }

    #[tokio::test]
    async fn report_renders_the_last_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Settings {
            api_key: Some("k".into()),
            ..Settings::default()
        });
        session
            .execute(Command::Load(write_sample(&dir)), &FlatFactory)
            .await
            .unwrap();

        let svg = dir.path().join("comparison.svg");
        let err = session
            .execute(Command::Report(svg.clone()), &FlatFactory)
            .await
            .unwrap_err();
        assert_eq!(err, ForecastError::NoForecast);

        session
            .execute(
                Command::Train {
                    time: "Datetime".into(),
                    target: "power".into(),
                },
                &FlatFactory,
            )
            .await
            .unwrap();
        assert_eq!(session.last_comparison().unwrap().len(), 144);

        match session.execute(Command::Report(svg.clone()), &FlatFactory).await.unwrap() {
            Outcome::Reported { path, points } => {
                assert_eq!(path, svg);
                assert_eq!(points, 144);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(std::fs::read_to_string(&svg).unwrap().contains("<svg"));

        let csv = dir.path().join("comparison.CSV");
        session
            .execute(Command::Report(csv.clone()), &FlatFactory)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 145);

        let err = session
            .execute(Command::Report(dir.path().join("comparison.png")), &FlatFactory)
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::UnsupportedFileFormat(_)));

        // a new dataset invalidates the stored comparison
        session
            .execute(Command::Load(write_sample(&dir)), &FlatFactory)
            .await
            .unwrap();
        assert!(session.last_comparison().is_none());
    }

    #[tokio::test]
    async fn close_clears_state() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Refusing::default();
        let mut session = Session::new(Settings {
            api_key: Some("k".into()),
            ..Settings::default()
        });
        assert!(session.has_credential());
        session
            .execute(Command::Load(write_sample(&dir)), &factory)
            .await
            .unwrap();

        session.execute(Command::Close, &factory).await.unwrap();
        assert!(session.dataset().is_none());
        assert!(!session.has_credential());
    }
}
