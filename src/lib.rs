//! # easy-forecast
//!
//! Spreadsheet-to-forecast pipeline around the hosted TimeGPT service.
//!
//! Loads CSV or XLSX files, applies column edits, regularizes the data onto
//! a fixed time grid with cubic gap filling, holds out the trailing horizon
//! and compares a remote forecast for that horizon against the actuals.

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod gateway;
pub mod io;
pub mod pipeline;
pub mod presentation;
pub mod session;
pub mod transform;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::core::{Column, Dataset, ForecastResult};
    pub use crate::error::{ForecastError, Result};
    pub use crate::gateway::{
        Credential, ForecastGateway, ForecastOptions, ForecastRequest, TimeGptClient,
    };
    pub use crate::io::load_dataset;
    pub use crate::pipeline::{run_forecast, split, ForecastRun, TrainTestSplit};
    pub use crate::presentation::{Comparison, CsvExport, Presenter, SvgChart, TablePresenter};
    pub use crate::session::{Command, Outcome, Session};
    pub use crate::transform::{regularize, Regularizer};
}
