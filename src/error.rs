//! Error types for the easy-forecast library.

use thiserror::Error;

/// Result type alias for data preparation and forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing data or requesting a forecast.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A named column does not exist in the dataset.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A time column value could not be parsed into a timestamp.
    #[error("unparsable timestamp in column '{column}' at row {row}: {value:?}")]
    UnparsableTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    /// The same timestamp appears more than once in the time column.
    #[error("duplicate timestamp: {0}")]
    DuplicateTimestamp(String),

    /// Insufficient rows for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Missing values detected when not allowed.
    #[error("missing values detected in column '{0}'")]
    MissingValues(String),

    /// The input file extension is not supported.
    #[error("unsupported file format: {0} (expected .csv or .xlsx)")]
    UnsupportedFileFormat(String),

    /// The input file content is malformed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The forecasting credential is missing or was rejected.
    #[error("authentication error: {0}")]
    AuthenticationError(String),

    /// The forecasting service answered with an error or an unusable body.
    #[error("remote service error: {0}")]
    RemoteServiceError(String),

    /// The forecasting service did not answer in time.
    #[error("request timed out after {0} seconds")]
    RequestTimeout(u64),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A command needs a loaded dataset and none is present.
    #[error("no dataset loaded")]
    NoDataset,

    /// A command needs a completed forecast and none has run yet.
    #[error("no forecast yet; run `train <time column> <target column>` first")]
    NoForecast,

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(String),

    /// Chart or table rendering failure.
    #[error("render error: {0}")]
    Render(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}
