//! Core data structures: the tabular dataset and the forecast result.

mod dataset;
mod forecast;

pub use dataset::{Column, ColumnData, ColumnKind, Dataset};
pub use forecast::{ForecastPoint, ForecastResult};
