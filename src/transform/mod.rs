//! Time-grid regularization.
//!
//! Parses the time column, re-indexes the dataset onto a fixed-step grid and
//! fills numeric gaps with cubic interpolation.
//!
//! # Example
//!
//! ```
//! use easy_forecast::core::{Column, Dataset};
//! use easy_forecast::transform::regularize;
//!
//! let dataset = Dataset::from_columns(vec![
//!     Column::text("ts", vec![
//!         Some("2024-01-01 00:00".to_string()),
//!         Some("2024-01-01 02:00".to_string()),
//!     ]),
//!     Column::float("value", vec![Some(0.0), Some(120.0)]),
//! ])
//! .unwrap();
//!
//! let regular = regularize(&dataset, "ts").unwrap();
//! assert_eq!(regular.row_count(), 121);
//! ```

pub mod interpolate;
pub mod regularize;
pub mod timestamp;

pub use interpolate::{fill_gaps, CubicSpline};
pub use regularize::{regularize, Regularizer};
pub use timestamp::{parse_time_column, parse_timestamp};
