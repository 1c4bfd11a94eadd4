//! Train/holdout partition of a regularized dataset.

use crate::core::Dataset;
use crate::error::{ForecastError, Result};

/// Training prefix and trailing holdout window.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Split off the last `horizon` rows as the test set.
///
/// Fails with `InsufficientData` when fewer than `horizon` rows exist.
pub fn split(regularized: &Dataset, horizon: usize) -> Result<TrainTestSplit> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "horizon must be positive".to_string(),
        ));
    }
    let n = regularized.row_count();
    if n < horizon {
        return Err(ForecastError::InsufficientData {
            needed: horizon,
            got: n,
        });
    }

    let cut = n - horizon;
    Ok(TrainTestSplit {
        train: regularized.slice(0, cut)?,
        test: regularized.slice(cut, n)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Column;

    fn numbered(n: usize) -> Dataset {
        Dataset::from_columns(vec![Column::float(
            "value",
            (0..n).map(|i| Some(i as f64)).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn split_takes_trailing_window() {
        let ds = numbered(200);
        let parts = split(&ds, 144).unwrap();

        assert_eq!(parts.train.row_count(), 56);
        assert_eq!(parts.test.row_count(), 144);
        assert_eq!(parts.test.float_values("value").unwrap()[0], Some(56.0));
        assert_eq!(parts.train.float_values("value").unwrap()[55], Some(55.0));
    }

    #[test]
    fn exact_horizon_leaves_empty_train() {
        let parts = split(&numbered(144), 144).unwrap();
        assert_eq!(parts.train.row_count(), 0);
        assert_eq!(parts.test.row_count(), 144);
    }

    #[test]
    fn short_dataset_is_insufficient() {
        assert_eq!(
            split(&numbered(143), 144).unwrap_err(),
            ForecastError::InsufficientData {
                needed: 144,
                got: 143
            }
        );
        assert!(split(&numbered(10), 0).is_err());
    }
}
