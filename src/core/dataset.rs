//! In-memory tabular dataset with typed, named columns.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Text,
    Timestamp,
}

/// Column values; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<DateTime<Utc>>>),
}

impl ColumnData {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Timestamp(_) => ColumnKind::Timestamp,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Float(_))
    }

    /// Check whether the cell at `index` is missing.
    pub fn is_missing(&self, index: usize) -> bool {
        match self {
            ColumnData::Float(v) => v.get(index).map_or(true, |c| c.is_none()),
            ColumnData::Text(v) => v.get(index).map_or(true, |c| c.is_none()),
            ColumnData::Timestamp(v) => v.get(index).map_or(true, |c| c.is_none()),
        }
    }

    /// Count of missing cells.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Render one cell for display; missing cells render empty.
    pub fn display_cell(&self, index: usize) -> String {
        match self {
            ColumnData::Float(v) => v
                .get(index)
                .copied()
                .flatten()
                .map(|x| x.to_string())
                .unwrap_or_default(),
            ColumnData::Text(v) => v.get(index).cloned().flatten().unwrap_or_default(),
            ColumnData::Timestamp(v) => v
                .get(index)
                .copied()
                .flatten()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }

    /// Gather cells by source index; `None` produces a missing cell.
    pub fn take(&self, indices: &[Option<usize>]) -> ColumnData {
        fn gather<T: Clone>(src: &[Option<T>], indices: &[Option<usize>]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|idx| idx.and_then(|i| src.get(i).cloned().flatten()))
                .collect()
        }

        match self {
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::Text(v) => ColumnData::Text(gather(v, indices)),
            ColumnData::Timestamp(v) => ColumnData::Timestamp(gather(v, indices)),
        }
    }

    fn slice(&self, start: usize, end: usize) -> ColumnData {
        match self {
            ColumnData::Float(v) => ColumnData::Float(v[start..end].to_vec()),
            ColumnData::Text(v) => ColumnData::Text(v[start..end].to_vec()),
            ColumnData::Timestamp(v) => ColumnData::Timestamp(v[start..end].to_vec()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn timestamp(name: impl Into<String>, values: Vec<Option<DateTime<Utc>>>) -> Self {
        Self::new(name, ColumnData::Timestamp(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset, validating unique names and equal column lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut dataset = Self::new();
        for column in columns {
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column_index(column.name()).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate column name '{}'",
                column.name()
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(ForecastError::InvalidParameter(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    first.len()
                )));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows (0 for a dataset without columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))
    }

    /// Numeric cells of a column; fails when the column is not numeric.
    pub fn float_values(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)?.data() {
            ColumnData::Float(values) => Ok(values),
            other => Err(ForecastError::InvalidParameter(format!(
                "column '{}' is not numeric ({:?})",
                name,
                other.kind()
            ))),
        }
    }

    /// Timestamp cells of a column; fails when the column holds no timestamps.
    pub fn timestamp_values(&self, name: &str) -> Result<&[Option<DateTime<Utc>>]> {
        match self.column(name)?.data() {
            ColumnData::Timestamp(values) => Ok(values),
            other => Err(ForecastError::InvalidParameter(format!(
                "column '{}' does not hold timestamps ({:?})",
                name,
                other.kind()
            ))),
        }
    }

    /// Remove a column. Other columns keep their order.
    pub fn delete_column(&mut self, name: &str) -> Result<()> {
        let index = self
            .column_index(name)
            .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))?;
        self.columns.remove(index);
        Ok(())
    }

    /// Rename a column in place, keeping its position.
    ///
    /// When `to` already names a different column, that column is dropped
    /// and the renamed one takes the name.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if to.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "new column name must not be empty".to_string(),
            ));
        }
        let index = self
            .column_index(from)
            .ok_or_else(|| ForecastError::ColumnNotFound(from.to_string()))?;
        if from == to {
            return Ok(());
        }

        let mut index = index;
        if let Some(existing) = self.column_index(to) {
            warn!(from, to, "rename overwrites an existing column");
            self.columns.remove(existing);
            if existing < index {
                index -= 1;
            }
        }
        self.columns[index].name = to.to_string();
        Ok(())
    }

    /// Rows `start..end` as a new dataset.
    pub fn slice(&self, start: usize, end: usize) -> Result<Dataset> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.row_count() {
            return Err(ForecastError::InsufficientData {
                needed: end,
                got: self.row_count(),
            });
        }
        Ok(Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.slice(start, end)))
                .collect(),
        })
    }

    /// First `n` rows (or fewer).
    pub fn head(&self, n: usize) -> Dataset {
        let end = n.min(self.row_count());
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.slice(0, end)))
                .collect(),
        }
    }

    /// Rendered cells of one row, in column order.
    pub fn display_row(&self, index: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.data.display_cell(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::text(
                "ts",
                vec![Some("2024-01-01 00:00".into()), Some("2024-01-01 00:01".into())],
            ),
            Column::float("value", vec![Some(1.0), Some(2.0)]),
            Column::text("note", vec![Some("a".into()), None]),
        ])
        .unwrap()
    }

    #[test]
    fn dataset_rejects_duplicate_names_and_ragged_columns() {
        let dup = Dataset::from_columns(vec![
            Column::float("a", vec![Some(1.0)]),
            Column::float("a", vec![Some(2.0)]),
        ]);
        assert!(matches!(dup, Err(ForecastError::InvalidParameter(_))));

        let ragged = Dataset::from_columns(vec![
            Column::float("a", vec![Some(1.0)]),
            Column::float("b", vec![Some(2.0), Some(3.0)]),
        ]);
        assert!(matches!(ragged, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn delete_column_keeps_rows_and_order() {
        let mut ds = sample();
        ds.delete_column("value").unwrap();
        assert_eq!(ds.column_names(), vec!["ts", "note"]);
        assert_eq!(ds.row_count(), 2);

        let err = ds.delete_column("value").unwrap_err();
        assert_eq!(err, ForecastError::ColumnNotFound("value".to_string()));
    }

    #[test]
    fn rename_column_keeps_position() {
        let mut ds = sample();
        ds.rename_column("value", "y").unwrap();
        assert_eq!(ds.column_names(), vec!["ts", "y", "note"]);
        assert_eq!(ds.float_values("y").unwrap(), &[Some(1.0), Some(2.0)]);

        assert!(matches!(
            ds.rename_column("missing", "z"),
            Err(ForecastError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn rename_onto_existing_column_replaces_it() {
        let mut ds = sample();
        ds.rename_column("note", "ts").unwrap();
        assert_eq!(ds.column_names(), vec!["value", "ts"]);
        assert_eq!(ds.column("ts").unwrap().data().kind(), ColumnKind::Text);
        assert_eq!(ds.column("ts").unwrap().data().display_cell(0), "a");
    }

    #[test]
    fn rename_to_same_name_is_noop() {
        let mut ds = sample();
        ds.rename_column("value", "value").unwrap();
        assert_eq!(ds, sample());
        assert!(ds.rename_column("value", "  ").is_err());
    }

    #[test]
    fn take_inserts_missing_cells() {
        let data = ColumnData::Float(vec![Some(1.0), Some(2.0)]);
        let taken = data.take(&[Some(1), None, Some(0)]);
        assert_eq!(taken, ColumnData::Float(vec![Some(2.0), None, Some(1.0)]));
        assert_eq!(taken.missing_count(), 1);
    }

    #[test]
    fn slice_and_head_bound_rows() {
        let ds = sample();
        assert_eq!(ds.slice(1, 2).unwrap().row_count(), 1);
        assert!(ds.slice(0, 3).is_err());
        assert_eq!(ds.head(10).row_count(), 2);
        assert_eq!(ds.display_row(1), vec!["2024-01-01 00:01", "2", ""]);
    }
}
