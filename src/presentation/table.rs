//! Plain-text tables for terminals.

use super::{Comparison, Presenter};
use crate::core::Dataset;
use crate::error::Result;
use std::io::Write;

fn write_table<W: Write>(out: &mut W, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "{}", line(header))?;
    writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    )?;
    for row in rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

/// Print the first `rows` rows of a dataset.
pub fn render_dataset<W: Write>(out: &mut W, dataset: &Dataset, rows: usize) -> Result<()> {
    let header: Vec<String> = dataset
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let shown = rows.min(dataset.row_count());
    let body: Vec<Vec<String>> = (0..shown).map(|i| dataset.display_row(i)).collect();
    write_table(out, &header, &body)?;
    writeln!(
        out,
        "[{} rows x {} columns]",
        dataset.row_count(),
        dataset.column_count()
    )?;
    Ok(())
}

/// Renders a comparison and its accuracy metrics as text.
#[derive(Debug)]
pub struct TablePresenter<W: Write> {
    out: W,
    max_rows: usize,
}

impl<W: Write> TablePresenter<W> {
    pub fn new(out: W, max_rows: usize) -> Self {
        Self { out, max_rows }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TablePresenter<W> {
    fn render(&mut self, comparison: &Comparison) -> Result<()> {
        let level = comparison.level();
        let header = vec![
            "timestamp".to_string(),
            comparison.target().to_string(),
            comparison.model().to_string(),
            format!("lo-{}", level),
            format!("hi-{}", level),
        ];
        let body: Vec<Vec<String>> = comparison
            .rows()
            .iter()
            .take(self.max_rows)
            .map(|r| {
                vec![
                    r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    r.actual.map(|a| format!("{:.4}", a)).unwrap_or_default(),
                    format!("{:.4}", r.forecast),
                    format!("{:.4}", r.lower),
                    format!("{:.4}", r.upper),
                ]
            })
            .collect();

        write_table(&mut self.out, &header, &body)?;
        if comparison.len() > self.max_rows {
            writeln!(self.out, "... {} more rows", comparison.len() - self.max_rows)?;
        }

        match comparison.metrics() {
            Ok(m) => {
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "MAE {:.4}  RMSE {:.4}  SMAPE {:.2}%  coverage {:.1}% (nominal {}%)",
                    m.mae,
                    m.rmse,
                    m.smape,
                    m.coverage * 100.0,
                    level
                )?;
                if let Some(mape) = m.mape {
                    writeln!(self.out, "MAPE {:.2}%", mape)?;
                }
            }
            Err(_) => writeln!(self.out, "no actuals to score against")?,
        }
        self.out.flush()?;
        Ok(())
    }
}
