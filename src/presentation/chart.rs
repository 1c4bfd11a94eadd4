//! SVG chart of holdout actuals, forecast and confidence band.

use super::{Comparison, Presenter};
use crate::error::{ForecastError, Result};
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::info;

fn render_err<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::Render(err.to_string())
}

/// Draws the comparison to an SVG file.
#[derive(Debug, Clone)]
pub struct SvgChart {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl SvgChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: 1200,
            height: 500,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Presenter for SvgChart {
    fn render(&mut self, comparison: &Comparison) -> Result<()> {
        let rows = comparison.rows();
        let first = rows
            .first()
            .ok_or_else(|| ForecastError::Render("nothing to plot".to_string()))?
            .timestamp;

        // x is minutes since the first holdout step
        let x_of = |t: chrono::DateTime<chrono::Utc>| (t - first).num_seconds() as f64 / 60.0;
        let x_max = rows.last().map(|r| x_of(r.timestamp)).unwrap_or(0.0).max(1.0);

        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for r in rows {
            for v in [Some(r.lower), Some(r.upper), Some(r.forecast), r.actual]
                .into_iter()
                .flatten()
            {
                y_min = y_min.min(v);
                y_max = y_max.max(v);
            }
        }
        let pad = ((y_max - y_min) * 0.05).max(1e-6);
        let (y_min, y_max) = (y_min - pad, y_max + pad);

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} forecast ({})", comparison.target(), comparison.model()),
                ("sans-serif", 24),
            )
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)
            .map_err(render_err)?;

        let x_label = |x: &f64| {
            (first + chrono::Duration::seconds((*x * 60.0).round() as i64))
                .format("%m-%d %H:%M")
                .to_string()
        };
        chart
            .configure_mesh()
            .x_desc("time")
            .y_desc(comparison.target())
            .x_label_formatter(&x_label)
            .draw()
            .map_err(render_err)?;

        let band_color = BLUE.mix(0.2);
        let mut band: Vec<(f64, f64)> = rows.iter().map(|r| (x_of(r.timestamp), r.upper)).collect();
        band.extend(rows.iter().rev().map(|r| (x_of(r.timestamp), r.lower)));
        chart
            .draw_series(std::iter::once(Polygon::new(band, band_color.filled())))
            .map_err(render_err)?
            .label(format!("{}% interval", comparison.level()))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_color.filled()));

        chart
            .draw_series(LineSeries::new(
                rows.iter()
                    .filter_map(|r| r.actual.map(|a| (x_of(r.timestamp), a))),
                BLACK.stroke_width(2),
            ))
            .map_err(render_err)?
            .label("actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

        chart
            .draw_series(LineSeries::new(
                rows.iter().map(|r| (x_of(r.timestamp), r.forecast)),
                BLUE.stroke_width(2),
            ))
            .map_err(render_err)?
            .label(comparison.model())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        info!(path = %self.path.display(), "chart written");
        Ok(())
    }
}
