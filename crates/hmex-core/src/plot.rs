//! Minimal SVG line and scatter plots.
//!
//! All series and bounds are computed before drawing; non-finite points are
//! skipped, and a figure with no finite point is not written.

use std::error::Error;
use std::fs;
use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use crate::errors::{ErrorInfo, HmexError};

const SIZE: (u32, u32) = (800, 600);

/// How a curve is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveStyle {
    /// Connected line.
    Line,
    /// Unconnected markers.
    Points,
}

/// One labelled data series.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Legend entry.
    pub label: String,
    /// `(x, y)` pairs in drawing order.
    pub points: Vec<(f64, f64)>,
    /// Drawing style.
    pub style: CurveStyle,
}

impl Curve {
    /// Pairs `xs` with `ys` into a curve.
    pub fn new(label: impl Into<String>, xs: &[f64], ys: &[f64], style: CurveStyle) -> Self {
        Self {
            label: label.into(),
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
            style,
        }
    }
}

/// A titled figure with axis labels and any number of curves.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Caption above the chart.
    pub title: String,
    /// Horizontal axis description.
    pub x_label: String,
    /// Vertical axis description.
    pub y_label: String,
    /// Curves drawn in order.
    pub curves: Vec<Curve>,
}

impl Figure {
    /// Creates a figure without curves.
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            curves: Vec::new(),
        }
    }

    /// Appends a curve.
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curves.push(curve);
        self
    }

    fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut finite = self
            .curves
            .iter()
            .flat_map(|curve| curve.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .peekable();
        let &&(x0, y0) = finite.peek()?;
        let (mut x, mut y) = ([x0, x0], [y0, y0]);
        for &(px, py) in finite {
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        Some((padded(x), padded(y)))
    }
}

fn padded([lo, hi]: [f64; 2]) -> [f64; 2] {
    let span = hi - lo;
    if span > 0.0 {
        [lo - 0.05 * span, hi + 0.05 * span]
    } else {
        let pad = if lo == 0.0 { 0.5 } else { 0.1 * lo.abs() };
        [lo - pad, hi + pad]
    }
}

/// Renders `figure` to an SVG file at `path`, creating parent directories.
///
/// Returns `false` when the figure had nothing finite to draw.
pub fn render_svg(path: &Path, figure: &Figure) -> Result<bool, HmexError> {
    let Some((x, y)) = figure.bounds() else {
        debug!(path = %path.display(), "skipping plot without finite points");
        return Ok(false);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| HmexError::io("plot_dir", parent, err))?;
    }
    draw(path, figure, x, y).map_err(|err| {
        HmexError::Io(ErrorInfo::new("plot_render", err.to_string()).with_path(path))
    })?;
    Ok(true)
}

fn draw(path: &Path, figure: &Figure, x: [f64; 2], y: [f64; 2]) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x[0]..x[1], y[0]..y[1])?;
    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .draw()?;

    for (idx, curve) in figure.curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let finite = curve
            .points
            .iter()
            .copied()
            .filter(|(px, py)| px.is_finite() && py.is_finite());
        let series = match curve.style {
            CurveStyle::Line => chart.draw_series(LineSeries::new(finite, color.stroke_width(2)))?,
            CurveStyle::Points => chart.draw_series(
                finite.map(move |point| Circle::new(point, 3, color.filled())),
            )?,
        };
        series
            .label(curve.label.as_str())
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], color));
    }

    if figure.curves.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}
