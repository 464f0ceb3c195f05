use std::path::{Path, PathBuf};

use hmex_core::errors::HmexError;
use hmex_core::grid::format_value;
use hmex_core::plot::{render_svg, Curve, CurveStyle, Figure};

use crate::extract::TimeSeries;

/// Plots every observable of `series` against the iteration index.
///
/// Files are named `<obs>(J=<J>, h=<h>).svg` under `dir`.
pub fn plot_series(series: &TimeSeries, dir: &Path, j: f64, h: f64) -> Result<Vec<PathBuf>, HmexError> {
    let iters = series.iters_f64();
    let params = format!("J={}, h={}", format_value(j), format_value(h));
    let mut written = Vec::new();
    for obs in series.observables() {
        let Some(values) = series.values(obs) else {
            continue;
        };
        let figure = Figure::new(format!("{obs} ({params})"), "iteration", obs.as_str())
            .with_curve(Curve::new(obs.as_str(), &iters, values, CurveStyle::Line));
        let path = dir.join(format!("{obs}({params}).svg"));
        if render_svg(&path, &figure)? {
            written.push(path);
        }
    }
    Ok(written)
}
