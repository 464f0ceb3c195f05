use std::fs;
use std::path::{Path, PathBuf};

use hmex_core::errors::HmexError;
use hmex_core::grid::linspace;
use hmex_core::layout::OutputLayout;
use hmex_core::plot::{render_svg, Curve, CurveStyle, Figure};
use hmex_core::table::Table;

use crate::fit::{FitModel, FitOutcome};

const CURVE_SAMPLES: usize = 200;

fn table_files(dir: &Path) -> Result<Vec<PathBuf>, HmexError> {
    if !dir.is_dir() {
        return Err(HmexError::missing("plot_input_dir", dir));
    }
    let entries = fs::read_dir(dir).map_err(|err| HmexError::io("plot_read_dir", dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| HmexError::io("plot_read_dir", dir, err))?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Plots every table of the global directory against its first column.
///
/// Each data column gets `<stem>_(<col>).svg`, and all columns together go to
/// `<stem>.svg`, under the aggregate plot directory.
pub fn plot_global_tables(layout: &OutputLayout) -> Result<Vec<PathBuf>, HmexError> {
    let out_dir = layout.aggregate_plots_dir();
    let mut written = Vec::new();
    for path in table_files(&layout.global_dir())? {
        let table = Table::read(&path)?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(axis) = table.names().next().map(str::to_string) else {
            continue;
        };
        let xs = table.numeric(&axis)?;
        let x_label = axis.trim_start_matches('#');

        let mut combined = Figure::new(stem.as_str(), x_label, stem.as_str());
        for (column, ys) in table.data_columns(&axis) {
            let curve = Curve::new(column, xs, ys, CurveStyle::Line);
            let single = Figure::new(format!("{stem} ({column})"), x_label, stem.as_str())
                .with_curve(curve.clone());
            let single_path = out_dir.join(format!("{stem}_({column}).svg"));
            if render_svg(&single_path, &single)? {
                written.push(single_path);
            }
            combined = combined.with_curve(curve);
        }
        let combined_path = out_dir.join(format!("{stem}.svg"));
        if render_svg(&combined_path, &combined)? {
            written.push(combined_path);
        }
    }
    Ok(written)
}

/// Overlays each fitted curve on its data as `<name>_plot_(<col>).svg` under `dir`.
pub fn plot_fits(
    model: &dyn FitModel,
    data: &Table,
    axis: &str,
    outcome: &FitOutcome,
    dir: &Path,
    name: &str,
) -> Result<Vec<PathBuf>, HmexError> {
    let xs = data.numeric(axis)?;
    let (lo, hi) = xs
        .iter()
        .filter(|x| x.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if lo > hi {
        return Ok(Vec::new());
    }
    let grid = linspace(lo, hi, CURVE_SAMPLES);
    let mut written = Vec::new();
    for (column, ys) in data.data_columns(axis) {
        let Some(params) = outcome.parameters(column) else {
            continue;
        };
        let fitted: Vec<f64> = grid.iter().map(|&x| model.evaluate(x, params)).collect();
        let figure = Figure::new(format!("{name} ({column})"), axis.trim_start_matches('#'), column)
            .with_curve(Curve::new("data", xs, ys, CurveStyle::Points))
            .with_curve(Curve::new("fit", &grid, &fitted, CurveStyle::Line));
        let path = dir.join(format!("{name}_plot_({column}).svg"));
        if render_svg(&path, &figure)? {
            written.push(path);
        }
    }
    Ok(written)
}
