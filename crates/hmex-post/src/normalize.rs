use std::path::PathBuf;

use hmex_core::errors::HmexError;
use hmex_core::layout::{per_site_path, OutputLayout};
use hmex_core::observable::Observable;
use hmex_core::table::{ColumnData, Table};
use tracing::debug;

/// True for axis columns, which by convention start with `#`.
pub fn is_axis_column(name: &str) -> bool {
    name.starts_with('#')
}

/// Divides every numeric non-axis column by `site_count`.
///
/// Axis columns (`#h`, `#iters`) and label columns are copied unchanged.
pub fn per_site(table: &Table, site_count: usize) -> Result<Table, HmexError> {
    if site_count == 0 {
        return Err(HmexError::config(
            "site_count",
            "per-site normalisation needs a positive site count",
        ));
    }
    let sites = site_count as f64;
    let mut out = Table::new();
    for (name, data) in table.columns() {
        let data = match data {
            ColumnData::Numeric(values) if !is_axis_column(name) => {
                ColumnData::Numeric(values.iter().map(|value| value / sites).collect())
            }
            other => other.clone(),
        };
        out.push_column(name, data)?;
    }
    Ok(out)
}

/// Writes `PerSite_<obs>.txt` next to each global table.
///
/// A missing global table is a missing-input error naming its path.
pub fn per_site_files(
    layout: &OutputLayout,
    observables: &[Observable],
    site_count: usize,
) -> Result<Vec<PathBuf>, HmexError> {
    let mut written = Vec::with_capacity(observables.len());
    for &obs in observables {
        let input = layout.global_file(obs);
        let table = per_site(&Table::read(&input)?, site_count)?;
        let output = per_site_path(&input);
        table.write(&output)?;
        debug!(observable = %obs, path = %output.display(), "wrote per-site table");
        written.push(output);
    }
    Ok(written)
}
