use std::path::PathBuf;

use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::layout::{per_site_path, OutputLayout};
use hmex_core::observable::Observable;
use hmex_core::table::Table;

/// Name of the susceptibility table.
pub const CHI_FILE: &str = "chi.txt";

/// Finite-difference susceptibility `dm/dh` between consecutive rows.
///
/// Output columns are `axis` (first `n-1` values), the signed step `dh`, and
/// per magnetisation column `m-<col>`, the absolute change `dm-<col>` and
/// `chi-<col>`. Fewer than two rows is a numeric error.
pub fn susceptibility(table: &Table, axis: &str) -> Result<Table, HmexError> {
    let h = table.numeric(axis)?;
    if h.len() < 2 {
        return Err(HmexError::Numeric(
            ErrorInfo::new("susceptibility_rows", "susceptibility needs at least two rows")
                .with_context("rows", h.len().to_string()),
        ));
    }
    let dh: Vec<f64> = h.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let mut out = Table::new();
    out.push_column(axis, h[..h.len() - 1].to_vec())?;
    out.push_column("dh", dh.clone())?;
    for (name, m) in table.data_columns(axis) {
        let dm: Vec<f64> = m.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();
        let chi: Vec<f64> = dm.iter().zip(&dh).map(|(dm, dh)| dm / dh).collect();
        out.push_column(format!("m-{name}"), m[..m.len() - 1].to_vec())?;
        out.push_column(format!("dm-{name}"), dm)?;
        out.push_column(format!("chi-{name}"), chi)?;
    }
    Ok(out)
}

/// Reads `PerSite_<magnetization>.txt`, writes `chi.txt` to the global directory.
pub fn susceptibility_file(
    layout: &OutputLayout,
    magnetization: Observable,
    axis: &str,
) -> Result<PathBuf, HmexError> {
    let input = per_site_path(&layout.global_file(magnetization));
    let table = susceptibility(&Table::read(&input)?, axis)?;
    let output = layout.global_dir().join(CHI_FILE);
    table.write(&output)?;
    Ok(output)
}
