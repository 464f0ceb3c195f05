use std::path::PathBuf;

use hmex_core::errors::HmexError;
use hmex_core::layout::{per_site_path, OutputLayout};
use hmex_core::observable::Observable;
use hmex_core::table::Table;
use tracing::warn;

/// Name of the angle table.
pub const ANGLE_FILE: &str = "Angle.txt";

/// A magnetisation value outside `[-0.5, 0.5]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidAngle {
    /// Column holding the value.
    pub column: String,
    /// Row index.
    pub row: usize,
    /// Offending magnetisation.
    pub value: f64,
}

/// Angle table plus the inputs that fell outside the arccos domain.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleOutcome {
    /// `axis` followed by `arccos(4|m| - 1)` per data column.
    pub table: Table,
    /// Out-of-domain inputs; their cells are `NaN`.
    pub invalid: Vec<InvalidAngle>,
}

/// Spin angle `arccos(4|m| - 1)` of every data column.
///
/// Values with `|m| > 0.5` are not clamped: the cell becomes `NaN` and the
/// input is reported in [`AngleOutcome::invalid`]. `NaN` inputs stay `NaN`.
pub fn angle(table: &Table, axis: &str) -> Result<AngleOutcome, HmexError> {
    let mut out = Table::new();
    out.push_column(axis, table.numeric(axis)?.to_vec())?;
    let mut invalid = Vec::new();
    for (name, values) in table.data_columns(axis) {
        let mut angles = Vec::with_capacity(values.len());
        for (row, &m) in values.iter().enumerate() {
            let cos = 4.0 * m.abs() - 1.0;
            if cos.abs() > 1.0 {
                warn!(column = name, row, value = m, "magnetisation outside the angle domain");
                invalid.push(InvalidAngle {
                    column: name.to_string(),
                    row,
                    value: m,
                });
                angles.push(f64::NAN);
            } else {
                angles.push(cos.acos());
            }
        }
        out.push_column(name, angles)?;
    }
    Ok(AngleOutcome {
        table: out,
        invalid,
    })
}

/// Reads `PerSite_<magnetization>.txt`, writes `Angle.txt` to the global directory.
pub fn angle_file(
    layout: &OutputLayout,
    magnetization: Observable,
    axis: &str,
) -> Result<(PathBuf, AngleOutcome), HmexError> {
    let input = per_site_path(&layout.global_file(magnetization));
    let outcome = angle(&Table::read(&input)?, axis)?;
    let output = layout.global_dir().join(ANGLE_FILE);
    outcome.table.write(&output)?;
    Ok((output, outcome))
}
