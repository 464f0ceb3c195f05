use std::path::{Path, PathBuf};

use hmex_core::config::ImaginaryPolicy;
use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::grid::settled_mean;
use hmex_core::layout::series_file_name;
use hmex_core::observable::{tracked_observables, Observable};
use hmex_core::table::Table;
use indexmap::IndexMap;
use tracing::warn;

use crate::runner::RuntimeLog;

/// Header of the iteration column in series tables.
pub const ITERS_COLUMN: &str = "iters";

/// Real-valued observable histories of one simulation, sharing one iteration axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    iters: Vec<u64>,
    values: IndexMap<Observable, Vec<f64>>,
}

impl TimeSeries {
    /// Iteration indices.
    pub fn iters(&self) -> &[u64] {
        &self.iters
    }

    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.iters.len()
    }

    /// True when no iteration was recorded.
    pub fn is_empty(&self) -> bool {
        self.iters.is_empty()
    }

    /// Observables in column order, `Energy` first.
    pub fn observables(&self) -> impl Iterator<Item = Observable> + '_ {
        self.values.keys().copied()
    }

    /// History of one observable.
    pub fn values(&self, observable: Observable) -> Option<&[f64]> {
        self.values.get(&observable).map(Vec::as_slice)
    }

    /// Iteration indices as floats, for table columns and plots.
    pub fn iters_f64(&self) -> Vec<f64> {
        self.iters.iter().map(|&iter| iter as f64).collect()
    }

    /// Mean of the last `window` values of every observable.
    pub fn summaries(&self, window: usize) -> IndexMap<Observable, f64> {
        self.values
            .iter()
            .map(|(obs, values)| (*obs, settled_mean(values, window)))
            .collect()
    }

    /// Table with an `iters` column followed by one column per observable.
    pub fn to_table(&self) -> Result<Table, HmexError> {
        let mut table = Table::new();
        table.push_column(ITERS_COLUMN, self.iters_f64())?;
        for (obs, values) in &self.values {
            table.push_column(obs.as_str(), values.clone())?;
        }
        Ok(table)
    }

    /// Rebuilds a series from a persisted table; the columns must match `observables`.
    pub fn from_table(table: &Table, observables: &[Observable]) -> Result<Self, HmexError> {
        let tracked = tracked_observables(observables);
        let expected = tracked.len() + 1;
        if table.n_columns() != expected {
            return Err(HmexError::InconsistentObservables(
                ErrorInfo::new("series_columns", "persisted series has unexpected columns")
                    .with_context("expected", expected.to_string())
                    .with_context("found", table.n_columns().to_string()),
            ));
        }
        let iters = table
            .numeric(ITERS_COLUMN)?
            .iter()
            .map(|&iter| iter.round() as u64)
            .collect();
        let mut values = IndexMap::with_capacity(tracked.len());
        for obs in tracked {
            values.insert(obs, table.numeric(obs.as_str())?.to_vec());
        }
        Ok(Self { iters, values })
    }
}

fn inconsistent(code: &str, message: impl Into<String>) -> HmexError {
    HmexError::InconsistentObservables(ErrorInfo::new(code, message))
}

/// Converts a training log into a [`TimeSeries`] of real parts.
///
/// `observables` is the configured list; `Energy` is always included. The log
/// must contain exactly the tracked observables, each with one value per
/// `Energy` iteration. Imaginary parts are handled according to `policy`.
pub fn extract(
    log: &RuntimeLog,
    observables: &[Observable],
    policy: ImaginaryPolicy,
) -> Result<TimeSeries, HmexError> {
    let tracked = tracked_observables(observables);
    for name in log.keys() {
        if !tracked.iter().any(|obs| obs.as_str() == name) {
            return Err(HmexError::InconsistentObservables(
                ErrorInfo::new("unexpected_observable", "log carries an observable that was not configured")
                    .with_context("observable", name.clone()),
            ));
        }
    }

    let energy = log
        .get(Observable::Energy.as_str())
        .ok_or_else(|| inconsistent("missing_energy", "log has no Energy entry"))?;
    let iters = energy.iters.clone();
    let mut values = IndexMap::with_capacity(tracked.len());
    for obs in tracked {
        let entry = log.get(obs.as_str()).ok_or_else(|| {
            HmexError::InconsistentObservables(
                ErrorInfo::new("missing_observable", "configured observable absent from log")
                    .with_context("observable", obs.as_str()),
            )
        })?;
        if entry.mean.len() != iters.len() {
            return Err(HmexError::InconsistentObservables(
                ErrorInfo::new("series_length", "observable length differs from Energy iterations")
                    .with_context("observable", obs.as_str())
                    .with_context("expected", iters.len().to_string())
                    .with_context("found", entry.mean.len().to_string()),
            ));
        }
        let complex = entry.mean.to_complex()?;
        let max_imag = complex.iter().map(|value| value.im.abs()).fold(0.0, f64::max);
        match policy {
            ImaginaryPolicy::Discard => {}
            ImaginaryPolicy::Warn { tolerance } if max_imag > tolerance => {
                warn!(observable = %obs, max_imag, "discarding imaginary parts above tolerance");
            }
            ImaginaryPolicy::Warn { .. } => {}
            ImaginaryPolicy::Reject { tolerance } if max_imag > tolerance => {
                return Err(HmexError::Numeric(
                    ErrorInfo::new("imaginary_mean", "observable mean has a significant imaginary part")
                        .with_context("observable", obs.as_str())
                        .with_context("max_imag", max_imag.to_string())
                        .with_context("tolerance", tolerance.to_string()),
                ));
            }
            ImaginaryPolicy::Reject { .. } => {}
        }
        values.insert(obs, complex.iter().map(|value| value.re).collect());
    }
    Ok(TimeSeries { iters, values })
}

/// Writes `series` under `dir`, naming the file after whichever of `j` and `h` are given.
pub fn persist(
    series: &TimeSeries,
    dir: &Path,
    j: Option<f64>,
    h: Option<f64>,
) -> Result<PathBuf, HmexError> {
    let path = dir.join(series_file_name(j, h));
    series.to_table()?.write(&path)?;
    Ok(path)
}
