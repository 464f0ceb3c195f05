//! Parametric models and per-column least-squares fitting of tables.

use std::fmt;
use std::path::Path;

use hmex_core::config::ModelKind;
use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::table::Table;
use indexmap::IndexMap;
use nalgebra::DVector;
use tracing::{debug, warn};

use crate::lm::{minimize, LmOptions, LmReport};

/// A model `y = f(x; p)` with named parameters.
pub trait FitModel: Send + Sync {
    /// Name of the independent variable; heads the parameter-name column.
    fn variable(&self) -> &str;
    /// Parameter names in evaluation order.
    fn parameters(&self) -> &[String];
    /// Evaluates the model at `x`.
    fn evaluate(&self, x: f64, params: &[f64]) -> f64;
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

/// `a * x + b`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    params: Vec<String>,
}

impl Default for LinearModel {
    fn default() -> Self {
        Self {
            params: names(&["a", "b"]),
        }
    }
}

impl FitModel for LinearModel {
    fn variable(&self) -> &str {
        "x"
    }

    fn parameters(&self) -> &[String] {
        &self.params
    }

    fn evaluate(&self, x: f64, p: &[f64]) -> f64 {
        p[0] * x + p[1]
    }
}

/// `a * tanh(b * x - c) + d`, the magnetisation step model.
#[derive(Debug, Clone)]
pub struct TanhModel {
    params: Vec<String>,
}

impl Default for TanhModel {
    fn default() -> Self {
        Self {
            params: names(&["a", "b", "c", "d"]),
        }
    }
}

impl FitModel for TanhModel {
    fn variable(&self) -> &str {
        "x"
    }

    fn parameters(&self) -> &[String] {
        &self.params
    }

    fn evaluate(&self, x: f64, p: &[f64]) -> f64 {
        p[0] * (p[1] * x - p[2]).tanh() + p[3]
    }
}

/// Wraps a closure with declared argument names.
pub struct FnModel<F> {
    variable: String,
    params: Vec<String>,
    func: F,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64 + Send + Sync,
{
    /// Creates a model from the independent variable name, parameter names and closure.
    pub fn new(variable: impl Into<String>, params: &[&str], func: F) -> Self {
        Self {
            variable: variable.into(),
            params: names(params),
            func,
        }
    }
}

impl<F> fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModel")
            .field("variable", &self.variable)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<F> FitModel for FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64 + Send + Sync,
{
    fn variable(&self) -> &str {
        &self.variable
    }

    fn parameters(&self) -> &[String] {
        &self.params
    }

    fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        (self.func)(x, params)
    }
}

/// Built-in model for a configured kind.
pub fn builtin_model(kind: ModelKind) -> Box<dyn FitModel> {
    match kind {
        ModelKind::Linear => Box::new(LinearModel::default()),
        ModelKind::Tanh => Box::new(TanhModel::default()),
    }
}

/// A column that could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFailure {
    /// Input column name.
    pub column: String,
    /// Why the fit failed.
    pub error: HmexError,
}

/// Fitted parameters for every data column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Parameter-name column followed by one column of fitted values per input column.
    pub params: Table,
    /// Solver reports of successful columns.
    pub reports: IndexMap<String, LmReport>,
    /// Columns whose parameters are `NaN`.
    pub failures: Vec<FitFailure>,
}

impl FitOutcome {
    /// Fitted parameters of one column, `None` when it failed or is unknown.
    pub fn parameters(&self, column: &str) -> Option<&[f64]> {
        self.reports.get(column).map(|report| report.params.as_slice())
    }
}

fn fit_column(
    model: &dyn FitModel,
    xs: &[f64],
    ys: &[f64],
    opts: &LmOptions,
) -> Result<LmReport, HmexError> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .unzip();
    let n_params = model.parameters().len();
    if xs.len() < n_params {
        return Err(HmexError::Fit(
            ErrorInfo::new("fit_underdetermined", "fewer finite points than parameters")
                .with_context("points", xs.len().to_string())
                .with_context("parameters", n_params.to_string()),
        ));
    }
    let residuals = |p: &DVector<f64>| {
        DVector::from_iterator(
            xs.len(),
            xs.iter()
                .zip(&ys)
                .map(|(&x, &y)| model.evaluate(x, p.as_slice()) - y),
        )
    };
    minimize(residuals, &vec![1.0; n_params], opts)
}

/// Fits `model` to every numeric column of `table` except `axis`.
///
/// Rows with a non-finite value are skipped. A column that fails to converge
/// gets `NaN` parameters and an entry in [`FitOutcome::failures`]; the
/// remaining columns are still fitted.
pub fn fit(
    model: &dyn FitModel,
    table: &Table,
    axis: &str,
    opts: &LmOptions,
) -> Result<FitOutcome, HmexError> {
    let xs = table.numeric(axis)?;
    let n_params = model.parameters().len();
    let mut params = Table::new();
    params.push_column(model.variable(), model.parameters().to_vec())?;
    let mut reports = IndexMap::new();
    let mut failures = Vec::new();

    for (column, ys) in table.data_columns(axis) {
        match fit_column(model, xs, ys, opts) {
            Ok(report) => {
                debug!(column, cost = report.cost, evaluations = report.evaluations, "fit converged");
                params.push_column(column, report.params.clone())?;
                reports.insert(column.to_string(), report);
            }
            Err(error) => {
                warn!(column, %error, "fit failed");
                params.push_column(column, vec![f64::NAN; n_params])?;
                failures.push(FitFailure {
                    column: column.to_string(),
                    error,
                });
            }
        }
    }
    Ok(FitOutcome {
        params,
        reports,
        failures,
    })
}

/// Reads `input`, fits every data column and writes the parameter table to `output`.
pub fn fit_file(
    model: &dyn FitModel,
    input: &Path,
    axis: &str,
    output: &Path,
    opts: &LmOptions,
) -> Result<FitOutcome, HmexError> {
    let table = Table::read(input)?;
    let outcome = fit(model, &table, axis, opts)?;
    outcome.params.write(output)?;
    Ok(outcome)
}
