//! Levenberg-Marquardt least squares with a forward-difference Jacobian.

use hmex_core::errors::{ErrorInfo, HmexError};
use nalgebra::{DMatrix, DVector};

const DEFAULT_TOL: f64 = 1.49012e-8;
const MAX_DAMPING: f64 = 1e16;

/// Convergence tolerances and evaluation budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Relative reduction of the cost below which the fit has converged.
    pub ftol: f64,
    /// Relative step size below which the fit has converged.
    pub xtol: f64,
    /// Largest gradient component below which the fit has converged.
    pub gtol: f64,
    /// Residual evaluations allowed; `200 * (n_params + 1)` when absent.
    pub max_evaluations: Option<usize>,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            ftol: DEFAULT_TOL,
            xtol: DEFAULT_TOL,
            gtol: DEFAULT_TOL,
            max_evaluations: None,
        }
    }
}

impl LmOptions {
    /// Evaluation budget for a problem with `n_params` parameters.
    pub fn evaluation_budget(&self, n_params: usize) -> usize {
        self.max_evaluations.unwrap_or(200 * (n_params + 1))
    }
}

/// Criterion that stopped a successful minimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Relative cost reduction fell below `ftol`.
    CostReduction,
    /// Relative step fell below `xtol`.
    StepSize,
    /// Gradient fell below `gtol`.
    Gradient,
}

/// Result of a converged minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    /// Optimal parameters.
    pub params: Vec<f64>,
    /// Half the sum of squared residuals at the optimum.
    pub cost: f64,
    /// Residual evaluations used.
    pub evaluations: usize,
    /// Criterion that stopped the iteration.
    pub termination: Termination,
}

fn fit_error(code: &str, message: &str, evaluations: usize) -> HmexError {
    HmexError::Fit(
        ErrorInfo::new(code, message).with_context("evaluations", evaluations.to_string()),
    )
}

fn jacobian<F>(residuals: &F, params: &DVector<f64>, base: &DVector<f64>) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let scale = f64::EPSILON.sqrt();
    let mut jac = DMatrix::zeros(base.len(), params.len());
    for k in 0..params.len() {
        let step = scale * params[k].abs().max(1.0);
        let mut shifted = params.clone();
        shifted[k] += step;
        let column = (residuals(&shifted) - base) / step;
        jac.set_column(k, &column);
    }
    jac
}

/// Minimises `0.5 * |residuals(p)|^2` starting from `initial`.
///
/// Fails with a fit error when residuals become non-finite at the start or
/// in the Jacobian, when damping can no longer produce a descent step, or
/// when the evaluation budget runs out.
pub fn minimize<F>(residuals: F, initial: &[f64], opts: &LmOptions) -> Result<LmReport, HmexError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = initial.len();
    let budget = opts.evaluation_budget(n);
    let mut params = DVector::from_column_slice(initial);
    let mut r = residuals(&params);
    let mut evaluations = 1;
    if r.iter().any(|value| !value.is_finite()) {
        return Err(fit_error("fit_non_finite", "residuals are not finite at the initial guess", evaluations));
    }
    let mut cost = 0.5 * r.norm_squared();
    let mut damping = 1e-3;

    let report = |params: &DVector<f64>, cost: f64, evaluations: usize, termination| LmReport {
        params: params.iter().copied().collect(),
        cost,
        evaluations,
        termination,
    };

    loop {
        if evaluations + n > budget {
            return Err(fit_error("fit_max_evaluations", "evaluation budget exhausted", evaluations));
        }
        let jac = jacobian(&residuals, &params, &r);
        evaluations += n;
        if jac.iter().any(|value| !value.is_finite()) {
            return Err(fit_error("fit_non_finite", "Jacobian is not finite", evaluations));
        }
        let gradient = jac.transpose() * &r;
        if gradient.amax() <= opts.gtol {
            return Ok(report(&params, cost, evaluations, Termination::Gradient));
        }
        let normal = jac.transpose() * &jac;

        loop {
            if evaluations >= budget {
                return Err(fit_error("fit_max_evaluations", "evaluation budget exhausted", evaluations));
            }
            let mut damped = normal.clone();
            for k in 0..n {
                damped[(k, k)] += damping * normal[(k, k)].max(1e-12);
            }
            let Some(factor) = damped.cholesky() else {
                damping *= 10.0;
                if damping > MAX_DAMPING {
                    return Err(fit_error("fit_singular", "damped normal equations are singular", evaluations));
                }
                continue;
            };
            let step = factor.solve(&(-&gradient));
            let step_small = step.norm() <= opts.xtol * (params.norm() + opts.xtol);
            let trial = &params + &step;
            let trial_r = residuals(&trial);
            evaluations += 1;
            let trial_cost = 0.5 * trial_r.norm_squared();

            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = (cost - trial_cost) / cost;
                params = trial;
                r = trial_r;
                cost = trial_cost;
                damping = (damping / 10.0).max(1e-15);
                if cost == 0.0 || reduction <= opts.ftol {
                    return Ok(report(&params, cost, evaluations, Termination::CostReduction));
                }
                if step_small {
                    return Ok(report(&params, cost, evaluations, Termination::StepSize));
                }
                break;
            }
            if step_small {
                return Ok(report(&params, cost, evaluations, Termination::StepSize));
            }
            damping *= 10.0;
            if damping > MAX_DAMPING {
                return Err(fit_error("fit_stalled", "no descent step found", evaluations));
            }
        }
    }
}
