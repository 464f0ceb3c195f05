use std::path::PathBuf;

use hmex_core::config::HmexConfig;
use hmex_core::errors::HmexError;
use hmex_core::layout::per_site_path;
use hmex_core::table::Table;
use tracing::{info, warn};

use crate::angle::{angle_file, InvalidAngle};
use crate::fit::{builtin_model, fit, FitOutcome};
use crate::lm::LmOptions;
use crate::normalize::per_site_files;
use crate::plots::{plot_fits, plot_global_tables};
use crate::susceptibility::susceptibility_file;

/// Field axis of global and derived tables.
pub const FIELD_AXIS: &str = "#h";

/// Files and diagnostics produced by [`post_process`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostOutcome {
    /// `PerSite_<obs>.txt` tables.
    pub per_site: Vec<PathBuf>,
    /// `chi.txt`.
    pub susceptibility: PathBuf,
    /// `Angle.txt`.
    pub angle: PathBuf,
    /// Magnetisation values outside the angle domain.
    pub invalid_angles: Vec<InvalidAngle>,
}

/// Runs per-site normalisation, susceptibility and angle on the persisted global tables.
///
/// The configuration is validated first, so the magnetisation table is always
/// normalised in this run rather than read from an earlier one.
pub fn post_process(config: &HmexConfig) -> Result<PostOutcome, HmexError> {
    config.validate()?;
    let layout = &config.output;
    let observables = config.post.per_site_observables(&config.tracked_observables());
    let per_site = per_site_files(layout, &observables, config.site_count())?;
    let magnetization = config.post.magnetization;
    let susceptibility = susceptibility_file(layout, magnetization, FIELD_AXIS)?;
    let (angle, outcome) = angle_file(layout, magnetization, FIELD_AXIS)?;
    if !outcome.invalid.is_empty() {
        warn!(count = outcome.invalid.len(), "angle inputs outside the domain were set to NaN");
    }
    info!(tables = per_site.len() + 2, "post-processing finished");
    Ok(PostOutcome {
        per_site,
        susceptibility,
        angle,
        invalid_angles: outcome.invalid,
    })
}

/// Fits the configured model to the per-site magnetisation and writes
/// `<fit_name>_param.txt`, plus overlay plots when enabled.
pub fn fit_magnetization(config: &HmexConfig) -> Result<(PathBuf, FitOutcome), HmexError> {
    config.validate()?;
    let layout = &config.output;
    let model = builtin_model(config.post.fit_model);
    let input = per_site_path(&layout.global_file(config.post.magnetization));
    let data = Table::read(&input)?;
    let outcome = fit(model.as_ref(), &data, FIELD_AXIS, &LmOptions::default())?;
    let output = layout
        .fit_params_dir()
        .join(format!("{}_param.txt", config.post.fit_name));
    outcome.params.write(&output)?;
    if config.plots.fit {
        plot_fits(
            model.as_ref(),
            &data,
            FIELD_AXIS,
            &outcome,
            &layout.fit_plots_dir(),
            &config.post.fit_name,
        )?;
    }
    info!(
        fitted = outcome.reports.len(),
        failed = outcome.failures.len(),
        path = %output.display(),
        "fit finished"
    );
    Ok((output, outcome))
}

/// Plots the global tables when aggregate plots are enabled.
pub fn plot_aggregates(config: &HmexConfig) -> Result<Vec<PathBuf>, HmexError> {
    if !config.plots.aggregate {
        return Ok(Vec::new());
    }
    plot_global_tables(&config.output)
}
