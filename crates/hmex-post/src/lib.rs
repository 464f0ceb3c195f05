#![deny(missing_docs)]
#![doc = "Post-processing of HMEX global tables: per-site normalisation, susceptibility, spin angle and least-squares fits."]

/// Spin angle of the per-site magnetisation.
pub mod angle;
/// Parametric models and per-column fitting.
pub mod fit;
/// Levenberg-Marquardt least squares.
pub mod lm;
/// Per-site normalisation of global tables.
pub mod normalize;
/// Post-processing and fit stages over the output layout.
pub mod pipeline;
/// Aggregate and fit overlay plots.
pub mod plots;
/// Finite-difference susceptibility.
pub mod susceptibility;

pub use angle::{angle, angle_file, AngleOutcome, InvalidAngle, ANGLE_FILE};
pub use fit::{
    builtin_model, fit, fit_file, FitFailure, FitModel, FitOutcome, FnModel, LinearModel, TanhModel,
};
pub use lm::{minimize, LmOptions, LmReport, Termination};
pub use normalize::{is_axis_column, per_site, per_site_files};
pub use pipeline::{fit_magnetization, plot_aggregates, post_process, PostOutcome, FIELD_AXIS};
pub use plots::{plot_fits, plot_global_tables};
pub use susceptibility::{susceptibility, susceptibility_file, CHI_FILE};
