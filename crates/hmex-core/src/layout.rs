//! Output directory layout and artefact file names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::HmexError;
use crate::grid::format_value;
use crate::observable::Observable;

/// Name of the sweep checkpoint written in the output root.
pub const CHECKPOINT_FILE: &str = "sweep_checkpoint.json";

/// Subdirectories under a common output root.
///
/// Every stage derives its paths from this struct; the subfolder fields are
/// relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// Root of all generated artefacts.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Per `(J, h)` series tables.
    #[serde(default = "default_simulation")]
    pub simulation: PathBuf,
    /// Per-J observable tables (iterations by field).
    #[serde(default = "default_combined")]
    pub combined: PathBuf,
    /// Global observable tables and derived quantities.
    #[serde(default = "default_global")]
    pub global: PathBuf,
    /// Fitted parameter tables.
    #[serde(default = "default_fit_params")]
    pub fit_params: PathBuf,
    /// Descriptions of the simulated system.
    #[serde(default = "default_info")]
    pub info: PathBuf,
    /// Observable vs iteration plots.
    #[serde(default = "default_series_plots")]
    pub series_plots: PathBuf,
    /// Fitted curve plots.
    #[serde(default = "default_fit_plots")]
    pub fit_plots: PathBuf,
    /// Observable vs field plots.
    #[serde(default = "default_aggregate_plots")]
    pub aggregate_plots: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("results")
}

fn default_simulation() -> PathBuf {
    PathBuf::from("output_files/simulation_files")
}

fn default_combined() -> PathBuf {
    PathBuf::from("output_files/combined_var_data_files")
}

fn default_global() -> PathBuf {
    PathBuf::from("output_files/J_parsed_files")
}

fn default_fit_params() -> PathBuf {
    PathBuf::from("output_files/fitting_param_files")
}

fn default_info() -> PathBuf {
    PathBuf::from("output_files/QSfiles")
}

fn default_series_plots() -> PathBuf {
    PathBuf::from("plots/parsed_data_plots")
}

fn default_fit_plots() -> PathBuf {
    PathBuf::from("plots/fitted_plots")
}

fn default_aggregate_plots() -> PathBuf {
    PathBuf::from("plots/j_parsed_plots")
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::with_root(default_root())
    }
}

impl OutputLayout {
    /// Default subfolders under a custom root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            simulation: default_simulation(),
            combined: default_combined(),
            global: default_global(),
            fit_params: default_fit_params(),
            info: default_info(),
            series_plots: default_series_plots(),
            fit_plots: default_fit_plots(),
            aggregate_plots: default_aggregate_plots(),
        }
    }

    /// Directory holding per-pair series tables.
    pub fn simulation_dir(&self) -> PathBuf {
        self.root.join(&self.simulation)
    }

    /// Directory holding per-J tables.
    pub fn combined_dir(&self) -> PathBuf {
        self.root.join(&self.combined)
    }

    /// Directory holding global and derived tables.
    pub fn global_dir(&self) -> PathBuf {
        self.root.join(&self.global)
    }

    /// Directory holding fit parameter tables.
    pub fn fit_params_dir(&self) -> PathBuf {
        self.root.join(&self.fit_params)
    }

    /// Directory holding system descriptions.
    pub fn info_dir(&self) -> PathBuf {
        self.root.join(&self.info)
    }

    /// Directory holding series plots.
    pub fn series_plots_dir(&self) -> PathBuf {
        self.root.join(&self.series_plots)
    }

    /// Directory holding fit plots.
    pub fn fit_plots_dir(&self) -> PathBuf {
        self.root.join(&self.fit_plots)
    }

    /// Directory holding aggregate plots.
    pub fn aggregate_plots_dir(&self) -> PathBuf {
        self.root.join(&self.aggregate_plots)
    }

    /// Creates every directory of the layout.
    pub fn create_all(&self) -> Result<(), HmexError> {
        for dir in [
            self.simulation_dir(),
            self.combined_dir(),
            self.global_dir(),
            self.fit_params_dir(),
            self.info_dir(),
            self.series_plots_dir(),
            self.fit_plots_dir(),
            self.aggregate_plots_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|err| HmexError::io("layout_dir", &dir, err))?;
        }
        Ok(())
    }

    /// Path of the series table for one `(J, h)` pair.
    pub fn series_file(&self, j: f64, h: f64) -> PathBuf {
        self.simulation_dir().join(series_file_name(Some(j), Some(h)))
    }

    /// Path of the per-J table of one observable.
    pub fn per_j_file(&self, observable: Observable, j: f64) -> PathBuf {
        self.combined_dir()
            .join(format!("{observable}_(J={}).txt", format_value(j)))
    }

    /// Path of the global table of one observable.
    pub fn global_file(&self, observable: Observable) -> PathBuf {
        self.global_dir().join(format!("{observable}.txt"))
    }

    /// Path of the sweep checkpoint.
    pub fn checkpoint_file(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }
}

/// Series file name for an optional `(J, h)` pair.
///
/// Both present gives `data_(J=<J>,h=<h>).txt`; a single value gives
/// `data_(J=<J>).txt` or `data_(h=<h>).txt`; neither gives `data.txt`.
pub fn series_file_name(j: Option<f64>, h: Option<f64>) -> String {
    match (j, h) {
        (Some(j), Some(h)) => format!("data_(J={},h={}).txt", format_value(j), format_value(h)),
        (Some(j), None) => format!("data_(J={}).txt", format_value(j)),
        (None, Some(h)) => format!("data_(h={}).txt", format_value(h)),
        (None, None) => "data.txt".to_string(),
    }
}

/// Sibling path with the file name prefixed by `PerSite_`.
pub fn per_site_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("PerSite_{name}"))
}
