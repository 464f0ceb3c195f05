#![deny(missing_docs)]
#![doc = "Configuration, sweep axes, observables and fixed-width tables shared by the HMEX pipeline crates."]

/// Configuration schema, defaults and validation.
pub mod config;
/// Structured error families with stable codes.
pub mod errors;
/// Parameter axes, sweep grid and settled means.
pub mod grid;
/// Canonical hashing helpers.
pub mod hash;
/// Output directory layout and file names.
pub mod layout;
/// Tracked observable names.
pub mod observable;
/// SVG line and scatter plots.
pub mod plot;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
/// Fixed-width column tables.
pub mod table;

pub use config::{
    load_config, AnsatzConfig, ChainOptions, Device, FailurePolicy, HilbertConfig, HmexConfig,
    ImaginaryPolicy, LatticeConfig, ModelKind, OptimizerConfig, PlotToggles, PostConfig,
    ResolvedChains, RunnerConfig, SamplerConfig, SimulationConfig,
};
pub use errors::{ErrorInfo, HmexError};
pub use grid::{format_value, linspace, settled_mean, Axis, SweepGrid, MAX_AXIS_POINTS};
pub use hash::stable_hash_string;
pub use layout::{per_site_path, series_file_name, OutputLayout, CHECKPOINT_FILE};
pub use observable::{tracked_observables, Observable};
pub use plot::{render_svg, Curve, CurveStyle, Figure};
pub use table::{ColumnData, Table};
