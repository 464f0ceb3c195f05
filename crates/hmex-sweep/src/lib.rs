#![deny(missing_docs)]
#![doc = "Simulation runner interface, series extraction and the (J, h) sweep aggregator."]

/// Sweep progress checkpoint and resume.
pub mod checkpoint;
/// Series extraction from runner logs.
pub mod extract;
/// Lattice, Hilbert space and Hamiltonian description files.
pub mod info;
/// Per-pair series plots.
pub mod plots;
/// Simulation runner interface and external command runner.
pub mod runner;
/// Nested (J, h) sweep aggregation.
pub mod sweep;

pub use checkpoint::{config_hash, PairState, SweepCheckpoint};
pub use extract::{extract, persist, TimeSeries, ITERS_COLUMN};
pub use info::{write_simulation_info, RunnerManifest, SIMULATION_CONFIG_FILE};
pub use plots::plot_series;
pub use runner::{CommandRunner, Deadline, MeanValues, ObservableLog, RuntimeLog, SimulationRunner};
pub use sweep::{
    run_sweep, CouplingTables, PairEvent, PairStatus, SweepObserver, SweepOptions, SweepOutcome,
    GLOBAL_AXIS, PER_J_AXIS,
};
