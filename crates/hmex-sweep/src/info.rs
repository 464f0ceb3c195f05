use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use hmex_core::config::{HilbertConfig, HmexConfig, LatticeConfig, ResolvedChains, SimulationConfig};
use hmex_core::errors::HmexError;
use hmex_core::grid::format_value;
use hmex_core::serde::to_yaml_string;
use serde::Serialize;

/// Name of the resolved simulation configuration passed to the runner.
pub const SIMULATION_CONFIG_FILE: &str = "simulation_config.yaml";

/// Configuration document handed to the external runner.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerManifest<'a> {
    /// Physics configuration.
    pub simulation: &'a SimulationConfig,
    /// Chain options with defaults filled in.
    pub chains: ResolvedChains,
    /// Number of lattice sites.
    pub n_sites: usize,
    /// Number of nearest-neighbour bonds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_edges: Option<usize>,
}

impl<'a> RunnerManifest<'a> {
    /// Resolves the manifest from the full configuration.
    pub fn new(config: &'a HmexConfig) -> Self {
        let simulation = &config.simulation;
        Self {
            simulation,
            chains: simulation.sampler.chains().resolved(),
            n_sites: simulation.lattice.n_sites(),
            n_edges: simulation.lattice.n_edges(),
        }
    }
}

fn write_text(path: &Path, text: &str) -> Result<(), HmexError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| HmexError::io("info_dir", parent, err))?;
    }
    fs::write(path, text).map_err(|err| HmexError::io("info_write", path, err))
}

fn lattice_info(lattice: &LatticeConfig) -> String {
    let mut out = String::new();
    match lattice {
        LatticeConfig::Hypercube { length, dim, .. } => {
            let _ = writeln!(out, "lattice: hypercube");
            let _ = writeln!(out, "length: {length}");
            let _ = writeln!(out, "dim: {dim}");
        }
        LatticeConfig::Custom {
            basis_vectors,
            atomic_positions,
            extent,
            point_group,
            max_neighbor_order,
            ..
        } => {
            let _ = writeln!(out, "lattice: custom");
            let _ = writeln!(out, "basis_vectors: {basis_vectors:?}");
            let _ = writeln!(out, "atomic_positions: {atomic_positions:?}");
            let _ = writeln!(out, "extent: {extent:?}");
            if let Some(group) = point_group {
                let _ = writeln!(out, "point_group: {group}");
            }
            if let Some(order) = max_neighbor_order {
                let _ = writeln!(out, "max_neighbor_order: {order}");
            }
        }
    }
    let _ = writeln!(out, "pbc: {}", lattice.periodic());
    let _ = writeln!(out, "n_sites: {}", lattice.n_sites());
    match lattice.n_edges() {
        Some(edges) => {
            let _ = writeln!(out, "n_edges: {edges}");
        }
        None => {
            let _ = writeln!(out, "n_edges: determined by the simulation framework");
        }
    }
    out
}

fn hilbert_info(hilbert: &HilbertConfig, n_sites: usize) -> String {
    let mut out = String::new();
    match hilbert {
        HilbertConfig::Spin { s, total_sz } => {
            let _ = writeln!(out, "hilbert: spin");
            let _ = writeln!(out, "s: {}", format_value(*s));
            let _ = writeln!(out, "n_sites: {n_sites}");
            if let Some(sz) = total_sz {
                let _ = writeln!(out, "total_sz: {}", format_value(*sz));
            }
        }
        HilbertConfig::Fock {
            n_max,
            n_particles,
            modes,
        } => {
            let _ = writeln!(out, "hilbert: fock");
            let _ = writeln!(out, "modes: {modes}");
            if let Some(n_max) = n_max {
                let _ = writeln!(out, "n_max: {n_max}");
            }
            if let Some(n) = n_particles {
                let _ = writeln!(out, "n_particles: {n}");
            }
        }
    }
    match hilbert.local_size() {
        Some(size) => {
            let _ = writeln!(out, "local_size: {size}");
        }
        None => {
            let _ = writeln!(out, "local_size: unbounded");
        }
    }
    out
}

fn hamiltonian_info(config: &HmexConfig) -> String {
    let grid = &config.sweep;
    let mut out = String::new();
    let _ = writeln!(out, "hamiltonian: H = -J/4 sum_<ij> sz_i sz_j - h/2 sum_i sz_i");
    let _ = writeln!(
        out,
        "J: [{}, {}] step {} ({} values)",
        format_value(grid.j.min()),
        format_value(grid.j.max()),
        format_value(grid.j.increment),
        grid.j.len()
    );
    let _ = writeln!(
        out,
        "h: [{}, {}] step {} ({} values)",
        format_value(grid.h.min()),
        format_value(grid.h.max()),
        format_value(grid.h.increment),
        grid.h.len()
    );
    let tracked: Vec<&str> = config
        .tracked_observables()
        .iter()
        .map(|obs| obs.as_str())
        .collect();
    let _ = writeln!(out, "observables: {}", tracked.join(", "));
    out
}

/// Writes the lattice, Hilbert space and Hamiltonian descriptions plus the
/// resolved runner configuration under the info directory.
///
/// Returns the written paths; the runner configuration comes last.
pub fn write_simulation_info(config: &HmexConfig) -> Result<Vec<PathBuf>, HmexError> {
    let dir = config.output.info_dir();
    let simulation = &config.simulation;
    let lattice_path = dir.join("lattice_info.txt");
    write_text(&lattice_path, &lattice_info(&simulation.lattice))?;
    let hilbert_path = dir.join("hilbert_info.txt");
    write_text(
        &hilbert_path,
        &hilbert_info(&simulation.hilbert, simulation.lattice.n_sites()),
    )?;
    let hamiltonian_path = dir.join("hamiltonian_info.txt");
    write_text(&hamiltonian_path, &hamiltonian_info(config))?;
    let manifest_path = dir.join(SIMULATION_CONFIG_FILE);
    write_text(&manifest_path, &to_yaml_string(&RunnerManifest::new(config))?)?;
    Ok(vec![lattice_path, hilbert_path, hamiltonian_path, manifest_path])
}
