use hmex_core::config::{HmexConfig, LatticeConfig};
use hmex_core::layout::OutputLayout;
use hmex_sweep::info::{write_simulation_info, SIMULATION_CONFIG_FILE};

#[test]
fn info_files_describe_the_system() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = HmexConfig::default();
    config.output = OutputLayout::with_root(dir.path());
    let written = write_simulation_info(&config).expect("info written");
    assert_eq!(written.len(), 4);
    assert!(written[3].ends_with(SIMULATION_CONFIG_FILE));

    let lattice = std::fs::read_to_string(&written[0]).expect("lattice info");
    assert!(lattice.contains("lattice: hypercube"));
    assert!(lattice.contains("n_sites: 16"));
    assert!(lattice.contains("n_edges: 32"));
    let hilbert = std::fs::read_to_string(&written[1]).expect("hilbert info");
    assert!(hilbert.contains("local_size: 2"));
    let hamiltonian = std::fs::read_to_string(&written[2]).expect("hamiltonian info");
    assert!(hamiltonian.contains("J: [-2.0, -1.0] step 0.5 (3 values)"));

    let manifest: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&written[3]).expect("manifest")).expect("yaml");
    assert_eq!(manifest["n_sites"].as_u64(), Some(16));
    assert_eq!(manifest["chains"]["n_chains_per_rank"].as_u64(), Some(16));
    assert_eq!(manifest["simulation"]["lattice"]["type"].as_str(), Some("hypercube"));
}

#[test]
fn custom_lattice_leaves_edges_to_the_framework() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = HmexConfig::default();
    config.output = OutputLayout::with_root(dir.path());
    config.simulation.lattice = LatticeConfig::Custom {
        basis_vectors: vec![vec![1.0]],
        atomic_positions: vec![vec![0.0], vec![0.5]],
        extent: vec![6],
        pbc: false,
        point_group: None,
        max_neighbor_order: Some(2),
    };
    let written = write_simulation_info(&config).expect("info written");
    let lattice = std::fs::read_to_string(&written[0]).expect("lattice info");
    assert!(lattice.contains("n_sites: 12"));
    assert!(lattice.contains("pbc: false"));
    assert!(lattice.contains("n_edges: determined by the simulation framework"));
}
