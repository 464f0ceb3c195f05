use std::path::PathBuf;

use hmex_core::config::{
    load_config, AnsatzConfig, ChainOptions, FailurePolicy, HilbertConfig, HmexConfig,
    ImaginaryPolicy, LatticeConfig, ModelKind, OptimizerConfig, SamplerConfig,
};
use hmex_core::errors::HmexError;
use hmex_core::layout::{per_site_path, series_file_name, OutputLayout};
use hmex_core::observable::Observable;

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(relative)
}

fn write_config(yaml: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).expect("write config");
    (dir, path)
}

#[test]
fn smoke_fixture_loads() {
    let config = load_config(fixture_path("configs/smoke.yaml")).expect("config loads");
    assert_eq!(config.sweep.pair_count(), 9);
    assert_eq!(config.site_count(), 16);
    assert_eq!(config.simulation.lattice.n_edges(), Some(32));
    assert_eq!(
        config.tracked_observables(),
        vec![
            Observable::Energy,
            Observable::Msx,
            Observable::Msy,
            Observable::Msz,
            Observable::ChiCorrZ
        ]
    );
    assert_eq!(config.runner.on_failure, FailurePolicy::Abort);
    assert_eq!(config.post.fit_model, ModelKind::Tanh);
    assert_eq!(
        config.simulation.sampler.chains().resolved().machine_pow,
        ChainOptions::DEFAULT_MACHINE_POW
    );
}

#[test]
fn empty_document_uses_defaults() {
    let (_dir, path) = write_config("{}\n");
    let config = load_config(&path).expect("defaults load");
    assert_eq!(config, HmexConfig::default());
    assert_eq!(config.simulation.iterations, 300);
    assert_eq!(config.simulation.samples, 512);
    assert_eq!(config.runner.imaginary, ImaginaryPolicy::Warn { tolerance: 1e-6 });
    assert_eq!(config.post.fit_name, "MSZ_fit");
}

#[test]
fn tagged_variants_parse() {
    let yaml = r#"
simulation:
  lattice:
    type: custom
    basis_vectors: [[1.0, 0.0], [0.5, 0.866]]
    atomic_positions: [[0.0, 0.0], [0.5, 0.0], [0.25, 0.433]]
    extent: [3, 3]
  hilbert:
    type: fock
    n_max: 3
    modes: 27
  ansatz:
    type: gcnn
    features: [8, 4]
    layers: 2
  sampler:
    type: exchange
    d_max: 2
  optimizer:
    type: adam
    learning_rate: 0.001
"#;
    let (_dir, path) = write_config(yaml);
    let config = load_config(&path).expect("variants load");
    assert!(matches!(config.simulation.lattice, LatticeConfig::Custom { .. }));
    assert_eq!(config.site_count(), 27);
    assert_eq!(config.simulation.lattice.n_edges(), None);
    assert_eq!(config.simulation.hilbert.local_size(), Some(4));
    assert!(matches!(config.simulation.ansatz, AnsatzConfig::Gcnn { layers: 2, .. }));
    assert!(matches!(config.simulation.sampler, SamplerConfig::Exchange { d_max: 2, .. }));
    match config.simulation.optimizer {
        OptimizerConfig::Adam { beta1, beta2, .. } => {
            assert_eq!(beta1, 0.9);
            assert_eq!(beta2, 0.999);
        }
        other => panic!("unexpected optimizer {other:?}"),
    }
}

#[test]
fn unknown_variant_is_config_error() {
    let (_dir, path) = write_config("simulation:\n  ansatz:\n    type: transformer\n");
    let err = load_config(&path).expect_err("unknown ansatz");
    assert!(matches!(err, HmexError::Config(_)));
    assert_eq!(err.info().code, "config_parse");
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "sweep:\n  j: {range: [0.0, 1.0], increment: -0.1}\n  h: {range: [0.0, 1.0], increment: 0.1}\n",
        "simulation:\n  hilbert: {type: spin, s: 0.3}\n",
        "simulation:\n  optimizer: {type: adam, learning_rate: 0.1, beta1: 1.5}\n",
        "simulation:\n  iterations: 0\n",
        "post:\n  magnetization: Energy\n",
        "simulation:\n  observables: [MSX]\npost:\n  magnetization: MSZ\n",
        "runner:\n  timeout_secs: 0\n",
        "post:\n  magnetization: MSZ\n  per_site: [Energy]\n",
        "simulation:\n  lattice: {type: hypercube, length: 10, dim: 30}\n",
        "sweep:\n  j: {range: [0.0, 1.0e300], increment: 1.0e-10}\n  h: {range: [0.0, 1.0], increment: 0.1}\n",
    ];
    for yaml in cases {
        let (_dir, path) = write_config(yaml);
        let err = load_config(&path).expect_err(yaml);
        assert!(matches!(err, HmexError::Config(_)), "{yaml}: {err}");
    }
}

#[test]
fn missing_config_is_missing_input() {
    let err = load_config("/nonexistent/hmex.yaml").expect_err("missing");
    assert!(matches!(err, HmexError::MissingInput(_)));
}

#[test]
fn hypercube_edges_follow_boundaries() {
    let open = LatticeConfig::Hypercube { length: 4, dim: 2, pbc: false };
    assert_eq!(open.n_edges(), Some(24));
    let pair = LatticeConfig::Hypercube { length: 2, dim: 1, pbc: true };
    assert_eq!(pair.n_edges(), Some(1));
    let spin_one = HilbertConfig::Spin { s: 1.0, total_sz: None };
    assert_eq!(spin_one.local_size(), Some(3));
}

#[test]
fn layout_names_artefacts() {
    let layout = OutputLayout::with_root("out");
    assert_eq!(
        layout.series_file(-1.0, 0.06),
        PathBuf::from("out/output_files/simulation_files/data_(J=-1.0,h=0.06).txt")
    );
    assert_eq!(
        layout.per_j_file(Observable::Msz, -1.5),
        PathBuf::from("out/output_files/combined_var_data_files/MSZ_(J=-1.5).txt")
    );
    assert_eq!(
        layout.global_file(Observable::ChiCorrZ),
        PathBuf::from("out/output_files/J_parsed_files/chi_corrZ.txt")
    );
    assert_eq!(series_file_name(None, Some(0.5)), "data_(h=0.5).txt");
    assert_eq!(series_file_name(None, None), "data.txt");
    assert_eq!(
        per_site_path(&layout.global_file(Observable::Msz)),
        PathBuf::from("out/output_files/J_parsed_files/PerSite_MSZ.txt")
    );
}

#[test]
fn oversized_lattices_are_rejected_without_overflow() {
    let huge = LatticeConfig::Hypercube { length: 10, dim: 30, pbc: true };
    assert_eq!(huge.checked_n_sites(), None);
    assert_eq!(huge.n_sites(), usize::MAX);
    assert_eq!(huge.n_edges(), None);
    assert_eq!(huge.validate().expect_err("too large").info().code, "lattice_size");

    let custom = LatticeConfig::Custom {
        basis_vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        atomic_positions: vec![vec![0.0, 0.0], vec![0.5, 0.5]],
        extent: vec![usize::MAX / 2, 3],
        pbc: true,
        point_group: None,
        max_neighbor_order: None,
    };
    assert_eq!(custom.validate().expect_err("too large").info().code, "lattice_size");
}

#[test]
fn per_site_subset_must_keep_the_magnetization() {
    let (_dir, path) = write_config("post:\n  magnetization: MSZ\n  per_site: [Energy]\n");
    let err = load_config(&path).expect_err("magnetization dropped");
    assert_eq!(err.info().code, "post_per_site_magnetization");

    let (_dir, path) = write_config("post:\n  magnetization: MSZ\n  per_site: [Energy, MSZ]\n");
    let config = load_config(&path).expect("subset with magnetization");
    assert_eq!(
        config.post.per_site_observables(&config.tracked_observables()),
        vec![Observable::Energy, Observable::Msz]
    );
}
