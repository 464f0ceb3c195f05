use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use hmex_core::config::load_config;
use hmex_core::observable::Observable;
use hmex_core::table::Table;

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
}

fn hmex() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hmex"))
}

const DRIVER: &str = r#"echo '{"Energy": {"iters": [0, 1, 2], "Mean": [-4.0, -4.0, -4.0]}, "MSX": {"iters": [0, 1, 2], "Mean": [1.0, 1.0, 1.0]}, "MSY": {"iters": [0, 1, 2], "Mean": [0.0, 0.0, 0.0]}, "MSZ": {"iters": [0, 1, 2], "Mean": [2.0, 2.0, 2.0]}, "chi_corrZ": {"iters": [0, 1, 2], "Mean": [0.5, 0.5, 0.5]}}'"#;

fn write_config(dir: &Path) -> PathBuf {
    let text = format!(
        r#"sweep:
  j: {{ range: [-1.0, -2.0], increment: 0.5 }}
  h: {{ range: [0.0, 1.0], increment: 0.5 }}
  settling_window: 2
runner:
  program: sh
  args: ["-c", "{}", "driver"]
output:
  root: {}
plots:
  series: false
  aggregate: false
  fit: false
post:
  fit_model: linear
"#,
        DRIVER.replace('\\', "\\\\").replace('"', "\\\""),
        dir.join("results").display()
    );
    let path = dir.join("hmex.yaml");
    fs::write(&path, text).expect("write config");
    path
}

#[test]
fn check_config_reports_the_grid() {
    let output = hmex()
        .args(["check-config", "--config"])
        .arg(fixture_path("configs/smoke.yaml"))
        .output()
        .expect("spawn hmex");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pairs: 9"));
    assert!(stdout.contains("observables: Energy, MSX, MSY, MSZ, chi_corrZ"));
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = hmex()
        .args(["check-config", "--config"])
        .arg(dir.path().join("absent.yaml"))
        .status()
        .expect("spawn hmex");
    assert!(!status.success());
}

#[cfg(unix)]
#[test]
fn run_produces_global_and_derived_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = write_config(dir.path());
    let status = hmex()
        .args(["run", "--quiet", "--concurrency", "2", "--config"])
        .arg(&config_path)
        .status()
        .expect("spawn hmex");
    assert!(status.success());

    let config = load_config(&config_path).expect("config");
    let global = Table::read(&config.output.global_file(Observable::Msz)).expect("global MSZ");
    assert_eq!(global.names().collect::<Vec<_>>(), vec!["#h", "j=-2.0", "j=-1.5", "j=-1.0"]);
    assert_eq!(global.numeric("j=-1.5").expect("column"), &[2.0, 2.0, 2.0]);
    assert!(config.output.global_dir().join("chi.txt").exists());
    assert!(config.output.global_dir().join("Angle.txt").exists());
    assert!(config.output.fit_params_dir().join("MSZ_fit_param.txt").exists());
    assert!(config.output.info_dir().join("simulation_config.yaml").exists());
}

#[test]
fn help_names_the_model() {
    let output = hmex().arg("--help").output().expect("spawn hmex");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Heisenberg model in a longitudinal field"));
}
