use approx::assert_abs_diff_eq;
use hmex_core::config::ImaginaryPolicy;
use hmex_core::errors::HmexError;
use hmex_core::observable::Observable;
use hmex_core::table::Table;
use hmex_sweep::extract::{extract, persist, TimeSeries};
use hmex_sweep::runner::{MeanValues, ObservableLog, RuntimeLog};

fn entry(values: Vec<f64>) -> ObservableLog {
    ObservableLog {
        iters: (0..values.len() as u64).collect(),
        mean: MeanValues::Real(values),
    }
}

fn sample_log() -> RuntimeLog {
    let mut log = RuntimeLog::new();
    log.insert("Energy".into(), entry(vec![-1.0, -1.2, -1.25, -1.3]));
    log.insert("MSZ".into(), entry(vec![0.1, 0.2, 0.3, 0.4]));
    log.insert(
        "MSX".into(),
        ObservableLog {
            iters: vec![0, 1, 2, 3],
            mean: MeanValues::Split {
                real: vec![0.5, 0.5, 0.5, 0.5],
                imag: vec![0.0, 0.0, 0.2, 0.0],
            },
        },
    );
    log
}

#[test]
fn extract_keeps_real_parts_in_configured_order() {
    let series = extract(
        &sample_log(),
        &[Observable::Msz, Observable::Msx],
        ImaginaryPolicy::Discard,
    )
    .expect("extract");
    assert_eq!(series.iters(), &[0, 1, 2, 3]);
    assert_eq!(
        series.observables().collect::<Vec<_>>(),
        vec![Observable::Energy, Observable::Msz, Observable::Msx]
    );
    assert_eq!(series.values(Observable::Msx), Some(&[0.5, 0.5, 0.5, 0.5][..]));
    let summaries = series.summaries(2);
    assert_abs_diff_eq!(summaries[&Observable::Msz], 0.35, epsilon = 1e-12);
    assert_abs_diff_eq!(series.summaries(100)[&Observable::Energy], -1.1875, epsilon = 1e-12);
}

#[test]
fn warn_policy_still_extracts() {
    let series = extract(
        &sample_log(),
        &[Observable::Msz, Observable::Msx],
        ImaginaryPolicy::Warn { tolerance: 1e-6 },
    )
    .expect("warn extracts");
    assert_eq!(series.len(), 4);
}

#[test]
fn reject_policy_fails_on_large_imaginary_part() {
    let err = extract(
        &sample_log(),
        &[Observable::Msz, Observable::Msx],
        ImaginaryPolicy::Reject { tolerance: 0.1 },
    )
    .expect_err("reject");
    assert!(matches!(err, HmexError::Numeric(_)));
    assert_eq!(err.info().context.get("observable").map(String::as_str), Some("MSX"));

    extract(
        &sample_log(),
        &[Observable::Msz, Observable::Msx],
        ImaginaryPolicy::Reject { tolerance: 0.5 },
    )
    .expect("within tolerance");
}

#[test]
fn observable_set_must_match_configuration() {
    let log = sample_log();
    let missing = extract(&log, &[Observable::Msz, Observable::Msx, Observable::Msy], ImaginaryPolicy::Discard)
        .expect_err("MSY absent");
    assert!(matches!(missing, HmexError::InconsistentObservables(_)));
    assert_eq!(missing.info().code, "missing_observable");

    let extra = extract(&log, &[Observable::Msz], ImaginaryPolicy::Discard).expect_err("MSX extra");
    assert_eq!(extra.info().code, "unexpected_observable");

    let mut short = sample_log();
    short.insert("MSZ".into(), entry(vec![0.1, 0.2]));
    let err = extract(&short, &[Observable::Msz, Observable::Msx], ImaginaryPolicy::Discard)
        .expect_err("length mismatch");
    assert_eq!(err.info().code, "series_length");
}

#[test]
fn persisted_series_reloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let series = extract(
        &sample_log(),
        &[Observable::Msz, Observable::Msx],
        ImaginaryPolicy::Discard,
    )
    .expect("extract");
    let path = persist(&series, dir.path(), Some(-1.0), Some(0.06)).expect("persist");
    assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("data_(J=-1.0,h=0.06).txt"));

    let table = Table::read(&path).expect("read");
    assert_eq!(
        table.names().collect::<Vec<_>>(),
        vec!["iters", "Energy", "MSZ", "MSX"]
    );
    let reloaded = TimeSeries::from_table(&table, &[Observable::Msz, Observable::Msx]).expect("reload");
    assert_eq!(reloaded.iters(), series.iters());
    for obs in series.observables() {
        let original = series.values(obs).expect("values");
        let restored = reloaded.values(obs).expect("restored");
        for (a, b) in original.iter().zip(restored) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    let only_h = persist(&series, dir.path(), None, Some(2.0)).expect("persist h");
    assert!(only_h.ends_with("data_(h=2.0).txt"));
    let bare = persist(&series, dir.path(), None, None).expect("persist bare");
    assert!(bare.ends_with("data.txt"));
}
