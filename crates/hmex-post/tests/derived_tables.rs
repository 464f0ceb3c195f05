use approx::assert_relative_eq;
use hmex_core::errors::HmexError;
use hmex_core::layout::OutputLayout;
use hmex_core::observable::Observable;
use hmex_core::table::Table;
use hmex_post::angle::{angle, angle_file};
use hmex_post::normalize::{per_site, per_site_files};
use hmex_post::susceptibility::{susceptibility, susceptibility_file};
use proptest::prelude::*;

fn magnetization_table(h: Vec<f64>, columns: &[(&str, Vec<f64>)]) -> Table {
    let mut table = Table::new();
    table.push_column("#h", h).expect("axis");
    for (name, values) in columns {
        table.push_column(*name, values.clone()).expect("column");
    }
    table
}

#[test]
fn per_site_divides_data_columns_only() {
    let table = magnetization_table(vec![0.0, 1.0], &[("j=-1.0", vec![8.0, 4.0])]);
    let normalized = per_site(&table, 16).expect("per site");
    assert_eq!(normalized.numeric("#h").expect("axis"), &[0.0, 1.0]);
    assert_eq!(normalized.numeric("j=-1.0").expect("data"), &[0.5, 0.25]);

    let err = per_site(&table, 0).expect_err("zero sites");
    assert!(matches!(err, HmexError::Config(_)));
}

#[test]
fn susceptibility_has_one_row_less() {
    let table = magnetization_table(
        vec![0.0, 0.5, 1.0, 1.5],
        &[("j=-1.0", vec![0.0, 0.1, 0.3, 0.2]), ("j=-2.0", vec![0.5, 0.5, 0.5, 0.5])],
    );
    let chi = susceptibility(&table, "#h").expect("chi");
    assert_eq!(chi.n_rows(), 3);
    assert_eq!(
        chi.names().collect::<Vec<_>>(),
        vec![
            "#h", "dh", "m-j=-1.0", "dm-j=-1.0", "chi-j=-1.0", "m-j=-2.0", "dm-j=-2.0", "chi-j=-2.0"
        ]
    );
    assert_eq!(chi.numeric("#h").expect("h"), &[0.0, 0.5, 1.0]);
    assert_eq!(chi.numeric("m-j=-1.0").expect("m"), &[0.0, 0.1, 0.3]);
    let dm = chi.numeric("dm-j=-1.0").expect("dm");
    assert_relative_eq!(dm[2], 0.1, epsilon = 1e-12);
    let values = chi.numeric("chi-j=-1.0").expect("chi");
    assert_relative_eq!(values[0], 0.2, epsilon = 1e-12);
    assert_relative_eq!(values[1], 0.4, epsilon = 1e-12);
    assert_relative_eq!(values[2], 0.2, epsilon = 1e-12);
    assert!(chi.numeric("chi-j=-2.0").expect("flat").iter().all(|&v| v == 0.0));
}

#[test]
fn descending_field_keeps_signed_step() {
    let table = magnetization_table(vec![1.0, 0.0], &[("j=-1.0", vec![0.4, 0.1])]);
    let chi = susceptibility(&table, "#h").expect("chi");
    assert_eq!(chi.numeric("dh").expect("dh"), &[-1.0]);
    assert_relative_eq!(chi.numeric("dm-j=-1.0").expect("dm")[0], 0.3, epsilon = 1e-12);
    assert!(chi.numeric("chi-j=-1.0").expect("chi")[0] < 0.0);
}

#[test]
fn susceptibility_needs_two_rows() {
    let table = magnetization_table(vec![0.0], &[("j=-1.0", vec![0.1])]);
    assert!(matches!(susceptibility(&table, "#h"), Err(HmexError::Numeric(_))));
}

#[test]
fn angle_flags_out_of_domain_values() {
    let table = magnetization_table(
        vec![0.0, 1.0, 2.0, 3.0],
        &[("j=-1.0", vec![0.0, 0.25, -0.5, 0.6])],
    );
    let outcome = angle(&table, "#h").expect("angle");
    let values = outcome.table.numeric("j=-1.0").expect("angles");
    assert_relative_eq!(values[0], std::f64::consts::PI, epsilon = 1e-12);
    assert_relative_eq!(values[1], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    assert_relative_eq!(values[2], 0.0, epsilon = 1e-12);
    assert!(values[3].is_nan());
    assert_eq!(outcome.invalid.len(), 1);
    assert_eq!(outcome.invalid[0].row, 3);
    assert_eq!(outcome.invalid[0].column, "j=-1.0");
}

#[test]
fn missing_inputs_name_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = OutputLayout::with_root(dir.path());
    let err = per_site_files(&layout, &[Observable::Msz], 16).expect_err("missing global");
    assert!(matches!(err, HmexError::MissingInput(_)));
    assert!(err.info().context["path"].ends_with("MSZ.txt"));

    let err = susceptibility_file(&layout, Observable::Msz, "#h").expect_err("missing per-site");
    assert!(err.info().context["path"].ends_with("PerSite_MSZ.txt"));
    assert!(angle_file(&layout, Observable::Msz, "#h").is_err());
}

#[test]
fn file_stages_chain_through_the_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = OutputLayout::with_root(dir.path());
    let table = magnetization_table(vec![0.0, 1.0, 2.0], &[("j=-1.0", vec![0.0, 4.0, 8.0])]);
    table.write(&layout.global_file(Observable::Msz)).expect("global");

    let written = per_site_files(&layout, &[Observable::Msz], 16).expect("per site");
    assert!(written[0].ends_with("PerSite_MSZ.txt"));
    let chi_path = susceptibility_file(&layout, Observable::Msz, "#h").expect("chi");
    let chi = Table::read(&chi_path).expect("read chi");
    assert_relative_eq!(chi.numeric("chi-j=-1.0").expect("chi")[0], 0.25, epsilon = 1e-9);
    let (angle_path, outcome) = angle_file(&layout, Observable::Msz, "#h").expect("angle");
    assert!(angle_path.ends_with("Angle.txt"));
    assert!(outcome.invalid.is_empty());
}

proptest! {
    #[test]
    fn angle_is_defined_on_the_physical_range(m in -0.5f64..=0.5) {
        let table = magnetization_table(vec![0.0], &[("m", vec![m])]);
        let outcome = angle(&table, "#h").expect("angle");
        prop_assert!(outcome.invalid.is_empty());
        let value = outcome.table.numeric("m").expect("angle")[0];
        prop_assert!((0.0..=std::f64::consts::PI).contains(&value));
    }

    #[test]
    fn chi_is_non_negative_for_increasing_field(values in proptest::collection::vec(-1.0f64..1.0, 2..20)) {
        let h: Vec<f64> = (0..values.len()).map(|idx| idx as f64 * 0.1).collect();
        let table = magnetization_table(h, &[("m", values.clone())]);
        let chi = susceptibility(&table, "#h").expect("chi");
        prop_assert_eq!(chi.n_rows(), values.len() - 1);
        prop_assert!(chi.numeric("chi-m").expect("chi").iter().all(|&v| v >= 0.0));
    }
}
