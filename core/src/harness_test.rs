use std::sync::Arc;

use chrono::NaiveDate;

use crate::case::{BenchmarkCase, Suite};
use crate::config::HarnessConfig;
use crate::dataset::ReferenceDataset;
use crate::error::HarnessError;
use crate::harness::Harness;
use crate::params::{Binding, ParameterSet};
use crate::rt::Runtime;
use crate::weather::{CONCURRENT_CASE, SEQUENTIAL_CASE, Workload, day_parameters, weather_suite};

fn quick_config() -> HarnessConfig {
    HarnessConfig {
        warmup_iterations: 1,
        measured_iterations: 2,
        ..Default::default()
    }
}

fn workload() -> Workload {
    Workload::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

fn fixed(name: &str, values: Vec<u32>) -> BenchmarkCase<Vec<u32>> {
    BenchmarkCase::sequential(name, move |_: &Binding, _: &ReferenceDataset| Ok(values.clone()))
}

#[test]
fn test_weather_grid_end_to_end() {
    let runtime = Runtime::new_multi_thread().unwrap();
    let harness = Harness::new(
        weather_suite(workload()).unwrap(),
        day_parameters(&[3, 7]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        quick_config(),
    )
    .unwrap();

    let report = harness.run(&runtime).unwrap();
    assert_eq!(report.baseline, CONCURRENT_CASE);
    assert_eq!(report.rows.len(), 4);
    assert!(!report.has_exclusions());

    for days in ["NumberOfDays=3", "NumberOfDays=7"] {
        let base = report.row(days, CONCURRENT_CASE).unwrap();
        assert_eq!(base.samples, 2);
        assert_eq!(base.time_ratio, Some(1.0));
        assert!(base.mean_alloc_bytes > 0.0);

        let seq = report.row(days, SEQUENTIAL_CASE).unwrap();
        assert!(seq.time_ratio.is_some());
        assert!(seq.mean_alloc_bytes > 0.0);
    }
}

#[test]
fn test_lookup_failures_exclude_cells_in_both_modes() {
    let runtime = Runtime::new_current_thread().unwrap();
    let harness = Harness::new(
        weather_suite(workload().with_city_ids([1, 3])).unwrap(),
        day_parameters(&[4, 8]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        quick_config(),
    )
    .unwrap();

    let report = harness.run(&runtime).unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.excluded.len(), 4);
    assert!(report.excluded.iter().all(|cell| cell.error.contains("key 3")));
}

#[test]
fn test_single_day_skips_missing_city() {
    // With one day only city 1 is referenced, so the grid point still succeeds.
    let runtime = Runtime::new_current_thread().unwrap();
    let harness = Harness::new(
        weather_suite(workload().with_city_ids([1, 3])).unwrap(),
        day_parameters(&[1, 2]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        quick_config(),
    )
    .unwrap();

    let report = harness.run(&runtime).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert!(report.rows.iter().all(|row| row.binding == "NumberOfDays=1"));
    assert_eq!(report.excluded.len(), 2);
}

#[test]
fn test_divergent_output_is_excluded() {
    let runtime = Runtime::new_current_thread().unwrap();
    let mut suite = Suite::new();
    suite.register(fixed("reference", vec![1, 2, 3]).baseline()).unwrap();
    suite.register(fixed("reversed", vec![3, 2, 1])).unwrap();
    suite.register(fixed("same", vec![1, 2, 3])).unwrap();

    let harness = Harness::new(
        suite,
        ParameterSet::single("N", [1]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        quick_config(),
    )
    .unwrap();
    let report = harness.run(&runtime).unwrap();

    let cases: Vec<&str> = report.rows.iter().map(|row| row.case.as_str()).collect();
    assert_eq!(cases, vec!["reference", "same"]);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].case, "reversed");
    assert!(report.excluded[0].error.starts_with("divergence"));
}

#[test]
fn test_divergence_ignored_when_verification_disabled() {
    let runtime = Runtime::new_current_thread().unwrap();
    let mut suite = Suite::new();
    suite.register(fixed("reference", vec![1]).baseline()).unwrap();
    suite.register(fixed("other", vec![2])).unwrap();

    let config = HarnessConfig {
        verify_outputs: false,
        ..quick_config()
    };
    let harness = Harness::new(
        suite,
        ParameterSet::single("N", [1]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        config,
    )
    .unwrap();
    let report = harness.run(&runtime).unwrap();
    assert_eq!(report.rows.len(), 2);
    assert!(!report.has_exclusions());
}

#[test]
fn test_configuration_errors_fail_before_measuring() {
    let params = || ParameterSet::single("N", [1]).unwrap();
    let dataset = || Arc::new(ReferenceDataset::cities());

    let mut no_baseline = Suite::new();
    no_baseline.register(fixed("a", vec![])).unwrap();
    let err = Harness::new(no_baseline, params(), dataset(), quick_config())
        .err()
        .expect("missing baseline rejected");
    assert!(matches!(err, HarnessError::Configuration(_)));

    let err = Harness::new(Suite::<Vec<u32>>::new(), params(), dataset(), quick_config())
        .err()
        .expect("empty suite rejected");
    assert!(err.to_string().contains("no benchmark cases"));

    let bad_config = HarnessConfig {
        measured_iterations: 0,
        ..Default::default()
    };
    let mut suite = Suite::new();
    suite.register(fixed("a", vec![]).baseline()).unwrap();
    assert!(Harness::new(suite, params(), dataset(), bad_config).is_err());
}

#[test]
fn test_fatal_case_error_aborts_run() {
    let runtime = Runtime::new_current_thread().unwrap();
    let harness = Harness::new(
        weather_suite(workload()).unwrap(),
        ParameterSet::single("Cities", [2]).unwrap(),
        Arc::new(ReferenceDataset::cities()),
        quick_config(),
    )
    .unwrap();
    let err = harness.run(&runtime).unwrap_err();
    assert!(matches!(err, HarnessError::Configuration(_)));
    assert!(err.to_string().contains("NumberOfDays"));
}
