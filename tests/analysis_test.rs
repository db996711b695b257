use datakit::analysis::{self, AnalysisKind, AnalysisSelection};
use datakit::chart_data;
use datakit::chart_export::ChartSpec;
use datakit::config::AnalysisConfig;
use datakit::statistics;
use polars::prelude::*;

mod common;

fn all_analyses() -> AnalysisSelection {
    let mut selection = AnalysisSelection::default();
    for kind in AnalysisKind::ALL {
        selection.set(kind, true);
    }
    selection
}

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_describe_small_dataset() {
    let df = common::small_dataset();
    let table = statistics::describe(&df, &names(&["A", "B"])).unwrap();
    let a = table.get("A").unwrap();
    assert_eq!(a.count, 3);
    let expected = [3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let actual = [a.mean, a.std, a.min, a.q25, a.median, a.q75, a.max];
    for (got, want) in actual.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
    }

    // Nulls are not counted
    let b = table.get("B").unwrap();
    assert_eq!(b.count, 2);
    assert!((b.mean - 3.0).abs() < 1e-9);
}

#[test]
fn test_describe_skips_text_columns() {
    let df = df!("n" => [1, 2, 3], "s" => ["x", "y", "z"]).unwrap();
    let table = statistics::describe(&df, &names(&["n", "s"])).unwrap();
    assert!(table.get("n").is_some());
    assert!(table.get("s").is_none());
}

#[test]
fn test_correlation_matrix_properties() {
    let df = df!(
        "x" => [1.0, 2.0, 3.0, 4.0],
        "y" => [2.0, 4.0, 6.0, 8.0],
        "z" => [4.0, 3.0, 2.0, 1.0],
        "label" => ["a", "b", "c", "d"]
    )
    .unwrap();
    let matrix = statistics::correlation(&df, &names(&["x", "y", "z", "label"]))
        .unwrap()
        .unwrap();
    assert_eq!(matrix.columns, vec!["x", "y", "z"]);
    for i in 0..3 {
        assert!((matrix.get(i, i) - 1.0).abs() < 1e-12);
        for j in 0..3 {
            assert!((matrix.get(i, j) - matrix.get(j, i)).abs() < 1e-12);
        }
    }
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
    assert!((matrix.get(0, 2) + 1.0).abs() < 1e-12);
}

#[test]
fn test_correlation_uses_complete_pairs() {
    let df = common::small_dataset();
    let matrix = statistics::correlation(&df, &names(&["A", "B"]))
        .unwrap()
        .unwrap();
    // Only rows 1 and 2 have both values
    assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
}

#[test]
fn test_missing_values() {
    let df = common::small_dataset();
    let counts = statistics::missing_values(&df, &names(&["A", "B"])).unwrap();
    assert_eq!(
        counts,
        Some(vec![("A".to_string(), 0), ("B".to_string(), 1)])
    );
    assert_eq!(statistics::missing_values(&df, &names(&["A"])).unwrap(), None);
}

#[test]
fn test_full_report() {
    let df = df!(
        "a" => [Some(1.0), Some(2.0), Some(2.5), Some(3.0), None, Some(40.0)],
        "b" => [Some(6.0), Some(5.0), Some(4.0), Some(3.0), Some(2.0), Some(1.0)],
        "c" => ["x", "y", "x", "y", "x", "y"]
    )
    .unwrap();
    let columns = names(&["a", "b", "c"]);
    let report = analysis::run(&df, &columns, &all_analyses(), &AnalysisConfig::default()).unwrap();

    assert_eq!(report.describe.as_ref().map(|d| d.columns.len()), Some(2));
    assert_eq!(report.distributions.len(), 2);
    assert_eq!(report.box_plots.len(), 2);
    assert!(report.correlation.is_some());
    assert_eq!(
        report.missing,
        Some(vec![
            ("a".to_string(), 1),
            ("b".to_string(), 0),
            ("c".to_string(), 0)
        ])
    );
    assert!(report.notes.is_empty());

    let charts = report.charts();
    assert_eq!(charts.len(), 2 + 1 + 1 + 2);
    assert!(matches!(charts[0], ChartSpec::Distribution(_)));
    assert!(matches!(charts[charts.len() - 1], ChartSpec::BoxPlot(_)));
}

#[test]
fn test_report_on_text_only_selection() {
    let df = df!("c" => ["x", "y"]).unwrap();
    let report =
        analysis::run(&df, &names(&["c"]), &all_analyses(), &AnalysisConfig::default()).unwrap();
    assert!(report.describe.as_ref().is_some_and(|d| d.is_empty()));
    assert!(report.distributions.is_empty());
    assert!(report.correlation.is_none());
    assert!(report.missing.is_none());
    assert_eq!(report.notes.len(), 5);
}

#[test]
fn test_box_plot_outliers() {
    let df = common::small_dataset();
    let stats = chart_data::box_plot(&df, "A").unwrap();
    assert_eq!((stats.q1, stats.median, stats.q3), (2.0, 3.0, 4.0));
    assert!(stats.outliers.is_empty());

    let df = df!("v" => [1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    let stats = chart_data::box_plot(&df, "v").unwrap();
    assert_eq!(stats.outliers, vec![100.0]);
    assert_eq!(stats.upper_whisker, 4.0);
}

#[test]
fn test_histogram_counts_every_value() {
    let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
    let bins = chart_data::histogram(&values, 10);
    assert_eq!(bins.len(), 10);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
}
