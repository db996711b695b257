use datakit::analysis::AnalysisKind;
use datakit::config::AnalysisConfig;
use datakit::export::{ExportFormat, ExportOptions};
use datakit::source::{LoadOptions, Separator, TextEncoding};
use datakit::transform::{FillMethod, SampleRequest, SampleSize, SamplingMethod, Treatment};
use datakit::{Command, Mode, Outcome, SessionState};
use tempfile::TempDir;

mod common;

fn loaded() -> SessionState {
    let mut state = SessionState::new();
    let outcome = state
        .apply(Command::Load {
            source: common::source("small.csv", common::SMALL_CSV),
            options: LoadOptions::default(),
        })
        .unwrap();
    match outcome {
        Outcome::Loaded(info) => assert_eq!((info.rows, info.columns), (3, 2)),
        other => panic!("unexpected outcome {:?}", other),
    }
    state
}

#[test]
fn test_failed_load_leaves_state_untouched() {
    let mut state = SessionState::new();
    let err = state.apply(Command::Load {
        source: datakit::source::SourceFile::new("bad.csv", b"a,b\n\xff,1\n".to_vec()),
        options: LoadOptions::new(TextEncoding::Ascii, Separator::Comma),
    });
    assert!(err.is_err());
    assert!(!state.loaded);
    assert!(state.dataset().is_none());
    assert!(state.source_name.is_none());
}

#[test]
fn test_failed_transform_keeps_dataset() {
    let mut state = loaded();
    let before = state.dataset().unwrap().clone();
    let result = state.apply(Command::Sample(SampleRequest::new(
        SamplingMethod::FirstRows,
        SampleSize::Rows(10),
    )));
    assert!(result.is_err());
    assert!(state.dataset().unwrap().equals_missing(&before));

    let result = state.apply(Command::Rename(vec![("A".into(), "B".into())]));
    assert!(result.is_err());
    assert!(state.dataset().unwrap().equals_missing(&before));
}

#[test]
fn test_transform_replaces_dataset_and_selection() {
    let mut state = loaded();
    state
        .apply(Command::SetColumn {
            name: "A".into(),
            selected: false,
        })
        .unwrap();

    let outcome = state
        .apply(Command::Rename(vec![("B".into(), "beta".into())]))
        .unwrap();
    match outcome {
        Outcome::Transformed { treatment, info } => {
            assert_eq!(treatment, Treatment::Renaming);
            assert_eq!(info.column_names, vec!["A", "beta"]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    // Known columns keep their flag, new ones start selected
    assert_eq!(state.columns.is_selected("A"), Some(false));
    assert_eq!(state.columns.is_selected("beta"), Some(true));

    state
        .apply(Command::Fill {
            columns: vec!["beta".into()],
            method: FillMethod::Zero,
        })
        .unwrap();
    let df = state.dataset().unwrap();
    assert_eq!(common::i64_values(df, "beta"), vec![Some(2), Some(4), Some(0)]);
}

#[test]
fn test_analyses_follow_selection() {
    let mut state = loaded();
    state
        .apply(Command::SetAnalysis {
            kind: AnalysisKind::MissingValues,
            enabled: true,
        })
        .unwrap();
    state
        .apply(Command::SetColumn {
            name: "A".into(),
            selected: false,
        })
        .unwrap();
    let outcome = state
        .apply(Command::RunAnalyses(AnalysisConfig::default()))
        .unwrap();
    let Outcome::Report(report) = outcome else {
        panic!("expected a report");
    };
    assert_eq!(report.columns, vec!["B"]);
    assert_eq!(report.missing, Some(vec![("B".to_string(), 1)]));

    state.apply(Command::SetAllColumns(false)).unwrap();
    assert!(state
        .apply(Command::RunAnalyses(AnalysisConfig::default()))
        .is_err());
}

#[test]
fn test_export_then_continue_from_last() {
    let dir = TempDir::new().unwrap();
    let mut state = loaded();
    assert!(state.apply(Command::ContinueFromLastExport).is_err());

    state
        .apply(Command::Sample(SampleRequest::new(
            SamplingMethod::FirstRows,
            SampleSize::Rows(2),
        )))
        .unwrap();
    let path = dir.path().join("small_sampling.csv");
    let options = ExportOptions {
        format: ExportFormat::Csv,
        separator: Separator::Tab,
        encoding: TextEncoding::Utf8Sig,
    };
    let outcome = state
        .apply(Command::Export {
            path: path.clone(),
            options,
        })
        .unwrap();
    assert!(matches!(outcome, Outcome::Exported(ref p) if p == &path));
    assert_eq!(state.last_export.as_deref(), Some(path.as_path()));
    assert_eq!(state.default_output_base(), "small_sampling");

    // Pretend something else happened to the data in between
    state
        .apply(Command::Rename(vec![("A".into(), "x".into())]))
        .unwrap();

    let outcome = state.apply(Command::ContinueFromLastExport).unwrap();
    assert!(matches!(outcome, Outcome::Loaded(ref info) if info.rows == 2));
    let df = state.dataset().unwrap();
    assert_eq!(
        df.get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>(),
        vec!["A", "B"]
    );
    assert_eq!(common::i64_values(df, "A"), vec![Some(1), Some(3)]);
    assert_eq!(state.separator, Some(Separator::Tab));
    assert_eq!(state.encoding, TextEncoding::Utf8Sig);
}

#[test]
fn test_continue_from_xlsx_export_has_no_separator() {
    let dir = TempDir::new().unwrap();
    let mut state = loaded();
    assert_eq!(state.separator, Some(Separator::Comma));

    let path = dir.path().join("small.xlsx");
    let options = ExportOptions {
        format: ExportFormat::Xlsx,
        ..ExportOptions::default()
    };
    state.apply(Command::Export { path, options }).unwrap();
    state.apply(Command::ContinueFromLastExport).unwrap();
    assert_eq!(state.separator, None);
    assert_eq!(state.dataset().unwrap().height(), 3);
}

#[test]
fn test_reset_clears_everything() {
    let mut state = loaded();
    state.apply(Command::SetMode(Mode::Transform)).unwrap();
    state.apply(Command::Reset).unwrap();
    assert!(!state.loaded);
    assert!(state.dataset().is_none());
    assert_eq!(state.mode, Mode::None);
    assert!(state.columns.is_empty());
    assert!(state.last_export.is_none());

    // A new file can be loaded after a reset
    state
        .apply(Command::Load {
            source: common::source("other.csv", "z\n1\n"),
            options: LoadOptions::default(),
        })
        .unwrap();
    assert_eq!(state.source_name.as_deref(), Some("other.csv"));
}
