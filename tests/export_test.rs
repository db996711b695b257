use datakit::error::DataError;
use datakit::export::{self, ExportFormat, ExportOptions};
use datakit::source::{self, LoadOptions, Separator, TextEncoding};
use datakit::transform::Treatment;
use polars::prelude::*;
use tempfile::TempDir;

mod common;

fn csv_options(separator: Separator, encoding: TextEncoding) -> ExportOptions {
    ExportOptions {
        format: ExportFormat::Csv,
        separator,
        encoding,
    }
}

#[test]
fn test_semicolon_csv_round_trip() {
    let dir = TempDir::new().unwrap();
    let df = common::small_dataset();
    let options = csv_options(Separator::Semicolon, TextEncoding::Utf8);
    let path = export::output_path(Some(dir.path()), "small_sampling", ExportFormat::Csv).unwrap();
    export::export(&df, &path, &options).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("A;B\n1;2\n"));

    let options = LoadOptions::new(TextEncoding::Utf8, Separator::Semicolon);
    let back = source::load_path(&path, &options).unwrap();
    assert_eq!(back.shape(), (3, 2));
    assert_eq!(common::i64_values(&back, "B"), common::i64_values(&df, "B"));
}

#[test]
fn test_latin1_export_writes_single_bytes() {
    let dir = TempDir::new().unwrap();
    let df = df!("city" => ["Montréal"]).unwrap();
    let path = dir.path().join("cities.csv");
    export::export(&df, &path, &csv_options(Separator::Comma, TextEncoding::Latin1)).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.windows(2).any(|w| w == b"r\xe9"));

    let options = LoadOptions::new(TextEncoding::Latin1, Separator::Comma);
    let back = source::load_path(&path, &options).unwrap();
    assert_eq!(common::str_values(&back, "city"), vec![Some("Montréal".into())]);
}

#[test]
fn test_unencodable_text_fails_without_a_file() {
    let dir = TempDir::new().unwrap();
    let df = df!("word" => ["naïve"]).unwrap();
    let path = dir.path().join("ascii.csv");
    let options = csv_options(Separator::Comma, TextEncoding::Ascii);
    let err = export::export(&df, &path, &options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::Encode { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn test_xlsx_round_trip() {
    let dir = TempDir::new().unwrap();
    let df = common::small_dataset();
    let path = dir.path().join("small.xlsx");
    let options = ExportOptions {
        format: ExportFormat::Xlsx,
        ..ExportOptions::default()
    };
    export::export(&df, &path, &options).unwrap();

    let back = source::load_path(&path, &LoadOptions::default()).unwrap();
    assert_eq!(back.shape(), (3, 2));
    assert_eq!(common::i64_values(&back, "A"), vec![Some(1), Some(3), Some(5)]);
    assert_eq!(back.column("B").unwrap().null_count(), 1);
}

#[test]
fn test_output_names() {
    assert_eq!(
        export::output_file_name("sales", Treatment::Filling, ExportFormat::Xlsx),
        "sales_filling.xlsx"
    );
    assert_eq!(export::with_extension("report.csv", ExportFormat::Csv), "report.csv");
    assert_eq!(export::with_extension("report", ExportFormat::Csv), "report.csv");
    assert_eq!(export::with_extension("report.csv", ExportFormat::Xlsx), "report.csv.xlsx");
    assert_eq!(
        export::default_output_base(
            Some(std::path::Path::new("out/sales_sampling.csv")),
            Some("sales.csv")
        ),
        "sales_sampling"
    );
    assert_eq!(export::default_output_base(None, Some("sales.csv")), "sales");
    assert_eq!(export::default_output_base(None, None), export::FALLBACK_BASE);
}

#[test]
fn test_output_path_creates_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let path = export::output_path(Some(&nested), "data", ExportFormat::Csv).unwrap();
    assert!(nested.is_dir());
    assert_eq!(path, nested.join("data.csv"));
    assert!(export::output_path(Some(&nested), "  ", ExportFormat::Csv).is_err());
}
