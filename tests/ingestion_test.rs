use datakit::error::DataError;
use datakit::source::{self, FileKind, LoadOptions, Separator, SourceFile, TextEncoding};
use datakit::statistics;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

mod common;

#[test]
fn test_small_csv_shape_and_missing() {
    let df = common::small_dataset();
    let info = statistics::basic_info(&df);
    assert_eq!((info.rows, info.columns), (3, 2));
    assert_eq!(info.column_names, vec!["A", "B"]);
    assert_eq!(info.missing_for("A"), Some(0));
    assert_eq!(info.missing_for("B"), Some(1));
}

#[test]
fn test_semicolon_separator() {
    let src = common::source("semi.csv", "x;y\n1;a\n2;b\n");
    let options = LoadOptions::new(TextEncoding::Utf8, Separator::Semicolon);
    let df = source::load(&src, &options).unwrap();
    assert_eq!(df.shape(), (2, 2));
    assert_eq!(common::str_values(&df, "y"), vec![Some("a".into()), Some("b".into())]);

    // Wrong separator still parses, as a single column
    let df = source::load(&src, &LoadOptions::default()).unwrap();
    assert_eq!(df.width(), 1);
}

#[test]
fn test_latin1_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = common::write_file(dir.path(), "people.csv", b"name,city\nJos\xe9,Montr\xe9al\n");
    let file = SourceFile::read(&path).unwrap();
    assert_eq!(file.name, "people.csv");
    assert_eq!(file.kind().unwrap(), FileKind::Csv);

    let err = source::load(&file, &LoadOptions::default()).unwrap_err();
    match err.downcast_ref::<DataError>() {
        Some(DataError::Decode { encoding, .. }) => assert_eq!(*encoding, "utf-8"),
        other => panic!("expected a decode error, got {:?}", other),
    }

    let options = LoadOptions::new(TextEncoding::Latin1, Separator::Comma);
    let df = source::load(&file, &options).unwrap();
    assert_eq!(common::str_values(&df, "name"), vec![Some("José".into())]);
    assert_eq!(common::str_values(&df, "city"), vec![Some("Montréal".into())]);
}

#[test]
fn test_sniffing_western_text() {
    let mut bytes = b"nom,ville,remarque\n".to_vec();
    for _ in 0..20 {
        bytes.extend_from_slice(b"Fran\xe7ois,Qu\xe9bec,");
        bytes.extend_from_slice(b"tr\xe8s \xe9l\xe9gant et d\xe9j\xe0 pr\xeat\n");
    }
    assert_eq!(source::sniff_encoding(&bytes), TextEncoding::Windows1252);

    let df = source::load(
        &SourceFile::new("fr.csv", bytes),
        &LoadOptions::new(TextEncoding::Windows1252, Separator::Comma),
    )
    .unwrap();
    assert_eq!(df.height(), 20);
}

#[test]
fn test_sniffing_only_reads_the_prefix() {
    let mut bytes = vec![b'a'; source::SNIFF_PREFIX_LEN];
    bytes.extend_from_slice(b"\xe9\xe9\xe9");
    assert_eq!(source::sniff_encoding(&bytes), TextEncoding::Utf8);
    assert_eq!(source::sniff_encoding(b"\xEF\xBB\xBFa,b\n"), TextEncoding::Utf8Sig);
}

#[test]
fn test_bom_header_is_clean() {
    let src = SourceFile::new("bom.csv", b"\xEF\xBB\xBFid,v\n1,2\n".to_vec());
    let options = LoadOptions::new(TextEncoding::Utf8Sig, Separator::Comma);
    let df = source::load(&src, &options).unwrap();
    assert_eq!(df.get_column_names()[0].as_str(), "id");
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let src = common::source("data.json", "{}");
    let err = source::load(&src, &LoadOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_xlsx_first_sheet() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "name").unwrap();
    sheet.write_string(0, 1, "score").unwrap();
    sheet.write_string(0, 2, "ratio").unwrap();
    for (i, (name, score, ratio)) in [("ann", 3.0, 0.5), ("bob", 4.0, 1.25)].iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *name).unwrap();
        sheet.write_number(row, 1, *score).unwrap();
        sheet.write_number(row, 2, *ratio).unwrap();
    }
    workbook.add_worksheet().write_string(0, 0, "ignored").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let src = SourceFile::new("scores.xlsx", bytes);
    assert_eq!(src.kind().unwrap(), FileKind::Xlsx);
    // Text options do not apply to spreadsheets
    let options = LoadOptions::new(TextEncoding::Ascii, Separator::Tab);
    let df = source::load(&src, &options).unwrap();
    assert_eq!(df.shape(), (2, 3));
    assert_eq!(common::i64_values(&df, "score"), vec![Some(3), Some(4)]);
    let info = statistics::basic_info(&df);
    assert_eq!(info.dtypes[2], statistics::dtype_name(&polars::prelude::DataType::Float64));

    let preview = source::preview(&src, &options).unwrap();
    assert_eq!(preview.height(), 2);
}

#[test]
fn test_preview_does_not_read_everything() {
    let mut text = String::from("n\n");
    for i in 0..50 {
        text.push_str(&format!("{}\n", i));
    }
    let src = common::source("many.csv", &text);
    let preview = source::preview(&src, &LoadOptions::default()).unwrap();
    assert_eq!(preview.height(), source::PREVIEW_ROWS);
    let full = source::load(&src, &LoadOptions::default()).unwrap();
    assert_eq!(full.height(), 50);
}
