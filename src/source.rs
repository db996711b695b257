//! File ingestion: encoding sniffing, strict decoding and CSV/XLSX parsing.
//!
//! Everything here works on an in-memory byte buffer so that the same code
//! serves the upload screen, the preview and the "continue from last export"
//! path. Nothing in this module touches session state.

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use color_eyre::Result;
use encoding_rs::{UTF_8, WINDOWS_1252};
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DataError;

pub use datakit_cli::{FileKind, Separator, TextEncoding};

/// Bytes inspected when guessing the encoding of an upload.
pub const SNIFF_PREFIX_LEN: usize = 1024;

/// Rows parsed by [`preview`].
pub const PREVIEW_ROWS: usize = 5;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An uploaded file: its name and raw contents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk. The name is the path's file name.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| DataError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(path = %path.display(), bytes = bytes.len(), "read source file");
        Ok(Self { name, bytes })
    }

    /// File kind from the name's extension.
    pub fn kind(&self) -> Result<FileKind> {
        Ok(FileKind::from_path(Path::new(&self.name))
            .ok_or_else(|| DataError::UnsupportedFormat(self.name.clone()))?)
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        file_stem(Path::new(&self.name))
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Options for parsing delimited text. Ignored for spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub encoding: TextEncoding,
    pub separator: Separator,
    /// Rows scanned to infer column types. None scans everything.
    pub infer_schema_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            separator: Separator::Comma,
            infer_schema_length: None,
        }
    }
}

impl LoadOptions {
    pub fn new(encoding: TextEncoding, separator: Separator) -> Self {
        Self {
            encoding,
            separator,
            ..Self::default()
        }
    }
}

/// Guess the encoding of a byte stream from its first [`SNIFF_PREFIX_LEN`] bytes.
///
/// The result is always one of the offered encodings; guesses outside that
/// list fall back to utf-8. Advisory only.
pub fn sniff_encoding(bytes: &[u8]) -> TextEncoding {
    let prefix = &bytes[..bytes.len().min(SNIFF_PREFIX_LEN)];
    if prefix.starts_with(UTF8_BOM) {
        return TextEncoding::Utf8Sig;
    }
    if is_utf8_prefix(prefix) {
        return TextEncoding::Utf8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(prefix, prefix.len() == bytes.len());
    let guess = detector.guess(None, true);
    debug!(guess = guess.name(), "sniffed encoding");
    if guess == WINDOWS_1252 {
        TextEncoding::Windows1252
    } else {
        TextEncoding::Utf8
    }
}

/// Valid UTF-8, allowing the prefix cut to split the last multi-byte character.
fn is_utf8_prefix(prefix: &[u8]) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Decode bytes under `encoding`, failing on any byte sequence it cannot represent.
///
/// A leading UTF-8 byte-order mark is dropped for utf-8 and utf-8-sig.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    let decoded: Option<Cow<'_, str>> = match encoding {
        TextEncoding::Utf8 | TextEncoding::Utf8Sig => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            UTF_8.decode_without_bom_handling_and_without_replacement(body)
        }
        TextEncoding::Windows1252 => {
            WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
        }
        TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
            Some(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
        }
        TextEncoding::Ascii => bytes
            .is_ascii()
            .then(|| Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
    };

    decoded.map(Cow::into_owned).ok_or_else(|| {
        DataError::Decode {
            encoding: encoding.label(),
            detail: invalid_position(bytes, encoding),
        }
        .into()
    })
}

fn invalid_position(bytes: &[u8], encoding: TextEncoding) -> String {
    let position = match encoding {
        TextEncoding::Ascii => bytes.iter().position(|b| !b.is_ascii()),
        TextEncoding::Utf8 | TextEncoding::Utf8Sig => {
            std::str::from_utf8(bytes).err().map(|e| e.valid_up_to())
        }
        _ => None,
    };
    match position {
        Some(pos) => format!(
            "invalid byte 0x{:02x} at position {}. Try another encoding.",
            bytes[pos], pos
        ),
        None => "invalid byte sequence. Try another encoding.".to_string(),
    }
}

/// Encode text for writing. Characters the encoding cannot represent are an error.
pub fn encode(text: &str, encoding: TextEncoding) -> Result<Vec<u8>> {
    let unrepresentable = |c: char| DataError::Encode {
        encoding: encoding.label(),
        detail: format!("character '{}' cannot be represented", c),
    };

    let bytes = match encoding {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Utf8Sig => {
            let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
            out.extend_from_slice(UTF8_BOM);
            out.extend_from_slice(text.as_bytes());
            out
        }
        TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
            let mut out = Vec::with_capacity(text.len());
            for c in text.chars() {
                let b = u8::try_from(u32::from(c)).map_err(|_| unrepresentable(c))?;
                out.push(b);
            }
            out
        }
        TextEncoding::Ascii => {
            if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
                return Err(unrepresentable(c).into());
            }
            text.as_bytes().to_vec()
        }
        TextEncoding::Windows1252 => {
            let (out, _, had_errors) = WINDOWS_1252.encode(text);
            if had_errors {
                let bad = text
                    .chars()
                    .find(|c| WINDOWS_1252.encode(&c.to_string()).2)
                    .unwrap_or('?');
                return Err(unrepresentable(bad).into());
            }
            out.into_owned()
        }
    };
    Ok(bytes)
}

/// Parse a source file into a dataset.
pub fn load(source: &SourceFile, options: &LoadOptions) -> Result<DataFrame> {
    let df = load_bytes(&source.bytes, source.kind()?, options, None)?;
    info!(
        file = %source.name,
        rows = df.height(),
        columns = df.width(),
        "loaded dataset"
    );
    Ok(df)
}

/// Parse only the first [`PREVIEW_ROWS`] rows. Same decoding rules as [`load`].
pub fn preview(source: &SourceFile, options: &LoadOptions) -> Result<DataFrame> {
    load_bytes(&source.bytes, source.kind()?, options, Some(PREVIEW_ROWS))
}

/// Read a previously exported file back, using the given options for CSV.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    load(&SourceFile::read(path)?, options)
}

pub fn load_bytes(
    bytes: &[u8],
    kind: FileKind,
    options: &LoadOptions,
    n_rows: Option<usize>,
) -> Result<DataFrame> {
    match kind {
        FileKind::Csv => read_csv(bytes, options, n_rows),
        FileKind::Xlsx => read_xlsx(bytes, n_rows),
    }
}

fn read_csv(bytes: &[u8], options: &LoadOptions, n_rows: Option<usize>) -> Result<DataFrame> {
    let text = decode(bytes, options.encoding)?;
    let separator = options.separator.as_byte();

    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(n_rows)
        .with_infer_schema_length(options.infer_schema_length)
        .map_parse_options(|opts| opts.with_separator(separator));

    let df = CsvReader::new(Cursor::new(text.into_bytes()))
        .with_options(read_options)
        .finish()
        .map_err(|e| DataError::Parse(first_line(&e.to_string())))?;
    Ok(df)
}

fn first_line(msg: &str) -> String {
    msg.lines().next().unwrap_or_default().trim().to_string()
}

/// Column type inferred from spreadsheet cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Utf8,
    Int64,
    Float64,
    Boolean,
    Date,
    Datetime,
}

/// Read the first worksheet of an xlsx workbook. Row 0 holds the headers.
fn read_xlsx(bytes: &[u8], n_rows: Option<usize>) -> Result<DataFrame> {
    let to_format_error = |e: calamine::XlsxError| DataError::Format(e.to_string());

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(to_format_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::Format("workbook has no worksheets".to_string()))?
        .map_err(to_format_error)?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.take(n_rows.unwrap_or(usize::MAX)).collect();

    let mut columns = Vec::with_capacity(header_row.len());
    for (col_idx, header) in header_row.iter().enumerate() {
        let name = match calamine::DataType::as_string(header) {
            Some(s) if !s.trim().is_empty() => s,
            _ => format!("column_{}", col_idx + 1),
        };
        let cells: Vec<Option<&Data>> = body
            .iter()
            .map(|row| row.get(col_idx).filter(|c| !matches!(c, Data::Empty)))
            .collect();
        let series = cells_to_series(&name, &cells, infer_cell_type(&cells))?;
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Whole-number floats become Int64; date cells become Date when every one is at midnight.
fn infer_cell_type(cells: &[Option<&Data>]) -> CellType {
    use calamine::DataType as _;

    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if cell.is_string() {
            let all_dates = cells
                .iter()
                .flatten()
                .all(|c| cell_to_datetime(c).is_some());
            return match all_dates {
                true if all_midnight(cells) => CellType::Date,
                true => CellType::Datetime,
                false => CellType::Utf8,
            };
        }
        has_float |= cell.is_float();
        has_int |= cell.is_int();
        has_bool |= cell.is_bool();
        has_datetime |= cell.is_datetime() || cell.is_datetime_iso();
    }

    if has_bool && (has_float || has_int || has_datetime) {
        CellType::Utf8
    } else if has_datetime {
        if all_midnight(cells) {
            CellType::Date
        } else {
            CellType::Datetime
        }
    } else if has_float {
        let all_whole = cells.iter().flatten().all(|cell| {
            cell.as_f64()
                .is_none_or(|f| f.is_finite() && f.fract().abs() < 1e-10)
        });
        if all_whole {
            CellType::Int64
        } else {
            CellType::Float64
        }
    } else if has_int {
        CellType::Int64
    } else if has_bool {
        CellType::Boolean
    } else {
        CellType::Utf8
    }
}

fn all_midnight(cells: &[Option<&Data>]) -> bool {
    cells
        .iter()
        .flatten()
        .filter_map(|c| cell_to_datetime(c))
        .all(|dt| dt.time() == NaiveTime::MIN)
}

fn cell_to_datetime(cell: &Data) -> Option<NaiveDateTime> {
    use calamine::DataType as _;

    if let Some(dt) = cell.as_datetime() {
        return Some(dt);
    }
    let s = cell.get_datetime_iso().or_else(|| cell.get_string())?.trim();
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn cells_to_series(name: &str, cells: &[Option<&Data>], cell_type: CellType) -> Result<Series> {
    use calamine::DataType as _;
    use polars::datatypes::TimeUnit;

    let series = match cell_type {
        CellType::Int64 => {
            let v: Vec<Option<i64>> = cells.iter().map(|c| c.and_then(|c| c.as_i64())).collect();
            Series::new(name.into(), v)
        }
        CellType::Float64 => {
            let v: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(|c| c.as_f64())).collect();
            Series::new(name.into(), v)
        }
        CellType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|c| c.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.map(|c| c.as_string().unwrap_or_else(|| c.to_string())))
                .collect();
            Series::new(name.into(), v)
        }
        CellType::Date => {
            let epoch = NaiveDate::default();
            let v: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|c| cell_to_datetime(c))
                        .map(|dt| (dt.date() - epoch).num_days() as i32)
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Date)?
        }
        CellType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(|c| cell_to_datetime(c))
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}

/// Resolve a user-typed path: `~/` expands to the home directory.
pub fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    match trimmed.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(trimmed)),
        None => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> SourceFile {
        SourceFile::new("data.csv", text.as_bytes().to_vec())
    }

    #[test]
    fn test_sniff_utf8_and_bom() {
        assert_eq!(sniff_encoding(b"a,b\n1,2\n"), TextEncoding::Utf8);
        assert_eq!(
            sniff_encoding(b"\xEF\xBB\xBFa,b\n1,2\n"),
            TextEncoding::Utf8Sig
        );
    }

    #[test]
    fn test_sniff_truncated_multibyte_is_utf8() {
        let mut bytes = "a".repeat(SNIFF_PREFIX_LEN - 1).into_bytes();
        bytes.extend_from_slice("é".as_bytes());
        assert_eq!(sniff_encoding(&bytes), TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_ascii_rejects_high_bytes() {
        let err = decode(b"caf\xe9", TextEncoding::Ascii).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::Decode { .. }));
        assert!(data_err.to_string().contains("position 3"));
    }

    #[test]
    fn test_decode_latin1_maps_bytes() {
        assert_eq!(decode(b"caf\xe9", TextEncoding::Latin1).unwrap(), "café");
        assert!(decode(b"caf\xe9", TextEncoding::Utf8).is_err());
    }

    #[test]
    fn test_encode_rejects_unrepresentable() {
        assert!(encode("naïve", TextEncoding::Ascii).is_err());
        assert_eq!(encode("café", TextEncoding::Latin1).unwrap(), b"caf\xe9");
        assert!(encode("€", TextEncoding::Latin1).is_err());
        assert_eq!(encode("€", TextEncoding::Windows1252).unwrap(), b"\x80");
        assert!(encode("日本", TextEncoding::Windows1252).is_err());
    }

    #[test]
    fn test_encode_utf8_sig_writes_bom() {
        let bytes = encode("a", TextEncoding::Utf8Sig).unwrap();
        assert_eq!(bytes, b"\xEF\xBB\xBFa");
        assert_eq!(decode(&bytes, TextEncoding::Utf8Sig).unwrap(), "a");
    }

    #[test]
    fn test_preview_limits_rows() {
        let body: String = (0..20).map(|i| format!("{i},{}\n", i * 2)).collect();
        let source = csv(&format!("x,y\n{body}"));
        let df = preview(&source, &LoadOptions::default()).unwrap();
        assert_eq!(df.height(), PREVIEW_ROWS);
        assert_eq!(load(&source, &LoadOptions::default()).unwrap().height(), 20);
    }

    #[test]
    fn test_unsupported_extension() {
        let source = SourceFile::new("data.json", b"{}".to_vec());
        let err = load(&source, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let source = csv("a,b\n1,2\n3,4,5\n");
        let err = load(&source, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_xlsx_is_format_error() {
        let source = SourceFile::new("book.xlsx", b"not a zip".to_vec());
        let err = load(&source, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::Format(_))
        ));
    }

    #[test]
    fn test_source_stem() {
        assert_eq!(csv("a\n1\n").stem(), "data");
    }
}
