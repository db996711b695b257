//! Writing datasets to CSV or xlsx, and naming the output files.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::DataError;
use crate::source::{self, Separator, TextEncoding};
use crate::statistics::is_numeric_type;
use crate::transform::Treatment;

/// Output directory used when none is given. Relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Base name used when there is neither a previous export nor an upload name.
pub const FALLBACK_BASE: &str = "output";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [Self; 2] = [Self::Csv, Self::Xlsx];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "Excel",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// How to write a dataset. Separator and encoding only apply to CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub separator: Separator,
    pub encoding: TextEncoding,
}

/// Write `df` to `path`. No row-index column is written.
pub fn export(df: &DataFrame, path: &Path, options: &ExportOptions) -> Result<()> {
    match options.format {
        ExportFormat::Csv => {
            let bytes = to_csv_bytes(df, options.separator, options.encoding)?;
            std::fs::write(path, bytes).map_err(|e| DataError::io(path, e))?;
        }
        ExportFormat::Xlsx => write_xlsx(df, path)?,
    }
    info!(
        path = %path.display(),
        format = options.format.extension(),
        rows = df.height(),
        "exported dataset"
    );
    Ok(())
}

/// CSV text with a header row, encoded for writing.
pub fn to_csv_bytes(
    df: &DataFrame,
    separator: Separator,
    encoding: TextEncoding,
) -> Result<Vec<u8>> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(separator.as_byte())
        .finish(&mut df)?;
    let text =
        String::from_utf8(buf).map_err(|e| eyre!("CSV writer produced invalid UTF-8: {}", e))?;
    source::encode(&text, encoding)
}

/// Single sheet, header row, no styling. Temporal values are written as text.
fn write_xlsx(df: &DataFrame, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col_idx = u16::try_from(col_idx)
            .map_err(|_| DataError::validation("Too many columns for a spreadsheet"))?;
        sheet.write_string(0, col_idx, column.name().as_str())?;

        let series = column.as_materialized_series();
        let dtype = series.dtype();
        if is_numeric_type(dtype) {
            let values = series.cast(&DataType::Float64)?;
            for (row, v) in values.f64()?.iter().enumerate() {
                if let Some(v) = v.filter(|v| v.is_finite()) {
                    sheet.write_number(sheet_row(row)?, col_idx, v)?;
                }
            }
        } else if dtype == &DataType::Boolean {
            for (row, v) in series.bool()?.iter().enumerate() {
                if let Some(v) = v {
                    sheet.write_boolean(sheet_row(row)?, col_idx, v)?;
                }
            }
        } else {
            let values = series.cast(&DataType::String)?;
            for (row, v) in values.str()?.iter().enumerate() {
                if let Some(v) = v {
                    sheet.write_string(sheet_row(row)?, col_idx, v)?;
                }
            }
        }
    }

    workbook.save(path).map_err(|e| match e {
        XlsxError::IoError(io) => DataError::io(path, io).into(),
        other => color_eyre::Report::new(other),
    })
}

/// Worksheet row for a data row (row 0 is the header).
fn sheet_row(row: usize) -> Result<u32> {
    u32::try_from(row + 1)
        .map_err(|_| DataError::validation("Too many rows for a spreadsheet").into())
}

/// Base for the next output name: the last export's stem, else the upload's stem, else "output".
pub fn default_output_base(last_export: Option<&Path>, source_name: Option<&str>) -> String {
    last_export
        .map(source::file_stem)
        .or_else(|| source_name.map(|n| source::file_stem(Path::new(n))))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE.to_string())
}

/// `<base>_<treatment>`, without extension.
pub fn output_stem(base: &str, treatment: Treatment) -> String {
    format!("{}_{}", base, treatment.suffix())
}

/// `<base>_<treatment>.<ext>`
pub fn output_file_name(base: &str, treatment: Treatment, format: ExportFormat) -> String {
    format!("{}.{}", output_stem(base, treatment), format.extension())
}

/// Append the format's extension unless the name already carries it.
pub fn with_extension(file_name: &str, format: ExportFormat) -> String {
    let name = file_name.trim();
    let has_ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        == Some(format);
    if has_ext {
        name.to_string()
    } else {
        format!("{}.{}", name, format.extension())
    }
}

/// The directory to write into, created if missing. Blank means [`DEFAULT_OUTPUT_DIR`].
pub fn resolve_output_dir(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
    };
    std::fs::create_dir_all(&dir).map_err(|e| DataError::io(&dir, e))?;
    Ok(dir)
}

/// Full path for an export: output dir plus file name with extension.
pub fn output_path(dir: Option<&Path>, file_name: &str, format: ExportFormat) -> Result<PathBuf> {
    if file_name.trim().is_empty() {
        return Err(DataError::validation("Enter a file name").into());
    }
    Ok(resolve_output_dir(dir)?.join(with_extension(file_name, format)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_base() {
        assert_eq!(
            default_output_base(Some(Path::new("output/sales_sampling.csv")), Some("sales.csv")),
            "sales_sampling"
        );
        assert_eq!(default_output_base(None, Some("sales.xlsx")), "sales");
        assert_eq!(default_output_base(None, None), "output");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name("sales", Treatment::Filling, ExportFormat::Xlsx),
            "sales_filling.xlsx"
        );
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("a.csv", ExportFormat::Csv), "a.csv");
        assert_eq!(with_extension("a", ExportFormat::Csv), "a.csv");
        assert_eq!(with_extension("a.csv", ExportFormat::Xlsx), "a.csv.xlsx");
    }

    #[test]
    fn test_csv_bytes_use_separator_and_skip_index() {
        let df = df!("a" => [1i64, 2], "b" => ["x", "y"]).unwrap();
        let bytes = to_csv_bytes(&df, Separator::Semicolon, TextEncoding::Utf8).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a;b\n1;x\n2;y\n");
    }

    #[test]
    fn test_csv_bytes_reject_unencodable_text() {
        let df = df!("name" => ["Zoë", "Łukasz"]).unwrap();
        assert!(to_csv_bytes(&df, Separator::Comma, TextEncoding::Latin1).is_err());
    }
}
