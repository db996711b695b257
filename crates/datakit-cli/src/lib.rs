//! Shared CLI definitions for datakit.
//!
//! Used by the main application, the build script (manpage) and the
//! gen_docs binary (command-line-options markdown). The small enums here are
//! also the vocabulary of the session state, so they derive serde.

use clap::{Arg, CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of file accepted for upload. Detected from the file name.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Delimited text
    Csv,
    /// Excel 2007+ workbook (first sheet)
    Xlsx,
}

impl FileKind {
    /// Detect file kind from a path or file name. None when the extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Field separator for reading and writing delimited text.
#[derive(
    Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// ,
    #[default]
    Comma,
    /// ;
    Semicolon,
    /// Tab character
    Tab,
    /// |
    Pipe,
}

impl Separator {
    pub const ALL: [Self; 4] = [Self::Comma, Self::Semicolon, Self::Tab, Self::Pipe];

    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
            Self::Pipe => b'|',
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_byte() == b)
    }

    /// Short label for selectors. Tab is shown escaped.
    pub fn label(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Tab => "\\t",
            Self::Pipe => "|",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Text encodings offered for reading and writing delimited text.
#[derive(
    Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum TextEncoding {
    #[default]
    #[value(name = "utf-8")]
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-8 with a byte-order mark
    #[value(name = "utf-8-sig")]
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[value(name = "latin-1")]
    #[serde(rename = "latin-1")]
    Latin1,
    #[value(name = "iso-8859-1")]
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
    #[value(name = "windows-1252", alias = "cp1252")]
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
    #[value(name = "ascii")]
    #[serde(rename = "ascii")]
    Ascii,
}

impl TextEncoding {
    pub const ALL: [Self; 6] = [
        Self::Utf8,
        Self::Utf8Sig,
        Self::Latin1,
        Self::Iso8859_1,
        Self::Windows1252,
        Self::Ascii,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Latin1 => "latin-1",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Windows1252 => "windows-1252",
            Self::Ascii => "ascii",
        }
    }

    /// Parse a label, accepting common aliases (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "utf-8-sig" | "utf8-sig" => Some(Self::Utf8Sig),
            "latin-1" | "latin1" => Some(Self::Latin1),
            "iso-8859-1" | "iso8859-1" => Some(Self::Iso8859_1),
            "windows-1252" | "cp1252" => Some(Self::Windows1252),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|e| *e == self).unwrap_or(0)
    }
}

/// Command-line arguments for datakit
#[derive(Clone, Parser, Debug)]
#[command(
    name = "datakit",
    version,
    about = "Data Toolkit: explore and transform CSV and Excel files in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to a .csv or .xlsx file. Opens the upload screen with this file selected.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Separator used to read CSV files (overrides config)
    #[arg(long = "separator", value_enum)]
    pub separator: Option<Separator>,

    /// Text encoding used to read CSV files. By default the encoding is sniffed from the file.
    #[arg(long = "encoding", value_enum)]
    pub encoding: Option<TextEncoding>,

    /// Directory where exported files are written (default: ./output, created on demand)
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for the error log (default: platform data directory)
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug mode: show session details and log every command
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/datakit/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n| format!("<{}>", n.as_str()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| {
            if arg.get_action().takes_values() {
                format!("<{}>", arg.get_id().as_str().to_uppercase())
            } else {
                String::new()
            }
        })
}

/// Render command-line options as a markdown table.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n## Options\n\n| Option | Description |\n|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_str();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder = value_placeholder(arg);
        let option_str = if arg.is_positional() {
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let flags = parts.join(", ");
            if placeholder.is_empty() {
                flags
            } else {
                format!("{flags} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(FileKind::from_path(Path::new("data.csv")), Some(FileKind::Csv));
        assert_eq!(FileKind::from_path(Path::new("DATA.XLSX")), Some(FileKind::Xlsx));
        assert_eq!(FileKind::from_path(Path::new("data.parquet")), None);
        assert_eq!(FileKind::from_path(Path::new("data")), None);
    }

    #[test]
    fn test_separator_bytes() {
        for sep in Separator::ALL {
            assert_eq!(Separator::from_byte(sep.as_byte()), Some(sep));
        }
        assert_eq!(Separator::Tab.label(), "\\t");
        assert_eq!(Separator::from_byte(b'#'), None);
    }

    #[test]
    fn test_encoding_labels() {
        for enc in TextEncoding::ALL {
            assert_eq!(TextEncoding::from_label(enc.label()), Some(enc));
        }
        assert_eq!(
            TextEncoding::from_label("CP1252"),
            Some(TextEncoding::Windows1252)
        );
        assert_eq!(TextEncoding::from_label("shift_jis"), None);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "datakit",
            "sales.csv",
            "--separator",
            "semicolon",
            "--encoding",
            "cp1252",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("sales.csv")));
        assert_eq!(args.separator, Some(Separator::Semicolon));
        assert_eq!(args.encoding, Some(TextEncoding::Windows1252));
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["datakit", "--force"]).is_err());
        assert!(Args::try_parse_from(["datakit", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_render_options_markdown() {
        let md = render_options_markdown();
        assert!(md.contains("`--separator <SEPARATOR>`"));
        assert!(md.contains("`[<PATH>]`"));
    }
}
