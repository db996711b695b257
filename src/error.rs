//! Error taxonomy for ingestion, transformation and export.
//!
//! These errors travel inside `color_eyre::Report` like any other error and
//! are recovered by `error_display::user_message_from_report` at the action
//! boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Unsupported file format: {0}. Use a .csv or .xlsx file.")]
    UnsupportedFormat(String),

    #[error("Could not decode the file as {encoding}: {detail}")]
    Decode {
        encoding: &'static str,
        detail: String,
    },

    #[error("Could not encode the data as {encoding}: {detail}")]
    Encode {
        encoding: &'static str,
        detail: String,
    },

    #[error("Malformed delimited text: {0}")]
    Parse(String),

    #[error("Not a valid spreadsheet: {0}")]
    Format(String),

    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Renaming would produce duplicate column name '{0}'")]
    DuplicateName(String),
}

impl DataError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category name, used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Parse(_) => "parse",
            Self::Format(_) => "format",
            Self::Io { .. } => "io",
            Self::Validation(_) => "validation",
            Self::DuplicateName(_) => "duplicate_name",
        }
    }
}
