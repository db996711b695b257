//! User-facing error message formatting.
//!
//! Uses typed error matching (DataError, PolarsError variants, io::ErrorKind)
//! rather than string parsing to produce short, actionable messages.

use polars::prelude::PolarsError;
use std::io;

use crate::error::DataError;

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check that the column still exists after renaming.",
            msg
        ),
        PE::Duplicate(msg) => format!("Duplicate column name: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Column types do not match: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::OutOfBounds(msg) => format!("Index or row out of bounds: {}", msg),
        PE::ComputeError(msg) => first_line(msg).to_string(),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => first_line(&err.to_string()).to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => {
            "Permission denied. Check read and write access.".to_string()
        }
        ErrorKind::AlreadyExists => "A file with that name already exists.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Interrupted => "Operation interrupted.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        _ => {
            let msg = err.to_string();
            if msg.contains("No space left") {
                return "No space left on device. Free up disk space and try again.".to_string();
            }
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            msg
        }
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a DataError. Io errors get the friendlier io message.
pub fn user_message_from_data(err: &DataError) -> String {
    match err {
        DataError::Io { path, source } => format!(
            "Cannot access {}: {}",
            path.display(),
            user_message_from_io(source, None)
        ),
        other => other.to_string(),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find DataError, PolarsError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(de) = cause.downcast_ref::<DataError>() {
            return user_message_from_data(de);
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(pe);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err, None);
        }
    }

    // Fallback: first line of display to avoid long tracebacks
    let display = report.to_string();
    first_line(&display).to_string()
}

/// Category of the first DataError in the report chain, `other` when there is none.
pub fn error_kind(report: &color_eyre::eyre::Report) -> &'static str {
    report
        .chain()
        .find_map(|cause| cause.downcast_ref::<DataError>())
        .map_or("other", DataError::kind)
}

fn first_line(msg: &str) -> &str {
    let line = msg.lines().next().map(str::trim).unwrap_or_default();
    if line.is_empty() {
        "An error occurred"
    } else {
        line
    }
}
