//! User-facing error message formatting.
//!
//! Uses typed error matching (PolarsError variants, io::ErrorKind, LoadError)
//! rather than string parsing to produce short, actionable messages.

use crate::error::LoadError;
use polars::prelude::PolarsError;
use std::io;

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check spelling and that the column exists.",
            msg
        ),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::ComputeError(msg) => msg.to_string(),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            msg
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a load failure for the session-ending error line.
pub fn user_message_from_load(err: &LoadError) -> String {
    match err {
        LoadError::Io { path, source } => {
            format!("{} ({})", user_message_from_io(source, None), path.display())
        }
        LoadError::Csv(e) => format!("Not a valid CSV file. {}", user_message_from_polars(e)),
        other => other.to_string(),
    }
}

/// Walk a report's cause chain and return the most specific user-facing message.
pub fn user_message(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(load) = cause.downcast_ref::<LoadError>() {
            return user_message_from_load(load);
        }
        if let Some(polars) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(polars);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err, None);
        }
    }
    let message = report
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ");
    if message.is_empty() {
        "An error occurred".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn io_not_found_message() {
        let err = io::Error::new(io::ErrorKind::NotFound, "nope");
        assert_eq!(user_message_from_io(&err, None), "File or directory not found.");
        assert_eq!(
            user_message_from_io(&err, Some("(data.xlsx)")),
            "File or directory not found. (data.xlsx)"
        );
    }

    #[test]
    fn load_error_mentions_path() {
        let err = LoadError::Io {
            path: PathBuf::from("missing.xlsx"),
            source: io::Error::new(io::ErrorKind::NotFound, "nope"),
        };
        let msg = user_message_from_load(&err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("missing.xlsx"));
    }

    #[test]
    fn report_chain_finds_load_error() {
        let err = LoadError::UnsupportedFormat("parquet".to_string());
        let report = color_eyre::eyre::Report::new(err).wrap_err("loading table");
        assert!(user_message(&report).contains("unsupported file type"));
    }

    #[test]
    fn other_reports_keep_their_causes() {
        let err = crate::error::FilterError::UnknownColumn("Regoin".to_string());
        let report = color_eyre::eyre::Report::new(err).wrap_err("invalid filter selection");
        assert_eq!(
            user_message(&report),
            "invalid filter selection: unknown column: Regoin"
        );
    }
}
