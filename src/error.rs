//! Error kinds surfaced by the conversion pipeline.
//!
//! Every stage returns [`ConversionError`]; the converter folds it into a
//! failed [`crate::convert::ConversionOutcome`] at the single-file boundary.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::identifier::IdentifierKind;

pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    /// Every candidate failed to parse, or the best one produced a degenerate table.
    #[error("CSVLoadError: no candidate dialect produced a usable table ({})", format_attempts(.attempts))]
    NoViableDialect { attempts: Vec<String> },

    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        name: String,
        reason: String,
    },

    #[error("failed to read {path:?}: {message}")]
    ReaderFailure { path: PathBuf, message: String },

    #[error("failed to write {path:?}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fieldless discriminant of [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoViableDialect,
    InvalidIdentifier,
    ReaderFailure,
    WriteFailure,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::NoViableDialect { .. } => ErrorKind::NoViableDialect,
            ConversionError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            ConversionError::ReaderFailure { .. } => ErrorKind::ReaderFailure,
            ConversionError::WriteFailure { .. } => ErrorKind::WriteFailure,
        }
    }

    pub(crate) fn reader(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        ConversionError::ReaderFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConversionError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NoViableDialect => "CSVLoadError",
            ErrorKind::InvalidIdentifier => "InvalidIdentifier",
            ErrorKind::ReaderFailure => "ReaderFailure",
            ErrorKind::WriteFailure => "WriteFailure",
        };
        f.write_str(label)
    }
}

fn format_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        "no candidates attempted".to_string()
    } else {
        attempts.join("; ")
    }
}
