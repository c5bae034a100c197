//! Centralized error types for msgview.

use std::path::PathBuf;
use thiserror::Error;

use crate::i18n;

/// All errors produced by the msgview library.
///
/// `Display` output never carries decoder internals: a hostile file probing
/// the parser only ever learns that it was rejected.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// The input file has zero bytes.
    #[error("File is empty")]
    EmptyInput,

    /// The file extension is neither `.msg` nor `.eml`.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The file exceeds the configured size limit.
    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// The file could not be read.
    #[error("Could not read '{path}': {source}")]
    ReadFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The container decoder failed or produced no usable message.
    #[error("Failed to parse file")]
    ParseFailure,
}

/// Convenience alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    /// Create a `ReadFailure` variant from a path and an `io::Error`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFailure {
            path: path.into(),
            source,
        }
    }

    /// Generic, localized message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => i18n::err_empty_input(),
            Self::UnsupportedType(_) => i18n::err_unsupported_type(),
            Self::FileTooLarge { .. } => i18n::err_file_too_large(),
            Self::ReadFailure { .. } => i18n::err_read_failure(),
            Self::ParseFailure => i18n::err_parse_failure(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_display_is_generic() {
        assert_eq!(ViewerError::ParseFailure.to_string(), "Failed to parse file");
    }

    #[test]
    fn test_read_helper_keeps_path() {
        let err = ViewerError::read(
            "/tmp/a.eml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/a.eml"));
        assert!(matches!(err, ViewerError::ReadFailure { .. }));
    }

    #[test]
    fn test_user_message_never_empty() {
        let errors = [
            ViewerError::EmptyInput,
            ViewerError::UnsupportedType("pdf".into()),
            ViewerError::FileTooLarge { size: 2, limit: 1 },
            ViewerError::ParseFailure,
        ];
        for err in &errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
