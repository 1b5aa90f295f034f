//! Error types for kg-note.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using kg-note's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for note, graph and search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The document does not have the `---` / metadata / `---` / body shape
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The metadata block is not a valid YAML mapping
    #[error("invalid metadata: {0}")]
    InvalidMetadata(#[from] serde_yaml::Error),

    /// A required field is missing or a value breaks a rule
    #[error("validation failed: {0}")]
    Validation(String),

    /// A note with this id already exists
    #[error("note '{0}' already exists")]
    Conflict(String),

    /// An operation referenced a note that is not in the corpus
    #[error("unknown note: {0}")]
    UnknownNote(String),

    /// The first half of a connect was written, the second was not
    #[error("connection {source_id} -> {target_id} written, but the reverse edge failed: {reason}")]
    PartialConnect {
        source_id: String,
        target_id: String,
        reason: String,
    },

    /// The search index could not be opened or built
    #[error("search index unavailable: {0}")]
    IndexUnavailable(String),

    /// The search query cannot be evaluated
    #[error("invalid query: {0}")]
    Query(String),

    /// A long-running operation observed its cancellation flag
    #[error("operation cancelled")]
    Cancelled,

    /// JSON or CSV export failed
    #[error("export error: {0}")]
    Export(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::Io(e.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Export(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Export(e.to_string())
    }
}

/// An error attached to the file it came from.
///
/// Bulk operations (load, normalize, reconcile, index build) collect these
/// instead of aborting on the first bad note.
#[derive(Debug)]
pub struct FileError {
    pub path: PathBuf,
    pub error: Error,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, error: impl Into<Error>) -> Self {
        Self {
            path: path.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("alpha".to_string());
        assert_eq!(err.to_string(), "note 'alpha' already exists");
    }

    #[test]
    fn test_error_display_unknown_note() {
        let err = Error::UnknownNote("gamma".to_string());
        assert_eq!(err.to_string(), "unknown note: gamma");
    }

    #[test]
    fn test_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Mapping>("a: [1, 2").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(matches!(err, Error::InvalidMetadata(_)));
        assert!(err.to_string().starts_with("invalid metadata:"));
    }

    #[test]
    fn test_file_error_display_names_path() {
        let err = FileError::new("notes/broken.md", Error::MalformedDocument("missing delimiter".into()));
        assert_eq!(
            err.to_string(),
            "notes/broken.md: malformed document: missing delimiter"
        );
    }
}
