use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while selecting or scanning files.
///
/// Per-file failures are never surfaced out of a search; the engine logs
/// them and skips the file. The variants exist so the skip sites can say
/// what happened.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Classifies an IO error against the path it occurred on.
    pub fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(e),
        }
    }
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let path = Path::new("test.txt");
        let err = SearchError::file_not_found(path);
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::permission_denied(path);
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::config_error("missing field");
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_from_io_classification() {
        let path = Path::new("gone.txt");
        let err = SearchError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, SearchError::FileNotFound(_)));

        let err = SearchError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, SearchError::PermissionDenied(_)));

        let err = SearchError::from_io(path, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, SearchError::IoError(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::file_not_found("test.txt");
        assert_eq!(err.to_string(), "File not found: test.txt");

        let err = SearchError::config_error("missing required field");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing required field"
        );
    }
}
