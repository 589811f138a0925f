use std::path::PathBuf;

/// Errors that can occur when creating or running a logger.
///
/// Only [`ThrowlerError::InvalidDirectory`], [`ThrowlerError::DirectoryNotFound`]
/// and [`ThrowlerError::CreateDirectoryFailed`] ever reach the caller of
/// [`crate::create_logger`]. Everything raised while writing an entry is
/// reported on the `tracing` channel and never returned.
#[derive(Debug, thiserror::Error)]
pub enum ThrowlerError {
    #[error("Directory '{0}' is a file")]
    InvalidDirectory(PathBuf),
    #[error("There is no such directory or parent directory '{0}'")]
    DirectoryNotFound(PathBuf),
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("File IO error: {0}")]
    FileIOError(#[from] std::io::Error),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Failed to start the log writer thread: {0}")]
    WorkerUnavailable(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ThrowlerError {
    /// Name of the error kind, e.g. `"InvalidDirectory"`.
    pub fn kind(&self) -> &'static str {
        match self {
            ThrowlerError::InvalidDirectory(_) => "InvalidDirectory",
            ThrowlerError::DirectoryNotFound(_) => "DirectoryNotFound",
            ThrowlerError::CreateDirectoryFailed(..) => "CreateDirectoryFailed",
            ThrowlerError::CreateFileFailed(..) => "CreateFileFailed",
            ThrowlerError::FileIOError(_) => "FileIOError",
            ThrowlerError::InvalidOptions(_) => "InvalidOptions",
            ThrowlerError::WorkerUnavailable(_) => "WorkerUnavailable",
            ThrowlerError::InternalError(_) => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_directory_conflicts() {
        assert_eq!(ThrowlerError::InvalidDirectory(PathBuf::from("a")).kind(), "InvalidDirectory");
        assert_eq!(ThrowlerError::DirectoryNotFound(PathBuf::from("a/b")).kind(), "DirectoryNotFound");
    }

    #[test]
    fn io_errors_convert() {
        let err: ThrowlerError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.kind(), "FileIOError");
        assert_eq!(err.to_string(), "File IO error: disk full");
    }
}
