use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when discovering log files
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// I/O error when reading a file or scanning a directory
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from walkdir when scanning the archive directory
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

/// A specialized Result type for registry operations
pub type Result<T> = std::result::Result<T, RepositoryError>;
