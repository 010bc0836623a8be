//! Error types for per-file cache operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a log file into its cache.
///
/// None of these are fatal. A failed load pass leaves the cache as it was and
/// is reported as a diagnostic; the next load simply tries again.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The log file could not be opened
    #[error("Cannot open logfile '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or seeking failed in the middle of a pass
    #[error("I/O error reading logfile '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
