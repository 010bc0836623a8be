//! Error types for query engine operations

use logcache_common::Seconds;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither the active log file nor any archived file has a valid header
    #[error("No logfile found, not even '{}'", .log_file.display())]
    NoLogfiles { log_file: PathBuf },

    /// The lower bound of a query lies after its upper bound
    #[error("Invalid time range: since {since} is after until {until}")]
    InvalidTimeRange { since: Seconds, until: Seconds },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
