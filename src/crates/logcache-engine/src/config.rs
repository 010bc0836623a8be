use crate::error::{EngineError, Result};
use logcache_core::DEFAULT_MAX_LINE_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_max_cached_messages() -> usize {
    500_000
}

fn default_check_mem_cycle() -> usize {
    1_000
}

fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

/// Configuration of a [`LogTable`](crate::LogTable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The log file the monitoring core is currently writing to
    pub log_file: PathBuf,

    /// Directory holding the rotated log files
    pub archive_path: PathBuf,

    /// Number of cached records above which memory is freed
    #[serde(default = "default_max_cached_messages")]
    pub max_cached_messages: usize,

    /// Minimum growth of the record count between two attempts to free
    /// memory
    #[serde(default = "default_check_mem_cycle")]
    pub check_mem_cycle: usize,

    /// Lines longer than this are split
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Config {
    /// Creates a configuration with default limits.
    pub fn new(log_file: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            archive_path: archive_path.into(),
            max_cached_messages: default_max_cached_messages(),
            check_mem_cycle: default_check_mem_cycle(),
            max_line_length: default_max_line_length(),
        }
    }

    /// Specifies the active log file.
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = log_file.into();
        self
    }

    /// Specifies the archive directory.
    pub fn with_archive_path(mut self, archive_path: impl Into<PathBuf>) -> Self {
        self.archive_path = archive_path.into();
        self
    }

    /// Specifies the number of cached records above which memory is freed.
    pub fn with_max_cached_messages(mut self, max_cached_messages: usize) -> Self {
        self.max_cached_messages = max_cached_messages;
        self
    }

    /// Specifies how much the record count must grow between two attempts to
    /// free memory.
    pub fn with_check_mem_cycle(mut self, check_mem_cycle: usize) -> Self {
        self.check_mem_cycle = check_mem_cycle;
        self
    }

    /// Specifies the maximum line length.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.log_file.as_os_str().is_empty() {
            return Err(EngineError::InvalidConfig(
                "log_file must not be empty".to_string(),
            ));
        }
        if self.max_cached_messages == 0 {
            return Err(EngineError::InvalidConfig(
                "max_cached_messages must be greater than 0".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(EngineError::InvalidConfig(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
