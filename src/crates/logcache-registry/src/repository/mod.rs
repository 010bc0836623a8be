//! Log file repository
//!
//! ## Key Components
//!
//! - **File**: A discovered log file with its status, nominal start time and identity
//! - **Status**: Whether the file is the active (growing) log or a sealed archive
//! - **Chain**: The discovered files ordered by nominal start time
//!
//! The nominal start time comes from a fixed 12-byte header at the front of
//! every log file, `[1234567890]`. Files whose header cannot be read still
//! produce a [`File`], with a start time of zero.

pub mod collection;
pub mod error;
pub mod file;

pub use crate::repository::collection::{Chain, scan_archive};
pub use crate::repository::error::RepositoryError;
pub use crate::repository::file::{File, FileIdentity, HEADER_LEN, Status, parse_header};
