//! Log file registry
//!
//! This crate discovers the log files of a monitoring core: the current log
//! file that is still being appended to, and the rotated copies in the archive
//! directory. Each discovered file is probed once for the nominal start time
//! stored in its fixed header, which is what orders the files against each
//! other.
//!
//! ## Usage
//!
//! ```no_run
//! use logcache_registry::Chain;
//! use std::path::Path;
//!
//! let chain = Chain::discover(
//!     Path::new("/var/log/nagios/nagios.log"),
//!     Path::new("/var/log/nagios/archives"),
//! );
//!
//! for file in chain.iter() {
//!     println!("{} starts at {}", file.path().display(), file.since());
//! }
//! ```

pub mod repository;

pub use repository::{
    Chain, File, FileIdentity, HEADER_LEN, RepositoryError, Status, parse_header, scan_archive,
};
