//! Per-file cache of parsed log records
//!
//! A [`Logfile`] holds the records of one log file that have been parsed so
//! far, ordered by [`RecordKey`] (timestamp, then line number). Records are
//! loaded per [`LogClass`](logcache_common::LogClass): a query for alerts only
//! parses alerts, and a later query for notifications reads the file again for
//! those alone.
//!
//! Rotated files are sealed: once a class is cached, they are never read for
//! it again. The active log file keeps growing, so each load first resumes at
//! the position where the previous load stopped.
//!
//! ## Usage
//!
//! ```no_run
//! use logcache_common::{ClassMask, Seconds};
//! use logcache_core::{Flow, Logfile, Record};
//! use logcache_registry::{File, Status};
//!
//! let file = File::probe("/var/log/nagios/nagios.log", Status::Active);
//! let mut logfile = Logfile::new(file);
//!
//! let mut sink = |record: &Record| {
//!     println!("{}", record.message().text);
//!     Flow::Continue
//! };
//! let mut observer = |_: &Record| {};
//!
//! logfile.query_reverse(
//!     Seconds(0),
//!     Seconds::now(),
//!     ClassMask::ALERT | ClassMask::STATE,
//!     &mut sink,
//!     &mut observer,
//! );
//! ```

mod entries;
mod error;
mod key;
mod logfile;
mod observer;
pub mod parser;
mod reader;
mod record;
mod sink;
mod strategy;

pub use error::{CacheError, Result};
pub use key::RecordKey;
pub use logfile::Logfile;
pub use observer::LoadObserver;
pub use parser::{NagiosParser, RecordParser};
pub use reader::DEFAULT_MAX_LINE_LENGTH;
pub use record::{Message, Record};
pub use sink::{Flow, Sink};
pub use strategy::{LoadStats, ResumeCursor};
