//! Query engine over a rotated monitoring log
//!
//! [`LogTable`] indexes the active log file and its rotated copies by start
//! time and answers [`LogQuery`]s by walking them in time order. Every file
//! keeps its own cache of parsed records, loaded on demand for the classes a
//! query asks for. A single budget bounds the number of records cached across
//! all files.
//!
//! ## Usage
//!
//! ```no_run
//! use logcache_common::ClassMask;
//! use logcache_engine::{Config, Direction, LogQuery, LogTable};
//!
//! let config = Config::new("/var/log/nagios/nagios.log", "/var/log/nagios/archives")
//!     .with_max_cached_messages(100_000);
//! let mut table = LogTable::new(config);
//!
//! let query = LogQuery::new(Direction::Backward)
//!     .with_classes(ClassMask::ALERT)
//!     .with_limit(10);
//!
//! for record in table.collect(&query).unwrap() {
//!     println!("{}", record.message().text);
//! }
//! ```

mod config;
mod error;
mod query;
mod table;

pub use config::Config;
pub use error::{EngineError, Result};
pub use query::{Direction, LimitSink, LogQuery};
pub use table::{LogTable, LogfileStats, TableStats};
