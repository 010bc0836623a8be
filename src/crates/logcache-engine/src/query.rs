//! Query parameters and result collection.

use crate::error::{EngineError, Result};
use logcache_common::{ClassMask, Seconds};
use logcache_core::{Flow, Record, Sink};

/// Order in which records are handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Oldest record first
    Forward,
    /// Newest record first
    #[default]
    Backward,
}

/// Builder for the parameters of a log query.
///
/// The time window is half-open: records with `since <= time < until` are
/// visited. Without further configuration a query covers all classes and
/// everything up to and including the current second, newest first.
///
/// # Example
///
/// ```
/// use logcache_common::{ClassMask, Seconds};
/// use logcache_engine::{Direction, LogQuery};
///
/// let query = LogQuery::new(Direction::Backward)
///     .with_since(Seconds(1000000000))
///     .with_classes(ClassMask::ALERT | ClassMask::STATE)
///     .with_limit(100);
/// assert_eq!(query.limit(), Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    since: Seconds,
    until: Seconds,
    classes: ClassMask,
    limit: Option<usize>,
    direction: Direction,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self::new(Direction::default())
    }
}

impl LogQuery {
    pub fn new(direction: Direction) -> Self {
        Self {
            since: Seconds::ZERO,
            until: Seconds::now().saturating_add(Seconds(1)),
            classes: ClassMask::all(),
            limit: None,
            direction,
        }
    }

    /// Set the lower time boundary (inclusive).
    pub fn with_since(mut self, since: Seconds) -> Self {
        self.since = since;
        self
    }

    /// Set the upper time boundary (exclusive).
    pub fn with_until(mut self, until: Seconds) -> Self {
        self.until = until;
        self
    }

    /// Restrict the query to the given classes. An empty mask matches nothing.
    pub fn with_classes(mut self, classes: ClassMask) -> Self {
        self.classes = classes;
        self
    }

    /// Set the maximum number of records to retrieve.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn since(&self) -> Seconds {
        self.since
    }

    pub fn until(&self) -> Seconds {
        self.until
    }

    pub fn classes(&self) -> ClassMask {
        self.classes
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the query cannot match anything, without looking at any file.
    pub fn matches_nothing(&self) -> bool {
        self.classes.is_empty() || self.since >= self.until || self.limit == Some(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.since > self.until {
            return Err(EngineError::InvalidTimeRange {
                since: self.since,
                until: self.until,
            });
        }
        Ok(())
    }
}

/// A sink that keeps clones of the records it accepts, up to a limit.
#[derive(Debug, Default)]
pub struct LimitSink {
    records: Vec<Record>,
    limit: Option<usize>,
}

impl LimitSink {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.records.len() >= limit)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl Sink for LimitSink {
    fn accept(&mut self, record: &Record) -> Flow {
        if self.is_full() {
            return Flow::Stop;
        }

        self.records.push(record.clone());

        if self.is_full() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}
