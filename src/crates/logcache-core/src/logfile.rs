use crate::entries::Entries;
use crate::key::RecordKey;
use crate::observer::LoadObserver;
use crate::parser::{NagiosParser, RecordParser};
use crate::reader::DEFAULT_MAX_LINE_LENGTH;
use crate::record::Record;
use crate::sink::{Flow, Sink};
use crate::strategy::{LoadStats, Pass, ResumeCursor, Strategy};
use logcache_common::{ClassMask, Seconds};
use logcache_registry::File;
use std::path::Path;
use tracing::{debug, info};

/// The cache of parsed records of one log file.
///
/// Records are loaded lazily, one class at a time, and kept in key order.
/// Whether a load only reads missing classes or also resumes at the end of
/// the previous load depends on whether the file is the active log file,
/// which is fixed when the cache is created.
#[derive(Debug)]
pub struct Logfile<P = NagiosParser> {
    file: File,
    strategy: Strategy,
    entries: Entries,
    parser: P,
    max_line_length: usize,
}

impl Logfile<NagiosParser> {
    pub fn new(file: File) -> Self {
        Self::with_parser(file, NagiosParser)
    }
}

impl<P: RecordParser> Logfile<P> {
    pub fn with_parser(file: File, parser: P) -> Self {
        Self {
            strategy: Strategy::for_active(file.is_active()),
            file,
            entries: Entries::default(),
            parser,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Limit the length of a single line. Longer lines are split.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length.max(1);
        self
    }

    /// Make sure every record of `classes` is cached.
    ///
    /// Each newly cached record is reported to `observer`. Failures to read
    /// the file are logged and leave the cache as it was.
    pub fn load(&mut self, classes: ClassMask, observer: &mut dyn LoadObserver) -> LoadStats {
        self.check_identity(observer);

        let mut pass = Pass {
            path: self.file.path(),
            entries: &mut self.entries,
            parser: &self.parser,
            observer,
            max_line_length: self.max_line_length,
            stats: LoadStats::default(),
        };

        self.strategy.as_dyn().load(&mut pass, classes);
        let stats = pass.stats;

        if stats.passes > 0 {
            debug!(
                "Load of '{}' for {}: {} passes, {} lines, {} invalid, {} new records",
                self.file.path().display(),
                classes,
                stats.passes,
                stats.lines,
                stats.invalid,
                stats.inserted
            );
        }

        stats
    }

    /// Drop the cache if the path now refers to a different file.
    fn check_identity(&mut self, observer: &mut dyn LoadObserver) {
        if !self.file.is_replaced() {
            return;
        }

        let previous = self.file.since();
        let released = self.invalidate_all();
        self.file = self.file.reprobe();

        info!(
            "Logfile '{}' has been replaced (start {} -> {}), dropped {} cached records",
            self.file.path().display(),
            previous,
            self.file.since(),
            released
        );

        if released > 0 {
            observer.records_released(released);
        }
    }

    /// Remove every record of `classes` and forget that they were read.
    pub fn evict_classes(&mut self, classes: ClassMask) -> usize {
        let removed = self.entries.evict(classes);
        if removed > 0 {
            debug!(
                "Evicted {} records of {} from '{}'",
                removed,
                classes,
                self.file.path().display()
            );
        }
        removed
    }

    /// Forget everything, including the resume cursor.
    pub fn invalidate_all(&mut self) -> usize {
        self.strategy.as_dyn().reset();
        self.entries.clear()
    }

    /// Load `classes`, then hand the records of the window `[since, until)`
    /// to `sink` in ascending key order.
    ///
    /// Returns `false` if the sink stopped the scan, `true` if the scan
    /// reached `until` or the end of the file.
    pub fn query_forward(
        &mut self,
        since: Seconds,
        until: Seconds,
        classes: ClassMask,
        sink: &mut dyn Sink,
        observer: &mut dyn LoadObserver,
    ) -> bool {
        self.load(classes, observer);

        for record in self.entries.ascending_from(RecordKey::new(since, 0)) {
            if record.time() >= until {
                return true;
            }
            if !classes.has(record.class()) {
                continue;
            }
            if sink.accept(record) == Flow::Stop {
                return false;
            }
        }

        true
    }

    /// Load `classes`, then hand the records of the window `[since, until)`
    /// to `sink` in descending key order.
    ///
    /// Returns `false` if the sink stopped the scan, `true` if the scan
    /// reached `since` or the start of the file.
    pub fn query_reverse(
        &mut self,
        since: Seconds,
        until: Seconds,
        classes: ClassMask,
        sink: &mut dyn Sink,
        observer: &mut dyn LoadObserver,
    ) -> bool {
        self.load(classes, observer);

        let start = RecordKey::new(until, RecordKey::LINE_MAX);
        for record in self.entries.descending_from(start) {
            if record.time() >= until {
                continue;
            }
            if record.time() < since {
                return true;
            }
            if !classes.has(record.class()) {
                continue;
            }
            if sink.accept(record) == Flow::Stop {
                return false;
            }
        }

        true
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Classes whose records are completely cached
    pub fn classes_read(&self) -> ClassMask {
        self.entries.classes_read()
    }

    /// Nominal start time from the file header
    pub fn since(&self) -> Seconds {
        self.file.since()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn is_active(&self) -> bool {
        self.file.is_active()
    }

    /// Where the next load of a growing file resumes. `None` for sealed files.
    pub fn resume_cursor(&self) -> Option<ResumeCursor> {
        self.strategy.cursor()
    }

    /// The cached records in ascending key order
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &Record> {
        self.entries.iter()
    }
}
