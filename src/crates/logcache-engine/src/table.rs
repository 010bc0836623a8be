//! The table of all log files and the memory budget shared by their caches.

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::query::{Direction, LimitSink, LogQuery};
use logcache_common::{ClassMask, LogClass, Seconds};
use logcache_core::{LoadObserver, Logfile, NagiosParser, Record, RecordParser, Sink};
use logcache_registry::{Chain, File, Status};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::PathBuf;
use tracing::{debug, info, warn};

type Logfiles<P> = BTreeMap<Seconds, Logfile<P>>;

/// Count of cached records across all files.
#[derive(Debug, Default)]
struct Budget {
    cached: usize,
    at_last_check: usize,
    max: usize,
    cycle: usize,
}

impl Budget {
    fn new(config: &Config) -> Self {
        Self {
            cached: 0,
            at_last_check: 0,
            max: config.max_cached_messages,
            cycle: config.check_mem_cycle,
        }
    }

    fn is_over(&self) -> bool {
        self.cached > self.max
    }

    fn release(&mut self, count: usize) {
        self.cached = self.cached.saturating_sub(count);
    }

    fn reset(&mut self) {
        self.cached = 0;
        self.at_last_check = 0;
    }

    /// Account for one new record. Returns `true` if memory should be freed.
    fn grow(&mut self) -> bool {
        self.cached += 1;

        if !self.is_over() {
            return false;
        }

        // Freeing scans every file. Skip it until the count has grown enough
        // since the last attempt, which may have been unable to free anything.
        self.cached >= self.at_last_check.saturating_add(self.cycle)
    }

    /// Free memory in the files around the one being loaded (`current`,
    /// which is not part of `others`) until the budget is met.
    ///
    /// 1. Flush files older than the current one, oldest first.
    /// 2. Evict the classes the query does not need from newer files.
    /// 3. Flush newer files, oldest first.
    fn free<P: RecordParser>(
        &mut self,
        others: &mut Logfiles<P>,
        current: Seconds,
        needed: ClassMask,
    ) {
        for logfile in others.range_mut(..current).map(|(_, l)| l) {
            if logfile.is_empty() {
                continue;
            }
            let freed = logfile.invalidate_all();
            debug!("Flushed {} records of '{}'", freed, logfile.path().display());
            if self.settle(freed) {
                return;
            }
        }

        let newer = (Bound::Excluded(current), Bound::Unbounded);

        for logfile in others.range_mut(newer).map(|(_, l)| l) {
            if logfile.is_empty() || (logfile.classes_read() & !needed).is_empty() {
                continue;
            }
            let freed = logfile.evict_classes(!needed);
            if self.settle(freed) {
                return;
            }
        }

        for logfile in others.range_mut(newer).map(|(_, l)| l) {
            if logfile.is_empty() {
                continue;
            }
            let freed = logfile.invalidate_all();
            debug!("Flushed {} records of '{}'", freed, logfile.path().display());
            if self.settle(freed) {
                return;
            }
        }

        self.at_last_check = self.cached;
        debug!(
            "Cannot unload more records, still {} cached (max is {})",
            self.cached, self.max
        );
    }

    /// Release `freed` records. Returns `true` once the budget is met.
    fn settle(&mut self, freed: usize) -> bool {
        self.release(freed);
        if self.is_over() {
            return false;
        }
        self.at_last_check = self.cached;
        true
    }
}

/// Observer handed to the file being loaded. Frees memory in the other files.
struct BudgetObserver<'a, P> {
    budget: &'a mut Budget,
    others: &'a mut Logfiles<P>,
    current: Seconds,
    needed: ClassMask,
}

impl<P: RecordParser> LoadObserver for BudgetObserver<'_, P> {
    fn record_cached(&mut self, _record: &Record) {
        if self.budget.grow() {
            self.budget.free(self.others, self.current, self.needed);
        }
    }

    fn records_released(&mut self, count: usize) {
        self.budget.release(count);
    }
}

/// Per-file entry of [`TableStats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogfileStats {
    pub path: PathBuf,
    pub since: Seconds,
    pub active: bool,
    pub records: usize,
    #[serde(serialize_with = "serialize_classes")]
    pub classes_read: ClassMask,
}

/// Snapshot of what the table has cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub cached_records: usize,
    pub max_cached_records: usize,
    pub logfiles: Vec<LogfileStats>,
}

fn serialize_classes<S: Serializer>(
    mask: &ClassMask,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(mask.classes().map(LogClass::as_str))
}

/// All log files of a monitoring core, ordered by start time, with their
/// caches.
///
/// Queries are answered by walking the files in time order and stop as soon
/// as the window is covered or the sink has enough. Files are only read for
/// the classes a query asks for.
pub struct LogTable<P = NagiosParser> {
    config: Config,
    parser: P,
    active: File,
    logfiles: Logfiles<P>,
    budget: Budget,
    rotation_pending: bool,
}

impl LogTable<NagiosParser> {
    /// Discover the log files named by `config`.
    pub fn new(config: Config) -> Self {
        Self::with_parser(config, NagiosParser)
    }
}

impl<P: RecordParser + Clone> LogTable<P> {
    pub fn with_parser(config: Config, parser: P) -> Self {
        let mut table = Self {
            active: File::probe(config.log_file.clone(), Status::Active),
            budget: Budget::new(&config),
            config,
            parser,
            logfiles: BTreeMap::new(),
            rotation_pending: false,
        };
        table.update_index();
        table
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of indexed log files
    pub fn len(&self) -> usize {
        self.logfiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logfiles.is_empty()
    }

    /// Number of cached records across all files
    pub fn cached_records(&self) -> usize {
        self.budget.cached
    }

    /// Announce that the monitoring core has rotated its log. The index is
    /// rebuilt before the next query.
    pub fn notify_rotation(&mut self) {
        self.rotation_pending = true;
    }

    /// Drop every cache and discover the log files again.
    pub fn rebuild_index(&mut self) {
        info!("Rebuilding logfile index");
        self.forget_logfiles();
        self.update_index();
    }

    fn forget_logfiles(&mut self) {
        self.logfiles.clear();
        self.budget.reset();
    }

    fn update_index(&mut self) {
        self.rotation_pending = false;

        let chain = Chain::discover(&self.config.log_file, &self.config.archive_path);

        self.active = chain
            .iter()
            .find(|f| f.is_active())
            .cloned()
            .unwrap_or_else(|| File::probe(self.config.log_file.clone(), Status::Active));

        for file in chain {
            let logfile = Logfile::with_parser(file, self.parser.clone())
                .with_max_line_length(self.config.max_line_length);
            self.logfiles.insert(logfile.since(), logfile);
        }

        debug!("Indexed {} logfiles", self.logfiles.len());
    }

    fn refresh_index(&mut self) {
        if self.rotation_pending {
            info!("Log has been rotated, rebuilding logfile index");
            self.rebuild_index();
        } else if self.active.is_replaced() {
            info!(
                "Logfile '{}' has been replaced, rebuilding logfile index",
                self.active.path().display()
            );
            self.rebuild_index();
        } else if self.active.since().is_zero() {
            // Left out of the index while its header was missing
            if !self.active.reprobe().since().is_zero() {
                info!(
                    "Logfile '{}' has got its header, rebuilding logfile index",
                    self.active.path().display()
                );
                self.rebuild_index();
            }
        }
    }

    /// Hand every record matching `query` to `sink`, in the query's direction.
    ///
    /// A limit set on the query is not enforced here beyond a limit of zero;
    /// that is up to the sink.
    pub fn query(&mut self, query: &LogQuery, sink: &mut dyn Sink) -> Result<()> {
        query.validate()?;
        self.refresh_index();

        if self.logfiles.is_empty() {
            warn!("No logfile found, not even '{}'", self.config.log_file.display());
            return Err(EngineError::NoLogfiles {
                log_file: self.config.log_file.clone(),
            });
        }

        if query.matches_nothing() {
            return Ok(());
        }

        match query.direction() {
            Direction::Backward => self.query_backward(query, sink),
            Direction::Forward => self.query_forward(query, sink),
        }

        Ok(())
    }

    /// Run `query` and collect the matching records, honoring its limit.
    pub fn collect(&mut self, query: &LogQuery) -> Result<Vec<Record>> {
        let mut sink = LimitSink::new(query.limit());
        self.query(query, &mut sink)?;
        Ok(sink.into_records())
    }

    /// Newest file first. Only the start time of a file is known, so the
    /// walk starts at the newest file that starts no later than `until`.
    fn query_backward(&mut self, query: &LogQuery, sink: &mut dyn Sink) {
        let (since, until, classes) = (query.since(), query.until(), query.classes());

        let mut next = self.logfiles.range(..=until).next_back().map(|(k, _)| *k);

        while let Some(key) = next {
            debug!("Query is now at logfile starting {}, needing classes {}", key, classes);

            let (exhausted, placed) = self.visit(key, classes, |logfile, observer| {
                logfile.query_reverse(since, until, classes, sink, observer)
            });
            // Older files only hold records from before this one started
            if !exhausted || key <= since {
                break;
            }

            // A file that has moved has been visited already
            next = self
                .logfiles
                .range(..key)
                .map(|(k, _)| *k)
                .filter(|k| *k != placed)
                .next_back();
        }
    }

    /// Oldest file first, starting at the file that contains `since`.
    fn query_forward(&mut self, query: &LogQuery, sink: &mut dyn Sink) {
        let (since, until, classes) = (query.since(), query.until(), query.classes());

        let mut next = self
            .logfiles
            .range(..=since)
            .next_back()
            .or_else(|| self.logfiles.iter().next())
            .map(|(k, _)| *k);

        while let Some(key) = next {
            // Every record of this and all later files is past the window
            if key >= until {
                break;
            }

            debug!("Query is now at logfile starting {}, needing classes {}", key, classes);

            let (exhausted, placed) = self.visit(key, classes, |logfile, observer| {
                logfile.query_forward(since, until, classes, sink, observer)
            });
            if !exhausted {
                break;
            }

            next = self
                .logfiles
                .range((Bound::Excluded(key), Bound::Unbounded))
                .map(|(k, _)| *k)
                .find(|k| *k != placed);
        }
    }

    /// Run `f` on the file starting at `key` while the budget may free memory
    /// in every other file.
    ///
    /// Returns the result of `f` and the key the file is indexed under
    /// afterwards.
    fn visit<F>(&mut self, key: Seconds, needed: ClassMask, f: F) -> (bool, Seconds)
    where
        F: FnOnce(&mut Logfile<P>, &mut dyn LoadObserver) -> bool,
    {
        let Some(mut logfile) = self.logfiles.remove(&key) else {
            return (true, key);
        };

        let result = {
            let mut observer = BudgetObserver {
                budget: &mut self.budget,
                others: &mut self.logfiles,
                current: key,
                needed,
            };
            f(&mut logfile, &mut observer)
        };

        if self.budget.is_over() && !(logfile.classes_read() & !needed).is_empty() {
            let freed = logfile.evict_classes(!needed);
            self.budget.release(freed);
        }

        // Replacing the file behind the path may have moved its start time
        let since = logfile.since();
        if since == key {
            self.logfiles.insert(key, logfile);
            return (result, key);
        }

        if !since.is_zero() && !self.logfiles.contains_key(&since) {
            debug!(
                "Logfile '{}' now starts at {} instead of {}",
                logfile.path().display(),
                since,
                key
            );
            self.logfiles.insert(since, logfile);
            return (result, since);
        }

        info!(
            "Logfile '{}' cannot keep its place in the index, rebuilding logfile index",
            logfile.path().display()
        );
        self.rebuild_index();
        (result, key)
    }

    /// What is cached right now, oldest file first.
    pub fn stats(&self) -> TableStats {
        TableStats {
            cached_records: self.budget.cached,
            max_cached_records: self.budget.max,
            logfiles: self
                .logfiles
                .values()
                .map(|logfile| LogfileStats {
                    path: logfile.path().to_path_buf(),
                    since: logfile.since(),
                    active: logfile.is_active(),
                    records: logfile.len(),
                    classes_read: logfile.classes_read(),
                })
                .collect(),
        }
    }
}

impl<P> std::fmt::Debug for LogTable<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTable")
            .field("log_file", &self.config.log_file)
            .field("logfiles", &self.logfiles.len())
            .field("cached", &self.budget.cached)
            .finish()
    }
}
