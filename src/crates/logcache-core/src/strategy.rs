//! Load strategies for sealed and growing log files.
//!
//! Both strategies implement the same contract: after a load for a set of
//! classes, every on-disk record of those classes is cached. They differ in
//! how much I/O that takes.
//!
//! - [`Sealed`] files never change. A class is read at most once, with one
//!   full scan, until it is evicted.
//! - [`Growing`] files are appended to. Besides reading missing classes from
//!   the start, every load first resumes at the [`ResumeCursor`] to pick up
//!   lines appended since the last load for the classes already cached.

use crate::entries::Entries;
use crate::error::{CacheError, Result};
use crate::observer::LoadObserver;
use crate::parser::RecordParser;
use crate::reader::LineReader;
use logcache_common::ClassMask;
use std::fs;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Position in a log file up to which all lines have been scanned.
///
/// Carries the line number along with the byte offset so that records found
/// by a resumed scan are numbered exactly as a scan from the start would
/// number them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeCursor {
    offset: u64,
    line: u32,
}

impl ResumeCursor {
    /// Byte offset of the first unscanned byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of lines before [`offset`](Self::offset)
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// Counters of one load call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Scan passes that were started
    pub passes: usize,
    /// Lines handed to the parser
    pub lines: usize,
    /// Lines the parser rejected
    pub invalid: usize,
    /// Records newly inserted into the cache
    pub inserted: usize,
    /// Bytes read from the file
    pub bytes: u64,
}

/// Everything a strategy needs to scan the file into the cache.
pub(crate) struct Pass<'a> {
    pub(crate) path: &'a Path,
    pub(crate) entries: &'a mut Entries,
    pub(crate) parser: &'a dyn RecordParser,
    pub(crate) observer: &'a mut dyn LoadObserver,
    pub(crate) max_line_length: usize,
    pub(crate) stats: LoadStats,
}

impl Pass<'_> {
    fn open(&self) -> Result<fs::File> {
        fs::File::open(self.path).map_err(|source| CacheError::Open {
            path: self.path.to_path_buf(),
            source,
        })
    }

    /// Scan from `cursor` to end-of-file, caching the records of `classes`.
    ///
    /// `cursor` is advanced line by line, so on error it still marks how far
    /// the scan got. With `hold_partial`, an unterminated fragment at the end
    /// of the file is left for a later scan instead of being parsed now.
    fn scan(
        &mut self,
        file: &mut fs::File,
        cursor: &mut ResumeCursor,
        classes: ClassMask,
        hold_partial: bool,
    ) -> Result<()> {
        let read_error = |source| CacheError::Read {
            path: self.path.to_path_buf(),
            source,
        };

        self.stats.passes += 1;
        file.seek(SeekFrom::Start(cursor.offset))
            .map_err(read_error)?;

        let start = cursor.offset;
        let mut reader = LineReader::new(&mut *file, cursor.offset, self.max_line_length);

        loop {
            let line = match reader.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(source) => {
                    self.stats.bytes += cursor.offset - start;
                    return Err(read_error(source));
                }
            };

            if !line.terminated && hold_partial {
                trace!(
                    "Leaving unterminated line at offset {} of '{}' for later",
                    cursor.offset,
                    self.path.display()
                );
                break;
            }

            let lineno = cursor.line.saturating_add(1);
            cursor.line = lineno;
            cursor.offset = line.end;

            let text = String::from_utf8_lossy(line.bytes);
            self.stats.lines += 1;

            let Some(record) = self.parser.parse(&text, lineno) else {
                self.stats.invalid += 1;
                continue;
            };

            if !classes.has(record.class()) {
                continue;
            }

            if self.entries.insert(record.clone()) {
                self.stats.inserted += 1;
                self.observer.record_cached(&record);
            }
        }

        self.stats.bytes += cursor.offset - start;
        Ok(())
    }

    /// Drop the records of classes whose scan did not complete.
    ///
    /// Those classes are not in the read set, so every cached record of them
    /// came from the failed scan.
    fn roll_back(&mut self, classes: ClassMask) {
        let removed = self.entries.evict(classes);
        if removed > 0 {
            self.observer.records_released(removed);
        }
    }
}

/// The load contract shared by sealed and growing files.
pub(crate) trait LoadStrategy {
    /// Make sure every record of `requested` is cached.
    fn load(&mut self, pass: &mut Pass<'_>, requested: ClassMask);

    /// Forget all scan progress.
    fn reset(&mut self);

    /// Scan progress kept between loads, if the strategy has any.
    fn cursor(&self) -> Option<ResumeCursor>;
}

/// Strategy for rotated files that no longer change.
#[derive(Debug, Default)]
pub(crate) struct Sealed;

impl LoadStrategy for Sealed {
    fn load(&mut self, pass: &mut Pass<'_>, requested: ClassMask) {
        let missing = requested & !pass.entries.classes_read();
        if missing.is_empty() {
            return;
        }

        let mut file = match pass.open() {
            Ok(file) => file,
            Err(e) => {
                info!("{}", e);
                return;
            }
        };

        let mut cursor = ResumeCursor::default();
        match pass.scan(&mut file, &mut cursor, missing, false) {
            Ok(()) => {
                pass.entries.mark_read(missing);
                debug!(
                    "Loaded classes {} of '{}' ({} lines)",
                    missing,
                    pass.path.display(),
                    cursor.line
                );
            }
            Err(e) => {
                warn!("{}; dropping partially loaded classes {}", e, missing);
                pass.roll_back(missing);
            }
        }
    }

    fn reset(&mut self) {}

    fn cursor(&self) -> Option<ResumeCursor> {
        None
    }
}

/// Strategy for the active log file that is still being appended to.
#[derive(Debug, Default)]
pub(crate) struct Growing {
    cursor: ResumeCursor,
}

impl LoadStrategy for Growing {
    fn load(&mut self, pass: &mut Pass<'_>, requested: ClassMask) {
        let known = pass.entries.classes_read();
        let missing = requested & !known;

        if known.is_empty() && missing.is_empty() {
            return;
        }

        let mut file = match pass.open() {
            Ok(file) => file,
            Err(e) => {
                info!("{}", e);
                return;
            }
        };

        // Pick up lines appended since the last load, for the classes we
        // already hold. This must happen before the missing classes join the
        // read set, or the cursor would be trusted for them too.
        if !known.is_empty() {
            let before = self.cursor;
            if let Err(e) = pass.scan(&mut file, &mut self.cursor, known, true) {
                warn!("{}; resuming at offset {} next time", e, self.cursor.offset);
            }
            trace!(
                "Resumed '{}' from offset {} to {}",
                pass.path.display(),
                before.offset,
                self.cursor.offset
            );
        }

        if !missing.is_empty() {
            let mut cursor = ResumeCursor::default();
            match pass.scan(&mut file, &mut cursor, missing, true) {
                Ok(()) => {
                    // With nothing known before, this pass alone decides
                    // where the next load resumes. Otherwise the lines between
                    // the two end positions are still unscanned for `known`.
                    if known.is_empty() {
                        self.cursor = cursor;
                    }
                    pass.entries.mark_read(missing);
                    debug!(
                        "Loaded classes {} of '{}' ({} lines)",
                        missing,
                        pass.path.display(),
                        cursor.line
                    );
                }
                Err(e) => {
                    warn!("{}; dropping partially loaded classes {}", e, missing);
                    pass.roll_back(missing);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.cursor = ResumeCursor::default();
    }

    fn cursor(&self) -> Option<ResumeCursor> {
        Some(self.cursor)
    }
}

/// The strategy chosen for a file when its cache is created.
#[derive(Debug)]
pub(crate) enum Strategy {
    Sealed(Sealed),
    Growing(Growing),
}

impl Strategy {
    pub(crate) fn for_active(active: bool) -> Self {
        if active {
            Strategy::Growing(Growing::default())
        } else {
            Strategy::Sealed(Sealed)
        }
    }

    pub(crate) fn as_dyn(&mut self) -> &mut dyn LoadStrategy {
        match self {
            Strategy::Sealed(sealed) => sealed,
            Strategy::Growing(growing) => growing,
        }
    }

    pub(crate) fn cursor(&self) -> Option<ResumeCursor> {
        match self {
            Strategy::Sealed(sealed) => sealed.cursor(),
            Strategy::Growing(growing) => growing.cursor(),
        }
    }
}
