use crate::key::RecordKey;
use crate::record::Record;
use logcache_common::ClassMask;
use std::collections::BTreeMap;

/// The ordered records of one log file together with the classes they cover.
///
/// A record is only ever present if its class is in `classes_read`. Every
/// mutation that removes a class goes through [`evict`](Self::evict), which
/// drops the records and the bits together.
#[derive(Debug, Default)]
pub(crate) struct Entries {
    records: BTreeMap<RecordKey, Record>,
    classes_read: ClassMask,
}

impl Entries {
    /// Insert a record unless one with the same key is already cached.
    ///
    /// Returns `true` if the record was inserted.
    pub(crate) fn insert(&mut self, record: Record) -> bool {
        use std::collections::btree_map::Entry;

        match self.records.entry(record.key()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub(crate) fn classes_read(&self) -> ClassMask {
        self.classes_read
    }

    /// Record that `classes` have been read completely.
    pub(crate) fn mark_read(&mut self, classes: ClassMask) {
        self.classes_read |= classes;
    }

    /// Remove every record whose class is in `classes` and forget that those
    /// classes were read. Returns the number of records removed.
    pub(crate) fn evict(&mut self, classes: ClassMask) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !classes.has(record.class()));
        self.classes_read.remove(classes);
        before - self.records.len()
    }

    /// Remove everything. Returns the number of records removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.classes_read = ClassMask::empty();
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Records with a key of at least `start`, in ascending key order.
    pub(crate) fn ascending_from(&self, start: RecordKey) -> impl Iterator<Item = &Record> {
        self.records.range(start..).map(|(_, record)| record)
    }

    /// Records with a key of at most `start`, in descending key order.
    pub(crate) fn descending_from(&self, start: RecordKey) -> impl Iterator<Item = &Record> {
        self.records.range(..=start).rev().map(|(_, record)| record)
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &Record> {
        self.records.values()
    }
}
