//! Notifications from a cache to whoever accounts for its memory.

use crate::record::Record;

/// Receives one notification per record that a load inserts into a cache.
///
/// The orchestrator uses this to keep a global count of cached records and
/// to free memory elsewhere while a large file is being loaded.
pub trait LoadObserver {
    /// A record was newly inserted. Never called twice for the same key.
    fn record_cached(&mut self, record: &Record);

    /// Records that were announced through [`record_cached`](Self::record_cached)
    /// have been dropped again by the cache itself, without an explicit
    /// eviction call from the observer.
    fn records_released(&mut self, _count: usize) {}
}

impl<F> LoadObserver for F
where
    F: FnMut(&Record),
{
    fn record_cached(&mut self, record: &Record) {
        self(record)
    }
}
