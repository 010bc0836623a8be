//! Consumers of range queries.

use crate::record::Record;

/// Whether a range scan should go on after a record was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives the records visited by a range query, one at a time.
///
/// Records are only lent for the duration of the call. A sink that needs to
/// keep a record clones it.
pub trait Sink {
    fn accept(&mut self, record: &Record) -> Flow;
}

impl<F> Sink for F
where
    F: FnMut(&Record) -> Flow,
{
    fn accept(&mut self, record: &Record) -> Flow {
        self(record)
    }
}
