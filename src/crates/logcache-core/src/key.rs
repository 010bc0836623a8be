//! Composite ordering key of cached records.

use logcache_common::Seconds;

/// Total order of records within one log file.
///
/// Packs the timestamp into the high 32 bits and the line number into the low
/// 32 bits, so numeric order of the key is timestamp order with the line
/// number as tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(u64);

impl RecordKey {
    /// Largest possible line number, used to form the upper bound of a second.
    pub const LINE_MAX: u32 = u32::MAX;

    pub fn new(time: Seconds, line: u32) -> Self {
        Self(((time.get() as u64) << 32) | line as u64)
    }

    pub fn time(self) -> Seconds {
        Seconds((self.0 >> 32) as u32)
    }

    pub fn line(self) -> u32 {
        self.0 as u32
    }

    pub fn get(self) -> u64 {
        self.0
    }
}
