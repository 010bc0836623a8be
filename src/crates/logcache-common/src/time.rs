//! Time units for log timestamps.
//!
//! Log lines carry whole seconds since the Unix epoch. A dedicated newtype keeps
//! timestamps from being mixed up with line numbers and byte offsets, which are
//! plain integers of similar width in the cache.

use serde::{Deserialize, Serialize};

/// Timestamp in seconds since Unix epoch.
///
/// Stored as `u32` so that it packs into the high half of a 64-bit composite
/// key. This covers every ten-digit epoch up to the year 2106.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Seconds(pub u32);

impl Seconds {
    /// The zero timestamp. Also used as the "unknown start time" sentinel.
    pub const ZERO: Seconds = Seconds(0);

    /// The largest representable timestamp.
    pub const MAX: Seconds = Seconds(u32::MAX);

    /// Get the current time as seconds since Unix epoch.
    ///
    /// Clamps to [`Seconds::ZERO`] if the system clock is before the epoch.
    pub fn now() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Get the raw seconds value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the zero sentinel.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two durations with saturation at the numeric bounds.
    pub fn saturating_add(self, other: Self) -> Self {
        Seconds(self.0.saturating_add(other.0))
    }

    /// Subtract two durations with saturation at the numeric bounds.
    pub fn saturating_sub(self, other: Self) -> Self {
        Seconds(self.0.saturating_sub(other.0))
    }
}

impl From<u32> for Seconds {
    fn from(s: u32) -> Self {
        Seconds(s)
    }
}

impl TryFrom<u64> for Seconds {
    type Error = std::num::TryFromIntError;

    fn try_from(s: u64) -> Result<Self, Self::Error> {
        u32::try_from(s).map(Seconds)
    }
}

impl std::fmt::Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}
