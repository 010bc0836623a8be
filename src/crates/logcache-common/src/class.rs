//! Log classes and class masks.
//!
//! Every parsed log line falls into exactly one [`LogClass`]. The cache loads
//! and evicts records per class, so sets of classes travel around as a
//! [`ClassMask`] bitmask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse classification of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LogClass {
    /// Anything that does not fall into another class
    Info = 0,
    /// Host and service alerts, including flapping and downtime alerts
    Alert = 1,
    /// Lifecycle messages of the monitoring core itself
    Program = 2,
    /// Host and service notifications
    Notification = 3,
    /// Passive check results
    Passive = 4,
    /// External commands
    Command = 5,
    /// Initial and current host/service states, logged at startup and rotation
    State = 6,
}

impl LogClass {
    /// All classes in numeric order.
    pub const ALL: [LogClass; 7] = [
        LogClass::Info,
        LogClass::Alert,
        LogClass::Program,
        LogClass::Notification,
        LogClass::Passive,
        LogClass::Command,
        LogClass::State,
    ];

    /// The single-bit mask of this class.
    pub fn mask(self) -> ClassMask {
        ClassMask::from_bits_truncate(1 << self as u32)
    }

    /// Numeric identifier of the class.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogClass::Info => "info",
            LogClass::Alert => "alert",
            LogClass::Program => "program",
            LogClass::Notification => "notification",
            LogClass::Passive => "passive",
            LogClass::Command => "command",
            LogClass::State => "state",
        }
    }
}

impl fmt::Display for LogClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a class name or number is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseClassError(String);

impl fmt::Display for ParseClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log class: {:?}", self.0)
    }
}

impl std::error::Error for ParseClassError {}

impl FromStr for LogClass {
    type Err = ParseClassError;

    /// Accepts the class name (case insensitive) or its numeric identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return LogClass::ALL
                .into_iter()
                .find(|class| class.id() == id)
                .ok_or_else(|| ParseClassError(s.to_string()));
        }

        LogClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseClassError(s.to_string()))
    }
}

bitflags! {
    /// A set of log classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ClassMask: u32 {
        const INFO = 1 << 0;
        const ALERT = 1 << 1;
        const PROGRAM = 1 << 2;
        const NOTIFICATION = 1 << 3;
        const PASSIVE = 1 << 4;
        const COMMAND = 1 << 5;
        const STATE = 1 << 6;
    }
}

impl ClassMask {
    /// Whether `class` is a member of this set.
    pub fn has(self, class: LogClass) -> bool {
        self.contains(class.mask())
    }

    /// Iterate over the classes in this set, in numeric order.
    pub fn classes(self) -> impl Iterator<Item = LogClass> {
        LogClass::ALL.into_iter().filter(move |class| self.has(*class))
    }
}

impl From<LogClass> for ClassMask {
    fn from(class: LogClass) -> Self {
        class.mask()
    }
}

impl FromIterator<LogClass> for ClassMask {
    fn from_iter<I: IntoIterator<Item = LogClass>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ClassMask::empty(), |mask, class| mask | class.mask())
    }
}

impl fmt::Display for ClassMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }

        let mut first = true;
        for class in self.classes() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(class.as_str())?;
            first = false;
        }
        Ok(())
    }
}
