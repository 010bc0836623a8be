//! Parsed log records.

use crate::key::RecordKey;
use logcache_common::{LogClass, Seconds};
use serde::Serialize;

/// Structured fields extracted from one log line.
///
/// Only the complete text is always present. Which of the other fields are
/// filled in depends on the message type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// The complete line, including the timestamp
    pub text: String,
    /// Text before the colon, e.g. `SERVICE ALERT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Text after the colon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_name: Option<String>,
    /// Numeric host or service state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
    /// `HARD`/`SOFT`, `STARTED`/`STOPPED`, or the notification state text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Message {
    /// A message with nothing but the complete text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// One parsed log line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    line: u32,
    time: Seconds,
    class: LogClass,
    message: Message,
}

impl Record {
    pub fn new(line: u32, time: Seconds, class: LogClass, message: Message) -> Self {
        Self {
            line,
            time,
            class,
            message,
        }
    }

    /// Line number within the log file, starting at 1
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn time(&self) -> Seconds {
        self.time
    }

    pub fn class(&self) -> LogClass {
        self.class
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Key of this record in the cache
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.time, self.line)
    }
}
