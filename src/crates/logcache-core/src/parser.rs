//! Turning log lines into records.
//!
//! The cache only depends on the [`RecordParser`] trait. [`NagiosParser`]
//! implements it for the log format of the monitoring core:
//!
//! ```text
//! [1234567890] SERVICE ALERT: web01;HTTP;CRITICAL;HARD;3;Connection refused
//! [1234567890] Nagios 3.2.0 starting... (PID=4242)
//! ```

use crate::record::{Message, Record};
use logcache_common::{LogClass, Seconds};
use logcache_registry::{HEADER_LEN, parse_header};

/// Parses one line of a log file.
///
/// Returns `None` for lines that are not valid records. Such lines are
/// dropped by the cache without further effect.
pub trait RecordParser {
    fn parse(&self, line: &str, lineno: u32) -> Option<Record>;
}

impl<F> RecordParser for F
where
    F: Fn(&str, u32) -> Option<Record>,
{
    fn parse(&self, line: &str, lineno: u32) -> Option<Record> {
        self(line, lineno)
    }
}

/// Parser for monitoring core log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NagiosParser;

impl RecordParser for NagiosParser {
    fn parse(&self, line: &str, lineno: u32) -> Option<Record> {
        let line = line.trim_end_matches(['\n', '\r']);

        // "[1234567890] x" is the shortest valid line
        if line.len() <= HEADER_LEN {
            return None;
        }

        let time = parse_header(line.as_bytes())?;
        let text = line.get(HEADER_LEN..)?.trim_start_matches(' ');

        let mut message = Message::from_text(line);

        let class = match text.split_once(": ") {
            Some((kind, options)) => {
                let class = classify(kind, text);
                extract_fields(kind, options, &mut message);
                message.kind = Some(kind.to_string());
                message.options = Some(options.to_string());
                class
            }
            None => {
                message.kind = Some(text.to_string());
                classify_text(text)
            }
        };

        Some(Record::new(lineno, time, class, message))
    }
}

fn classify(kind: &str, text: &str) -> LogClass {
    match kind {
        "SERVICE ALERT"
        | "HOST ALERT"
        | "SERVICE FLAPPING ALERT"
        | "HOST FLAPPING ALERT"
        | "SERVICE DOWNTIME ALERT"
        | "HOST DOWNTIME ALERT" => LogClass::Alert,
        "CURRENT SERVICE STATE"
        | "CURRENT HOST STATE"
        | "INITIAL SERVICE STATE"
        | "INITIAL HOST STATE" => LogClass::State,
        "SERVICE NOTIFICATION" | "HOST NOTIFICATION" => LogClass::Notification,
        "PASSIVE SERVICE CHECK" | "PASSIVE HOST CHECK" => LogClass::Passive,
        "EXTERNAL COMMAND" => LogClass::Command,
        "LOG VERSION" => LogClass::Program,
        _ => classify_text(text),
    }
}

fn classify_text(text: &str) -> LogClass {
    const PROGRAM_MARKERS: [&str; 6] = [
        "starting...",
        "shutting down...",
        "restarting...",
        "Bailing out",
        "active mode...",
        "standby mode...",
    ];

    if PROGRAM_MARKERS.iter().any(|marker| text.contains(marker)) {
        LogClass::Program
    } else {
        LogClass::Info
    }
}

fn extract_fields(kind: &str, options: &str, message: &mut Message) {
    match kind {
        "SERVICE ALERT" | "CURRENT SERVICE STATE" | "INITIAL SERVICE STATE" => {
            let mut parts = options.splitn(6, ';');
            message.host_name = next_string(&mut parts);
            message.service_description = next_string(&mut parts);
            message.state = parts.next().and_then(service_state);
            message.state_type = next_string(&mut parts);
            message.attempt = parts.next().and_then(|s| s.trim().parse().ok());
            message.plugin_output = next_string(&mut parts);
        }
        "HOST ALERT" | "CURRENT HOST STATE" | "INITIAL HOST STATE" => {
            let mut parts = options.splitn(5, ';');
            message.host_name = next_string(&mut parts);
            message.state = parts.next().and_then(host_state);
            message.state_type = next_string(&mut parts);
            message.attempt = parts.next().and_then(|s| s.trim().parse().ok());
            message.plugin_output = next_string(&mut parts);
        }
        "SERVICE FLAPPING ALERT" | "SERVICE DOWNTIME ALERT" => {
            let mut parts = options.splitn(4, ';');
            message.host_name = next_string(&mut parts);
            message.service_description = next_string(&mut parts);
            message.state_type = next_string(&mut parts);
            message.comment = next_string(&mut parts);
        }
        "HOST FLAPPING ALERT" | "HOST DOWNTIME ALERT" => {
            let mut parts = options.splitn(3, ';');
            message.host_name = next_string(&mut parts);
            message.state_type = next_string(&mut parts);
            message.comment = next_string(&mut parts);
        }
        "SERVICE NOTIFICATION" => {
            let mut parts = options.splitn(6, ';');
            message.contact_name = next_string(&mut parts);
            message.host_name = next_string(&mut parts);
            message.service_description = next_string(&mut parts);
            message.state_type = next_string(&mut parts);
            message.state = message.state_type.as_deref().and_then(service_state);
            message.command_name = next_string(&mut parts);
            message.plugin_output = next_string(&mut parts);
        }
        "HOST NOTIFICATION" => {
            let mut parts = options.splitn(5, ';');
            message.contact_name = next_string(&mut parts);
            message.host_name = next_string(&mut parts);
            message.state_type = next_string(&mut parts);
            message.state = message.state_type.as_deref().and_then(host_state);
            message.command_name = next_string(&mut parts);
            message.plugin_output = next_string(&mut parts);
        }
        "PASSIVE SERVICE CHECK" => {
            let mut parts = options.splitn(4, ';');
            message.host_name = next_string(&mut parts);
            message.service_description = next_string(&mut parts);
            message.state = parts.next().and_then(|s| s.trim().parse().ok());
            message.plugin_output = next_string(&mut parts);
        }
        "PASSIVE HOST CHECK" => {
            let mut parts = options.splitn(3, ';');
            message.host_name = next_string(&mut parts);
            message.state = parts.next().and_then(|s| s.trim().parse().ok());
            message.plugin_output = next_string(&mut parts);
        }
        "EXTERNAL COMMAND" => {
            let command = options.split_once(';').map_or(options, |(name, _)| name);
            message.command_name = Some(command.to_string());
        }
        _ => {}
    }
}

fn next_string<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<String> {
    parts.next().map(str::to_string)
}

/// Numeric service state. Notifications wrap the state, as in
/// `ACKNOWLEDGEMENT (CRITICAL)`.
fn service_state(s: &str) -> Option<i32> {
    match unwrap_parens(s) {
        "OK" => Some(0),
        "WARNING" => Some(1),
        "CRITICAL" => Some(2),
        "UNKNOWN" => Some(3),
        _ => None,
    }
}

fn host_state(s: &str) -> Option<i32> {
    match unwrap_parens(s) {
        "UP" => Some(0),
        "DOWN" => Some(1),
        "UNREACHABLE" => Some(2),
        _ => None,
    }
}

fn unwrap_parens(s: &str) -> &str {
    let s = s.trim();
    match s.split_once('(') {
        Some((_, rest)) => rest.trim_end_matches(')'),
        None => s,
    }
}
