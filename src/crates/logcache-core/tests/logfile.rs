//! Integration tests for the per-file cache
//!
//! Tests cover:
//! - Idempotent and class-filtered loading of sealed files
//! - Ordering and window semantics of forward and reverse queries
//! - Eviction and invalidation
//! - Growth of the active log file, including partial lines
//! - Replacement of the active log file behind the same path

use logcache_common::{ClassMask, LogClass, Seconds};
use logcache_core::{Flow, Logfile, Record};
use logcache_registry::{File, Status};
use proptest::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "[1000000000] LOG VERSION: 2.0\n";

fn line_for(time: u32, class: LogClass) -> String {
    let body = match class {
        LogClass::Info => "Warning: disk almost full",
        LogClass::Alert => "SERVICE ALERT: web01;HTTP;CRITICAL;HARD;3;down",
        LogClass::Program => "Nagios 3.2.0 starting... (PID=42)",
        LogClass::Notification => "HOST NOTIFICATION: admin;db01;DOWN;notify-host;PING CRITICAL",
        LogClass::Passive => "PASSIVE SERVICE CHECK: web01;HTTP;0;OK",
        LogClass::Command => "EXTERNAL COMMAND: SAVE_STATE_INFORMATION",
        LogClass::State => "CURRENT HOST STATE: db01;UP;HARD;1;PING OK",
    };
    format!("[{time}] {body}\n")
}

fn write_log(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn append(path: &Path, contents: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

/// The log used by most tests: two alerts in the same second, then a
/// notification.
fn scenario(dir: &Path, status: Status) -> Logfile {
    let contents = format!(
        "{HEADER}{}{}{}",
        line_for(1000000100, LogClass::Alert),
        line_for(1000000100, LogClass::Alert),
        line_for(1000000200, LogClass::Notification),
    );
    let path = write_log(dir, "nagios.log", &contents);
    Logfile::new(File::probe(path, status))
}

fn ignore(_: &Record) {}

fn collect_forward(
    logfile: &mut Logfile,
    since: u32,
    until: u32,
    classes: ClassMask,
) -> (Vec<(u32, u32)>, bool) {
    let mut seen = Vec::new();
    let mut sink = |r: &Record| {
        seen.push((r.time().get(), r.line()));
        Flow::Continue
    };
    let exhausted =
        logfile.query_forward(Seconds(since), Seconds(until), classes, &mut sink, &mut ignore);
    (seen, exhausted)
}

fn collect_reverse(
    logfile: &mut Logfile,
    since: u32,
    until: u32,
    classes: ClassMask,
) -> (Vec<(u32, u32)>, bool) {
    let mut seen = Vec::new();
    let mut sink = |r: &Record| {
        seen.push((r.time().get(), r.line()));
        Flow::Continue
    };
    let exhausted =
        logfile.query_reverse(Seconds(since), Seconds(until), classes, &mut sink, &mut ignore);
    (seen, exhausted)
}

#[test]
fn test_two_position_scenario() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);
    assert_eq!(logfile.since(), Seconds(1000000000));

    logfile.load(ClassMask::ALERT, &mut ignore);
    let (seen, exhausted) =
        collect_forward(&mut logfile, 1000000000, 1000000150, ClassMask::ALERT);
    assert_eq!(seen, vec![(1000000100, 2), (1000000100, 3)]);
    assert!(exhausted);

    logfile.load(ClassMask::NOTIFICATION, &mut ignore);
    let (seen, exhausted) =
        collect_forward(&mut logfile, 1000000150, 1000000300, ClassMask::NOTIFICATION);
    assert_eq!(seen, vec![(1000000200, 4)]);
    assert!(exhausted);

    assert_eq!(
        logfile.classes_read(),
        ClassMask::ALERT | ClassMask::NOTIFICATION
    );
}

#[test]
fn test_load_is_idempotent() {
    let dir = TempDir::new().unwrap();

    let mut sealed = scenario(dir.path(), Status::Archived);
    let mut cached = 0;
    let first = sealed.load(ClassMask::ALERT, &mut |_: &Record| cached += 1);
    assert_eq!(first.inserted, 2);
    assert_eq!(cached, 2);

    let second = sealed.load(ClassMask::ALERT, &mut |_: &Record| cached += 1);
    assert_eq!(second.passes, 0);
    assert_eq!(second.lines, 0);
    assert_eq!(cached, 2);
    assert_eq!(sealed.len(), 2);

    let dir = TempDir::new().unwrap();
    let mut active = scenario(dir.path(), Status::Active);
    active.load(ClassMask::ALERT, &mut ignore);
    let second = active.load(ClassMask::ALERT, &mut ignore);
    assert_eq!(second.lines, 0);
    assert_eq!(second.inserted, 0);
    assert_eq!(active.len(), 2);
}

#[test]
fn test_reverse_order_is_exact_reverse() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);
    let all = ClassMask::all();

    let (forward, _) = collect_forward(&mut logfile, 0, u32::MAX, all);
    let (mut reverse, _) = collect_reverse(&mut logfile, 0, u32::MAX, all);
    reverse.reverse();
    assert_eq!(forward, reverse);
    assert_eq!(forward.len(), 4);

    // Same second: ascending lines forward, descending in reverse
    let (reverse, exhausted) =
        collect_reverse(&mut logfile, 1000000100, 1000000101, ClassMask::ALERT);
    assert_eq!(reverse, vec![(1000000100, 3), (1000000100, 2)]);
    assert!(exhausted);
}

#[test]
fn test_window_bounds() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);
    let all = ClassMask::all();

    // until is exclusive in both directions
    let (seen, _) = collect_forward(&mut logfile, 0, 1000000200, all);
    assert!(seen.iter().all(|(t, _)| *t < 1000000200));
    assert_eq!(seen.len(), 3);

    let (seen, _) = collect_reverse(&mut logfile, 0, 1000000200, all);
    assert_eq!(seen, vec![(1000000100, 3), (1000000100, 2), (1000000000, 1)]);

    // since is inclusive in both directions
    let (seen, _) = collect_forward(&mut logfile, 1000000200, u32::MAX, all);
    assert_eq!(seen, vec![(1000000200, 4)]);
    let (seen, _) = collect_reverse(&mut logfile, 1000000200, u32::MAX, all);
    assert_eq!(seen, vec![(1000000200, 4)]);

    // Empty window
    let (seen, exhausted) = collect_forward(&mut logfile, 1000000100, 1000000100, all);
    assert!(seen.is_empty());
    assert!(exhausted);
    let (seen, exhausted) = collect_reverse(&mut logfile, 1000000100, 1000000100, all);
    assert!(seen.is_empty());
    assert!(exhausted);
}

#[test]
fn test_query_filters_by_requested_classes() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);

    logfile.load(ClassMask::all(), &mut ignore);
    assert_eq!(logfile.len(), 4);

    let (seen, _) = collect_forward(&mut logfile, 0, u32::MAX, ClassMask::NOTIFICATION);
    assert_eq!(seen, vec![(1000000200, 4)]);
}

#[test]
fn test_early_stop() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);

    let mut visits = 0;
    let mut sink = |_: &Record| {
        visits += 1;
        Flow::Stop
    };
    let exhausted = logfile.query_forward(
        Seconds(0),
        Seconds::MAX,
        ClassMask::ALERT,
        &mut sink,
        &mut ignore,
    );
    assert!(!exhausted);
    assert_eq!(visits, 1);

    let mut visits = 0;
    let mut sink = |_: &Record| {
        visits += 1;
        Flow::Stop
    };
    let exhausted = logfile.query_reverse(
        Seconds(0),
        Seconds::MAX,
        ClassMask::ALERT,
        &mut sink,
        &mut ignore,
    );
    assert!(!exhausted);
    assert_eq!(visits, 1);
}

#[test]
fn test_empty_cache_is_exhausted() {
    let dir = TempDir::new().unwrap();
    let path = write_log(dir.path(), "nagios.log", HEADER);
    let mut logfile = Logfile::new(File::probe(path, Status::Archived));

    let (seen, exhausted) = collect_forward(&mut logfile, 0, u32::MAX, ClassMask::ALERT);
    assert!(seen.is_empty());
    assert!(exhausted);

    let (seen, exhausted) = collect_reverse(&mut logfile, 0, u32::MAX, ClassMask::ALERT);
    assert!(seen.is_empty());
    assert!(exhausted);
}

#[test]
fn test_missing_file_loads_nothing() {
    let dir = TempDir::new().unwrap();
    let mut logfile = Logfile::new(File::probe(dir.path().join("gone.log"), Status::Archived));

    let stats = logfile.load(ClassMask::all(), &mut ignore);
    assert_eq!(stats.passes, 0);
    assert!(logfile.is_empty());
    assert!(logfile.classes_read().is_empty());
}

#[test]
fn test_evict_then_reload() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);

    logfile.load(ClassMask::ALERT | ClassMask::NOTIFICATION, &mut ignore);
    assert_eq!(logfile.len(), 3);

    assert_eq!(logfile.evict_classes(ClassMask::ALERT), 2);
    assert_eq!(logfile.classes_read(), ClassMask::NOTIFICATION);
    assert!(logfile.records().all(|r| r.class() != LogClass::Alert));

    // Evicting a class that is not cached is a no-op
    assert_eq!(logfile.evict_classes(ClassMask::COMMAND), 0);

    let stats = logfile.load(ClassMask::ALERT | ClassMask::NOTIFICATION, &mut ignore);
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.inserted, 2);
    assert_eq!(logfile.len(), 3);

    assert_eq!(logfile.invalidate_all(), 3);
    assert!(logfile.is_empty());
    assert!(logfile.classes_read().is_empty());
}

#[test]
fn test_active_file_evict_then_reload() {
    let dir = TempDir::new().unwrap();
    let contents = format!(
        "{HEADER}{}{}",
        line_for(1000000010, LogClass::Alert),
        line_for(1000000020, LogClass::Command),
    );
    let path = write_log(dir.path(), "nagios.log", &contents);
    let mut logfile = Logfile::new(File::probe(&path, Status::Active));

    let both = ClassMask::ALERT | ClassMask::COMMAND;
    logfile.load(both, &mut ignore);
    assert_eq!(logfile.len(), 2);

    assert_eq!(logfile.evict_classes(ClassMask::COMMAND), 1);
    assert_eq!(logfile.classes_read(), ClassMask::ALERT);

    append(&path, &line_for(1000000030, LogClass::Alert));
    append(&path, &line_for(1000000040, LogClass::Command));

    // New alerts come from resuming at the cursor, commands from a full scan
    let mut cached = Vec::new();
    let mut observer = |r: &Record| cached.push((r.line(), r.class()));
    let stats = logfile.load(both, &mut observer);
    assert_eq!(stats.passes, 2);
    assert_eq!(
        cached,
        vec![
            (4, LogClass::Alert),
            (3, LogClass::Command),
            (5, LogClass::Command)
        ]
    );

    let lines: Vec<_> = logfile.records().map(|r| r.line()).collect();
    assert_eq!(lines, vec![2, 3, 4, 5]);
    assert_eq!(logfile.classes_read(), both);

    let mut cached = Vec::new();
    let mut observer = |r: &Record| cached.push(r.line());
    let stats = logfile.load(both, &mut observer);
    assert_eq!(stats.inserted, 0);
    assert!(cached.is_empty());
}

#[test]
fn test_sealed_file_ignores_growth() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Archived);
    logfile.load(ClassMask::ALERT, &mut ignore);

    append(logfile.path(), &line_for(1000000300, LogClass::Alert));

    let stats = logfile.load(ClassMask::ALERT, &mut ignore);
    assert_eq!(stats.passes, 0);
    assert_eq!(logfile.len(), 2);
}

#[test]
fn test_active_file_growth() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Active);
    logfile.load(ClassMask::ALERT, &mut ignore);

    append(
        logfile.path(),
        &format!(
            "{}{}",
            line_for(1000000300, LogClass::Alert),
            line_for(1000000300, LogClass::Command)
        ),
    );

    let mut cached = Vec::new();
    let stats = logfile.load(ClassMask::ALERT, &mut |r: &Record| cached.push(r.line()));
    assert_eq!(stats.lines, 2);
    assert_eq!(cached, vec![5]);
    assert_eq!(logfile.len(), 3);

    // The command was skipped by the resume pass and is found by the missing pass
    let (seen, _) = collect_forward(&mut logfile, 0, u32::MAX, ClassMask::COMMAND);
    assert_eq!(seen, vec![(1000000300, 6)]);

    let (seen, _) = collect_forward(&mut logfile, 0, u32::MAX, ClassMask::ALERT);
    assert_eq!(
        seen,
        vec![(1000000100, 2), (1000000100, 3), (1000000300, 5)]
    );
}

#[test]
fn test_active_file_partial_line() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Active);
    logfile.load(ClassMask::ALERT, &mut ignore);
    let cursor = logfile.resume_cursor().unwrap();

    let line = line_for(1000000300, LogClass::Alert);
    let (head, tail) = line.split_at(20);

    append(logfile.path(), head);
    logfile.load(ClassMask::ALERT, &mut ignore);
    assert_eq!(logfile.len(), 2);
    assert_eq!(logfile.resume_cursor().unwrap(), cursor);

    append(logfile.path(), tail);
    logfile.load(ClassMask::ALERT, &mut ignore);
    assert_eq!(logfile.len(), 3);

    let last = logfile.records().next_back().unwrap();
    assert_eq!(last.line(), 5);
    assert_eq!(last.message().text, line.trim_end());
}

#[test]
fn test_replaced_active_file_is_reloaded() {
    let dir = TempDir::new().unwrap();
    let mut logfile = scenario(dir.path(), Status::Active);
    logfile.load(ClassMask::ALERT, &mut ignore);
    assert_eq!(logfile.len(), 2);

    // Rotate: a fresh file takes over the path
    let fresh = write_log(
        dir.path(),
        "fresh.log",
        &format!(
            "[1000000500] LOG VERSION: 2.0\n{}",
            line_for(1000000600, LogClass::Alert)
        ),
    );
    fs::rename(&fresh, logfile.path()).unwrap();

    let mut released = 0;
    struct Counter<'a>(&'a mut usize);
    impl logcache_core::LoadObserver for Counter<'_> {
        fn record_cached(&mut self, _record: &Record) {}
        fn records_released(&mut self, count: usize) {
            *self.0 += count;
        }
    }

    logfile.load(ClassMask::ALERT, &mut Counter(&mut released));
    assert_eq!(released, 2);
    assert_eq!(logfile.since(), Seconds(1000000500));

    let (seen, _) = collect_forward(&mut logfile, 0, u32::MAX, ClassMask::ALERT);
    assert_eq!(seen, vec![(1000000600, 2)]);
}

#[test]
fn test_long_lines_are_split() {
    let dir = TempDir::new().unwrap();
    let long = format!("[1000000100] Warning: {}\n", "x".repeat(100));
    let path = write_log(dir.path(), "nagios.log", &format!("{HEADER}{long}"));

    let mut logfile =
        Logfile::new(File::probe(path, Status::Archived)).with_max_line_length(40);
    let stats = logfile.load(ClassMask::INFO, &mut ignore);

    // The header line fits, the long line becomes several chunks
    assert!(stats.lines > 2);
    assert_eq!(logfile.len(), 1);
    assert_eq!(logfile.records().next().unwrap().line(), 2);
}

fn arb_class() -> impl Strategy<Value = LogClass> {
    prop::sample::select(LogClass::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_range_queries_match_filter(
        lines in prop::collection::vec((0u32..40, arb_class()), 0..40),
        since in 0u32..45,
        width in 0u32..45,
        classes in prop::collection::vec(arb_class(), 0..4),
    ) {
        let dir = TempDir::new().unwrap();
        let mut contents = String::from(HEADER);
        for (offset, class) in &lines {
            contents.push_str(&line_for(1000000000 + offset, *class));
        }
        let path = write_log(dir.path(), "nagios.log", &contents);
        let mut logfile = Logfile::new(File::probe(path, Status::Archived));

        let mask: ClassMask = classes.into_iter().collect();
        let since = 1000000000 + since;
        let until = since + width;

        // Line 1 is the header record
        let mut expected: Vec<(u32, u32)> = std::iter::once((1000000000, LogClass::Program))
            .chain(lines.iter().map(|(offset, class)| (1000000000 + offset, *class)))
            .zip(1u32..)
            .filter(|((time, class), _)| *time >= since && *time < until && mask.has(*class))
            .map(|((time, _), line)| (time, line))
            .collect();
        expected.sort();

        let (forward, exhausted) = collect_forward(&mut logfile, since, until, mask);
        prop_assert!(exhausted);
        prop_assert_eq!(&forward, &expected);

        let (mut reverse, exhausted) = collect_reverse(&mut logfile, since, until, mask);
        prop_assert!(exhausted);
        reverse.reverse();
        prop_assert_eq!(&reverse, &expected);
    }
}
